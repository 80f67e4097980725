//! Typed request/response messages for the Cordon engine boundary.

use cordon_core::{
    Action, ApprovalStatus, GameError, GameEvent, MapType, PlagueColor, PlayerId, RuleConfig,
    Trigger,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to open a new game from a registered lobby.
///
/// Handled by the service itself rather than a game worker, since the
/// worker only exists once the game does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGameRequest {
    pub lobby_id: Uuid,
    pub map_type: MapType,
    pub plagues: Vec<PlagueColor>,
    pub config: RuleConfig,
}

/// Requests dispatched to a running game's worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EngineRequest {
    /// Submit a game action for the given player
    SubmitAction { player: PlayerId, action: Action },

    /// Answer a pending approval
    RespondApproval {
        player: PlayerId,
        approval_id: Uuid,
        status: ApprovalStatus,
    },

    /// Fire a manually submitted trigger; `cause` is a free-form label
    /// for logs ("entered Cairo", "operations flight")
    SubmitTrigger {
        player: PlayerId,
        trigger: Trigger,
        cause: Option<String>,
    },

    /// Draw one player card
    DrawPlayerCard { player: PlayerId },

    /// Draw one infection card
    DrawInfectionCard { player: PlayerId },

    /// End the current turn
    EndTurn { player: PlayerId },

    /// Abandon the game
    LeaveGame { player: PlayerId },

    /// Request a state snapshot without mutating anything
    FetchState,
}

/// Responses from a game worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EngineResponse {
    /// Operation applied; snapshot plus the events it emitted
    Applied {
        state: serde_json::Value,
        events: Vec<GameEvent>,
    },

    /// Operation applied and the action budget just ran out: the
    /// card-draw phase is released
    DrawReleased {
        state: serde_json::Value,
        events: Vec<GameEvent>,
    },

    /// Snapshot for `FetchState`
    State { state: serde_json::Value },

    /// Operation rejected; nothing changed
    Rejected { error: GameError },
}

impl EngineResponse {
    /// The events this response carries, if any
    pub fn events(&self) -> &[GameEvent] {
        match self {
            EngineResponse::Applied { events, .. }
            | EngineResponse::DrawReleased { events, .. } => events,
            EngineResponse::State { .. } | EngineResponse::Rejected { .. } => &[],
        }
    }

    /// Whether the operation was applied
    pub fn is_applied(&self) -> bool {
        !matches!(self, EngineResponse::Rejected { .. })
    }
}

/// A message addressed to one specific player, delivered alongside the
/// response (approval requests and their resolutions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub recipient: PlayerId,
    pub text: String,
}

/// What a dispatch returns: the response plus any directed notices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub response: EngineResponse,
    pub notices: Vec<Notice>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cordon_core::MoveKind;

    #[test]
    fn test_request_round_trips_as_tagged_json() {
        let request = EngineRequest::SubmitAction {
            player: 0,
            action: Action::Move {
                kind: MoveKind::Car,
                destination: 3,
            },
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"type\":\"SubmitAction\""));

        let back: EngineRequest = serde_json::from_str(&json).unwrap();
        match back {
            EngineRequest::SubmitAction { player, action } => {
                assert_eq!(player, 0);
                assert_eq!(
                    action,
                    Action::Move {
                        kind: MoveKind::Car,
                        destination: 3
                    }
                );
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn test_rejected_response_carries_no_events() {
        let response = EngineResponse::Rejected {
            error: GameError::NotYourTurn,
        };
        assert!(!response.is_applied());
        assert!(response.events().is_empty());
    }
}
