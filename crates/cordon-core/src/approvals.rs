//! The approval and trigger protocol.
//!
//! Some effects must pause game progression until a specific player
//! responds: an ally-assisted move waits for the ally's accept/reject, and
//! role triggers fire either automatically when their condition holds or
//! manually by player request. An `Approval` is the persisted pending
//! negotiation; a `Trigger` is a follow-up effect outside the action budget.

use crate::actions::Action;
use crate::board::{FieldId, PlagueColor, PlayerId};
use crate::game::Game;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response to a pending approval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    /// Request echo on its way to the approver; purely informational
    Outbound,
    /// Commit the gated action
    Approved,
    /// Discard the gated action's effect
    Rejected,
}

/// A pending effect awaiting one player's explicit accept/reject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    /// Identity used to match responses against this request
    pub id: Uuid,
    /// The action whose effect is gated on this approval
    pub action: Action,
    /// The player who submitted the action
    pub actor: PlayerId,
    /// The player who must respond
    pub approver: PlayerId,
    /// Flipped by `approve`; the effect commits only once this is set
    pub approved: bool,
    /// Whether the turn blocks until a response arrives
    pub response_required: bool,
}

impl Approval {
    /// Create a pending approval for a gated action
    pub fn new(action: Action, actor: PlayerId, approver: PlayerId) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            actor,
            approver,
            approved: false,
            response_required: true,
        }
    }

    /// Mark the request approved
    pub fn approve(&mut self) {
        self.approved = true;
    }

    /// Text shown to the approver when the request arrives
    pub fn request_text(&self, game: &Game) -> String {
        format!("{} - approve?", self.action.describe(game, self.actor))
    }

    /// Text surfaced after approval
    pub fn approved_text(&self, game: &Game) -> String {
        format!("Approved: {}", self.action.describe(game, self.actor))
    }

    /// Text surfaced after rejection
    pub fn rejected_text(&self, game: &Game) -> String {
        format!("Rejected: {}", self.action.describe(game, self.actor))
    }
}

/// What a trigger does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerKind {
    /// Doctor sweep: remove every cube of a cured color from a field.
    /// Fires automatically when the doctor's pawn enters such a field and
    /// may also be submitted manually.
    DoctorCure { field: FieldId, color: PlagueColor },

    /// Operations expert flight: at a laboratory, discard any city card to
    /// fly to any field. Manual only, once per turn, no action cost.
    OperationsFlight {
        destination: FieldId,
        discard: FieldId,
    },
}

/// A follow-up effect executed outside the action budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// The player the trigger belongs to
    pub player: PlayerId,
    pub kind: TriggerKind,
}

impl Trigger {
    /// Whether this trigger fires on its own when its condition holds.
    /// Auto triggers are re-evaluated at fire time, never from a stale
    /// board state.
    pub fn is_auto(&self) -> bool {
        matches!(self.kind, TriggerKind::DoctorCure { .. })
    }

    /// Manual triggers are player-initiated, so the engine never waits on
    /// a response for them
    pub fn response_required(&self) -> bool {
        false
    }

    /// One-line description for logs and notices
    pub fn describe(&self, game: &Game) -> String {
        let player_name = game
            .player(self.player)
            .map(|p| p.name.as_str())
            .unwrap_or("unknown");
        let city = |f: FieldId| {
            game.board
                .field(f)
                .map(|fl| fl.city.as_str())
                .unwrap_or("unknown")
        };

        match self.kind {
            TriggerKind::DoctorCure { field, color } => format!(
                "{} sweeps the {} plague from {}",
                player_name,
                color.name(),
                city(field)
            ),
            TriggerKind::OperationsFlight { destination, .. } => {
                format!("{} flies to {}", player_name, city(destination))
            }
        }
    }
}
