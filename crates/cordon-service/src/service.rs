//! Per-game dispatch workers.
//!
//! Each registered game is owned by exactly one spawned task holding the
//! `Game` and consuming an `mpsc` request queue; callers dispatch with a
//! `oneshot` reply. That serializes every mutation per game while keeping
//! games fully independent. A pending approval is persisted game state,
//! not a blocked task: the worker keeps serving requests while one is open.

use crate::lobby::Lobby;
use crate::protocol::{CreateGameRequest, EngineRequest, EngineResponse, Notice, Reply};
use crate::store::{Registry, RegistryError};
use cordon_core::{Game, GameError, GameEvent};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Requests queued per worker before the game applies them.
const DISPATCH_QUEUE_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Game worker has shut down")]
    WorkerClosed,
}

struct WorkerRequest {
    request: EngineRequest,
    reply: oneshot::Sender<Reply>,
}

/// Cheap cloneable handle to one game's worker.
#[derive(Clone, Debug)]
pub struct GameHandle {
    pub id: Uuid,
    tx: mpsc::Sender<WorkerRequest>,
}

impl GameHandle {
    /// Send one request to the worker and wait for its reply
    pub async fn dispatch(&self, request: EngineRequest) -> Result<Reply, ServiceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(WorkerRequest {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ServiceError::WorkerClosed)?;
        reply_rx.await.map_err(|_| ServiceError::WorkerClosed)
    }
}

/// The service facade: lobby registration, game creation, and dispatch.
pub struct GameService {
    registry: Arc<Registry>,
}

impl GameService {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register a lobby and hand back its id
    pub fn create_lobby(&self, lobby: Lobby) -> Result<Uuid, ServiceError> {
        let id = lobby.id;
        self.registry.insert_lobby(lobby)?;
        info!(lobby_id = %id, "lobby registered");
        Ok(id)
    }

    /// Create a game from a registered lobby and spawn its worker
    pub fn create_game(&self, request: CreateGameRequest) -> Result<Uuid, ServiceError> {
        let lobby = self.registry.lobby(request.lobby_id)?;
        let game = Game::new(
            request.config,
            request.map_type,
            request.plagues,
            lobby.seats(),
        )?;
        let game_id = game.id;

        let (tx, rx) = mpsc::channel(DISPATCH_QUEUE_DEPTH);
        let span = info_span!("game", id = %game_id);
        tokio::spawn(run_game(game, rx).instrument(span));

        self.registry.insert_game(GameHandle { id: game_id, tx })?;
        info!(
            game_id = %game_id,
            lobby_id = %request.lobby_id,
            active = self.registry.game_count(),
            "game created"
        );
        Ok(game_id)
    }

    /// Dispatch one request to a running game
    pub async fn dispatch(
        &self,
        game_id: Uuid,
        request: EngineRequest,
    ) -> Result<Reply, ServiceError> {
        let handle = self.registry.game(game_id)?;
        handle.dispatch(request).await
    }

    /// Unregister a game; its worker drains and exits once the last
    /// handle drops
    pub fn close_game(&self, game_id: Uuid) -> Result<(), ServiceError> {
        self.registry.remove_game(game_id)?;
        info!(game_id = %game_id, active = self.registry.game_count(), "game closed");
        Ok(())
    }
}

impl Default for GameService {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker loop: apply requests one at a time until every handle is gone.
async fn run_game(mut game: Game, mut rx: mpsc::Receiver<WorkerRequest>) {
    info!("worker started");
    while let Some(WorkerRequest { request, reply }) = rx.recv().await {
        let outcome = handle_request(&mut game, request);
        if reply.send(outcome).is_err() {
            warn!("caller went away before the reply was sent");
        }
    }
    info!("worker stopped");
}

/// Apply one request to the game and shape its reply.
fn handle_request(game: &mut Game, request: EngineRequest) -> Reply {
    let result = match request {
        EngineRequest::SubmitAction { player, action } => game.submit_action(player, action),
        EngineRequest::RespondApproval {
            player,
            approval_id,
            status,
        } => game.respond_approval(player, approval_id, status),
        EngineRequest::SubmitTrigger {
            player,
            trigger,
            cause,
        } => {
            if let Some(cause) = cause {
                info!(player, %cause, "trigger submitted");
            }
            game.submit_trigger(player, trigger)
        }
        EngineRequest::DrawPlayerCard { player } => game.draw_player_card(player),
        EngineRequest::DrawInfectionCard { player } => game.draw_infection_card(player),
        EngineRequest::EndTurn { player } => game.end_turn(player),
        EngineRequest::LeaveGame { player } => game.player_leaves(player),
        EngineRequest::FetchState => {
            return Reply {
                response: EngineResponse::State {
                    state: snapshot(game),
                },
                notices: Vec::new(),
            }
        }
    };

    match result {
        Ok(events) => {
            let notices = directed_notices(game, &events);
            let state = snapshot(game);
            let response = if events
                .iter()
                .any(|e| matches!(e, GameEvent::ActionsExhausted { .. }))
            {
                EngineResponse::DrawReleased { state, events }
            } else {
                EngineResponse::Applied { state, events }
            };
            Reply { response, notices }
        }
        Err(error) => {
            warn!(%error, "request rejected");
            Reply {
                response: EngineResponse::Rejected { error },
                notices: Vec::new(),
            }
        }
    }
}

/// Approval and trigger traffic is addressed to specific players, not
/// broadcast.
fn directed_notices(game: &Game, events: &[GameEvent]) -> Vec<Notice> {
    let mut notices = Vec::new();
    for event in events {
        match event {
            GameEvent::ApprovalRequested { approval } => {
                notices.push(Notice {
                    recipient: approval.approver,
                    text: approval.request_text(game),
                });
            }
            GameEvent::ApprovalResolved { approval, status } => {
                let text = if *status == cordon_core::ApprovalStatus::Approved {
                    approval.approved_text(game)
                } else {
                    approval.rejected_text(game)
                };
                notices.push(Notice {
                    recipient: approval.actor,
                    text,
                });
            }
            GameEvent::TriggerFired { trigger } => {
                notices.push(Notice {
                    recipient: trigger.player,
                    text: trigger.describe(game),
                });
            }
            _ => {}
        }
    }
    notices
}

fn snapshot(game: &Game) -> serde_json::Value {
    serde_json::to_value(game).expect("game state serializes")
}
