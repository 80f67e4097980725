//! The game aggregate: single source of truth for board, players, decks,
//! and turn state.
//!
//! All engine operations mutate through `Game`: submitting actions,
//! responding to approvals, firing triggers, drawing cards, ending turns,
//! and the outbreak cascade. Validation strictly precedes mutation; once an
//! operation starts applying effects it runs to completion.

use crate::actions::{self, Action};
use crate::approvals::{Approval, ApprovalStatus, Trigger, TriggerKind};
use crate::board::{Board, FieldId, MapType, PlagueColor, PlayerId};
use crate::cards::{InfectionDeck, PlayerCard, PlayerDeck};
use crate::config::RuleConfig;
use crate::player::{Player, PlayerKind};
use crate::roles::Role;
use crate::turn::{PlayerTurn, TurnPhase};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when applying engine operations
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Game is over")]
    GameOver,

    #[error("Action is not available")]
    ActionUnavailable,

    #[error("Don't have that card")]
    NoSuchCard,

    #[error("No actions remaining this turn")]
    NoActionsRemaining,

    #[error("Invalid operation for current turn phase")]
    WrongPhase,

    #[error("An approval is pending; respond to it first")]
    ApprovalPending,

    #[error("No approval is pending")]
    NoPendingApproval,

    #[error("Response does not match the pending approval")]
    StaleApproval,

    #[error("No discard is required")]
    DiscardNotRequired,

    #[error("Unknown player")]
    UnknownPlayer,

    #[error("Unknown field")]
    UnknownField,

    #[error("Invalid game setup: {0}")]
    InvalidSetup(String),
}

/// Why a game was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossReason {
    /// Outbreak counter reached its maximum
    OutbreakLimit,
    /// Infection-level marker ran off the end of the track
    InfectionLevelLimit,
    /// The player-card stack was exhausted
    PlayerDeckExhausted,
    /// An infection demanded a cube from an empty supply
    CubeSupplyExhausted,
    /// A player left the game
    PlayerAbandoned,
}

/// Cured/exterminated bookkeeping for one plague
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlagueStatus {
    pub color: PlagueColor,
    /// The antidote has been discovered
    pub cured: bool,
    /// Cured and no cubes of this color remain on the board
    pub exterminated: bool,
}

/// Events emitted by engine operations, in the order effects applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An approval request was created; the turn blocks until it resolves
    ApprovalRequested { approval: Approval },
    /// A pending approval was answered
    ApprovalResolved {
        approval: Approval,
        status: ApprovalStatus,
    },
    PlayerMoved {
        player: PlayerId,
        from: FieldId,
        to: FieldId,
    },
    CardDiscarded { player: PlayerId, card: PlayerCard },
    PlagueTreated {
        player: PlayerId,
        field: FieldId,
        color: PlagueColor,
        removed: u8,
    },
    LaboratoryBuilt { player: PlayerId, field: FieldId },
    LaboratoryMoved { from: FieldId, to: FieldId },
    AntidoteDiscovered {
        player: PlayerId,
        color: PlagueColor,
        field: FieldId,
    },
    PlagueExterminated { color: PlagueColor },
    FieldInfected { field: FieldId, color: PlagueColor },
    Outbreak { field: FieldId, color: PlagueColor },
    EpidemicDrawn { player: PlayerId },
    InfectionLevelIncreased { level: usize },
    PlayerCardDrawn { player: PlayerId, card: PlayerCard },
    /// Hand limit exceeded; a forced discard must resolve
    HandLimitExceeded { player: PlayerId },
    InfectionCardDrawn { field: FieldId },
    /// Action budget just ran out; the card-draw phase is released
    ActionsExhausted { player: PlayerId },
    TriggerFired { trigger: Trigger },
    /// All infection draws done; the turn is ready to end
    TurnCompleted { player: PlayerId },
    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
    },
    PlayerLeft { player: PlayerId },
    GameWon,
    GameLost { reason: LossReason },
}

/// The complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    /// Game identity
    pub id: Uuid,
    /// Rule parameters this game was created with
    pub config: RuleConfig,
    /// The board
    pub board: Board,
    /// All players
    pub players: Vec<Player>,
    /// Index of the player whose turn it is
    pub current_player: PlayerId,
    /// Turn history; the last element is the current turn
    pub turns: Vec<PlayerTurn>,
    /// Cured/exterminated status per plague in play
    pub plagues: Vec<PlagueStatus>,
    /// Outbreak counter; monotonically non-decreasing
    pub outbreaks: u32,
    /// Infection-level marker: index into the infection track
    pub infection_level: usize,
    /// Research laboratories built over the game's life
    pub labs_built: u32,
    /// Set when all plagues are cured
    pub won: bool,
    /// Set with the reason when the game is lost
    pub loss: Option<LossReason>,
    /// Player-card draw and discard stacks
    pub player_deck: PlayerDeck,
    /// Infection-card draw and discard stacks
    pub infection_deck: InfectionDeck,
    /// At most one in-flight approval per game
    pending_approval: Option<Approval>,
}

impl Game {
    /// Create a new game with entropy from the thread RNG
    pub fn new(
        config: RuleConfig,
        map_type: MapType,
        plague_colors: Vec<PlagueColor>,
        players: Vec<(String, PlayerKind)>,
    ) -> Result<Self, GameError> {
        Self::new_with_rng(config, map_type, plague_colors, players, &mut rand::thread_rng())
    }

    /// Create a new game with a caller-supplied RNG (deterministic setups)
    pub fn new_with_rng<R: Rng>(
        config: RuleConfig,
        map_type: MapType,
        plague_colors: Vec<PlagueColor>,
        players: Vec<(String, PlayerKind)>,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        if !(2..=4).contains(&players.len()) {
            return Err(GameError::InvalidSetup(format!(
                "need 2-4 players, got {}",
                players.len()
            )));
        }
        let mut colors: Vec<PlagueColor> = Vec::new();
        for color in plague_colors {
            if !colors.contains(&color) {
                colors.push(color);
            }
        }
        if colors.is_empty() {
            return Err(GameError::InvalidSetup("no plagues configured".to_string()));
        }

        let mut board = Board::new(map_type);
        let start = board.start_field();

        // The start field opens with the first laboratory
        if let Some(field) = board.field_mut(start) {
            field.has_research_lab = true;
        }

        let roles = Role::deal(players.len(), rng);
        let players: Vec<Player> = players
            .into_iter()
            .zip(roles)
            .enumerate()
            .map(|(i, ((name, kind), role))| Player::new(i as PlayerId, name, kind, role, start))
            .collect();

        let plagues = colors
            .iter()
            .map(|&color| PlagueStatus {
                color,
                cured: false,
                exterminated: false,
            })
            .collect();

        let mut game = Self {
            id: Uuid::new_v4(),
            board,
            players,
            current_player: 0,
            turns: Vec::new(),
            plagues,
            outbreaks: 0,
            infection_level: 0,
            labs_built: 1,
            won: false,
            loss: None,
            player_deck: PlayerDeck {
                draw: Vec::new(),
                discard: Vec::new(),
            },
            infection_deck: InfectionDeck {
                draw: Vec::new(),
                discard: Vec::new(),
            },
            config,
            pending_approval: None,
        };

        // Initial infection wave
        game.infection_deck = InfectionDeck::new(&game.board, rng);
        let waves = game.config.initial_infections.clone();
        for cubes in waves {
            if let Some(card) = game.infection_deck.draw() {
                if let Some(color) = game.board.field(card.field).map(|f| f.color) {
                    // Setup clamps to the supply; exhaustion only loses the
                    // game once play has started
                    let amount = u32::from(cubes.min(game.config.max_cubes_per_field))
                        .min(game.supply_remaining(color)) as u8;
                    if let Some(field) = game.board.field_mut(card.field) {
                        field.cubes.add(color, amount);
                    }
                }
                game.infection_deck.discard(card);
            }
        }

        // Deal initial hands, then mix epidemics into the remainder
        let mut cities = PlayerDeck::shuffled_city_cards(&game.board, rng);
        let hand_size = 6usize.saturating_sub(game.players.len());
        for player in &mut game.players {
            for _ in 0..hand_size {
                if let Some(card) = cities.pop() {
                    player.hand.push(card);
                }
            }
        }
        game.player_deck = PlayerDeck::build(cities, game.config.epidemic_cards, rng);

        let first = game.new_turn(0);
        game.turns.push(first);

        Ok(game)
    }

    // ==================== Queries ====================

    /// Get a player by ID
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id as usize)
    }

    /// The current turn
    pub fn current_turn(&self) -> &PlayerTurn {
        self.turns.last().expect("game always has a current turn")
    }

    fn current_turn_mut(&mut self) -> &mut PlayerTurn {
        self.turns.last_mut().expect("game always has a current turn")
    }

    /// Status for one plague color, if it is in play
    pub fn plague_status(&self, color: PlagueColor) -> Option<&PlagueStatus> {
        self.plagues.iter().find(|p| p.color == color)
    }

    fn plague_status_mut(&mut self, color: PlagueColor) -> Option<&mut PlagueStatus> {
        self.plagues.iter_mut().find(|p| p.color == color)
    }

    /// Plague cubes of `color` still in the supply. Treating returns cubes
    /// to the supply, so this is the configured count minus the board.
    pub fn supply_remaining(&self, color: PlagueColor) -> u32 {
        self.config
            .cubes_per_color
            .saturating_sub(self.board.cubes_on_board(color))
    }

    /// The in-flight approval, if any
    pub fn pending_approval(&self) -> Option<&Approval> {
        self.pending_approval.as_ref()
    }

    /// Whether all plagues in play are cured
    pub fn is_game_won(&self) -> bool {
        self.won
    }

    /// Whether a loss condition has fired
    pub fn is_game_lost(&self) -> bool {
        self.loss.is_some()
    }

    /// Whether the game has reached a terminal state
    pub fn is_over(&self) -> bool {
        self.won || self.loss.is_some()
    }

    /// Every action `player` could legally submit right now
    pub fn legal_actions(&self, player: PlayerId) -> Vec<Action> {
        actions::legal_actions(self, player)
    }

    fn new_turn(&self, player: PlayerId) -> PlayerTurn {
        let bonus = self
            .player(player)
            .map(|p| p.role.action_bonus())
            .unwrap_or(0);
        PlayerTurn::new(
            player,
            self.config.actions_per_turn + bonus,
            self.config.player_card_draws,
        )
    }

    // ==================== Actions ====================

    /// Execute one action, or park it as a pending approval when it needs
    /// another player's consent
    pub fn submit_action(
        &mut self,
        player: PlayerId,
        action: Action,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.pending_approval.is_some() {
            return Err(GameError::ApprovalPending);
        }
        action.validate(self, player)?;

        let mut events = Vec::new();

        if let Some(approver) = action.approving_player() {
            // Effect deferred until the ally responds; no budget spent yet
            let approval = Approval::new(action, player, approver);
            events.push(GameEvent::ApprovalRequested {
                approval: approval.clone(),
            });
            self.pending_approval = Some(approval);
            return Ok(events);
        }

        if let Action::DiscardCard { card } = action {
            self.apply_forced_discard(player, card, &mut events);
            return Ok(events);
        }

        self.execute_action(player, &action, &mut events);
        self.spend_action(&mut events);
        Ok(events)
    }

    /// Apply a validated action's direct effects
    fn execute_action(&mut self, actor: PlayerId, action: &Action, events: &mut Vec<GameEvent>) {
        match action {
            Action::Move { kind: _, destination } | Action::MoveAlly { kind: _, destination, .. } => {
                let mover = action.moved_player(actor);
                if let Some(card) = action.discarded_card(self, actor) {
                    self.discard_from_hand(mover, card, events);
                }
                self.move_pawn(mover, *destination, events);
            }

            Action::CurePlague { color } => {
                self.treat_field(actor, *color, events);
            }

            Action::BuildResearchLaboratory { relocate_from } => {
                let at = self.player(actor).map(|p| p.field).unwrap_or_default();
                self.discard_from_hand(actor, PlayerCard::City(at), events);

                if let Some(from) = relocate_from {
                    if let Some(source) = self.board.field_mut(*from) {
                        source.has_research_lab = false;
                    }
                    events.push(GameEvent::LaboratoryMoved { from: *from, to: at });
                } else {
                    self.labs_built += 1;
                    events.push(GameEvent::LaboratoryBuilt {
                        player: actor,
                        field: at,
                    });
                }
                if let Some(field) = self.board.field_mut(at) {
                    field.has_research_lab = true;
                }
            }

            Action::DiscoverAntidote { color, card_fields } => {
                for &card_field in card_fields {
                    self.discard_from_hand(actor, PlayerCard::City(card_field), events);
                }
                let at = self.player(actor).map(|p| p.field).unwrap_or_default();
                if let Some(status) = self.plague_status_mut(*color) {
                    status.cured = true;
                }
                if let Some(field) = self.board.field_mut(at) {
                    field.antidote_marker = Some(*color);
                }
                events.push(GameEvent::AntidoteDiscovered {
                    player: actor,
                    color: *color,
                    field: at,
                });
                self.check_extermination(*color, events);
                self.check_win(events);
            }

            // Forced discards and approvals take other paths
            Action::DiscardCard { .. } => {}
        }
    }

    /// Move a pawn, then evaluate auto triggers for the arriving player
    fn move_pawn(&mut self, mover: PlayerId, destination: FieldId, events: &mut Vec<GameEvent>) {
        let from = match self.player_mut(mover) {
            Some(p) => {
                let from = p.field;
                p.field = destination;
                from
            }
            None => return,
        };
        events.push(GameEvent::PlayerMoved {
            player: mover,
            from,
            to: destination,
        });
        self.run_auto_triggers(mover, events);
    }

    /// Treat cubes on the actor's current field. Cured plagues (and the
    /// doctor) remove the whole stack; otherwise one cube comes off.
    fn treat_field(&mut self, actor: PlayerId, color: PlagueColor, events: &mut Vec<GameEvent>) {
        let at = match self.player(actor) {
            Some(p) => p.field,
            None => return,
        };
        let cured = self.plague_status(color).map(|s| s.cured).unwrap_or(false);
        let sweep = cured
            || self
                .player(actor)
                .map(|p| p.role.treats_all_cubes())
                .unwrap_or(false);

        let removed = match self.board.field_mut(at) {
            Some(field) => {
                let amount = if sweep { field.cubes.get(color) } else { 1 };
                field.cubes.remove(color, amount)
            }
            None => 0,
        };
        if removed > 0 {
            events.push(GameEvent::PlagueTreated {
                player: actor,
                field: at,
                color,
                removed,
            });
            self.check_extermination(color, events);
        }
    }

    /// Remove a card from a hand onto the player discard pile
    fn discard_from_hand(&mut self, player: PlayerId, card: PlayerCard, events: &mut Vec<GameEvent>) {
        let removed = self.player_mut(player).and_then(|p| p.remove_card(card));
        if let Some(card) = removed {
            self.player_deck.discard(card);
            events.push(GameEvent::CardDiscarded { player, card });
        }
    }

    /// Spend one action from the current turn's budget
    fn spend_action(&mut self, events: &mut Vec<GameEvent>) {
        let player = self.current_turn().player;
        if self.current_turn_mut().spend_action() {
            events.push(GameEvent::ActionsExhausted { player });
        }
    }

    /// Resolve a forced hand-limit discard
    fn apply_forced_discard(
        &mut self,
        player: PlayerId,
        card: PlayerCard,
        events: &mut Vec<GameEvent>,
    ) {
        self.discard_from_hand(player, card, events);

        let within_limit = self
            .player(player)
            .map(|p| p.cards_over_limit(self.config.max_hand_cards) == 0)
            .unwrap_or(true);
        if within_limit {
            let rate = self.config.infection_rate(self.infection_level);
            let turn = self.current_turn_mut();
            turn.discard_required = false;
            turn.try_enter_infection_phase(rate);
        }
    }

    // ==================== Approvals & triggers ====================

    /// Answer the pending approval.
    ///
    /// `Approved` commits the gated action and spends the actor's budget;
    /// `Rejected` discards the effect at no cost; `Outbound` is an
    /// informational echo with no state change.
    pub fn respond_approval(
        &mut self,
        player: PlayerId,
        approval_id: Uuid,
        status: ApprovalStatus,
    ) -> Result<Vec<GameEvent>, GameError> {
        let pending = self
            .pending_approval
            .as_ref()
            .ok_or(GameError::NoPendingApproval)?;
        if pending.id != approval_id {
            return Err(GameError::StaleApproval);
        }
        if pending.approver != player {
            return Err(GameError::NotYourTurn);
        }

        if status == ApprovalStatus::Outbound {
            return Ok(Vec::new());
        }

        let mut approval = self
            .pending_approval
            .take()
            .ok_or(GameError::NoPendingApproval)?;
        let mut events = Vec::new();

        match status {
            ApprovalStatus::Approved => {
                approval.approve();
                events.push(GameEvent::ApprovalResolved {
                    approval: approval.clone(),
                    status,
                });
                let action = approval.action.clone();
                self.execute_action(approval.actor, &action, &mut events);
                self.spend_action(&mut events);
            }
            ApprovalStatus::Rejected => {
                events.push(GameEvent::ApprovalResolved { approval, status });
            }
            ApprovalStatus::Outbound => unreachable!("handled above"),
        }

        Ok(events)
    }

    /// Fire a manually submitted trigger
    pub fn submit_trigger(
        &mut self,
        player: PlayerId,
        trigger: Trigger,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        if self.pending_approval.is_some() {
            return Err(GameError::ApprovalPending);
        }
        if trigger.player != player {
            return Err(GameError::NotYourTurn);
        }
        let p = self.player(player).ok_or(GameError::UnknownPlayer)?;

        let mut events = Vec::new();
        match trigger.kind {
            TriggerKind::DoctorCure { field, color } => {
                let cured = self.plague_status(color).map(|s| s.cured).unwrap_or(false);
                let has_cubes = self
                    .board
                    .field(field)
                    .map(|f| f.cubes.get(color) > 0)
                    .unwrap_or(false);
                if !p.role.treats_all_cubes() || p.field != field || !cured || !has_cubes {
                    return Err(GameError::ActionUnavailable);
                }
                events.push(GameEvent::TriggerFired { trigger });
                self.treat_field(player, color, &mut events);
            }

            TriggerKind::OperationsFlight {
                destination,
                discard,
            } => {
                let turn = self.current_turn();
                if !p.role.has_operations_flight() {
                    return Err(GameError::ActionUnavailable);
                }
                if turn.player != player {
                    return Err(GameError::NotYourTurn);
                }
                if turn.phase != TurnPhase::Actions {
                    return Err(GameError::WrongPhase);
                }
                if turn.operations_flight_used {
                    return Err(GameError::ActionUnavailable);
                }
                let at_lab = self
                    .board
                    .field(p.field)
                    .map(|f| f.has_research_lab)
                    .unwrap_or(false);
                if !at_lab || destination == p.field {
                    return Err(GameError::ActionUnavailable);
                }
                if destination >= self.board.field_count() {
                    return Err(GameError::UnknownField);
                }
                if !p.has_city_card(discard) {
                    return Err(GameError::NoSuchCard);
                }

                events.push(GameEvent::TriggerFired { trigger });
                self.discard_from_hand(player, PlayerCard::City(discard), &mut events);
                self.current_turn_mut().operations_flight_used = true;
                self.move_pawn(player, destination, &mut events);
            }
        }

        Ok(events)
    }

    /// Auto triggers evaluated the moment a pawn enters a field. Direct
    /// effects have already committed at this point, so no trigger observes
    /// a partially-applied board.
    fn run_auto_triggers(&mut self, mover: PlayerId, events: &mut Vec<GameEvent>) {
        let (field, is_doctor) = match self.player(mover) {
            Some(p) => (p.field, p.role.treats_all_cubes()),
            None => return,
        };
        if !is_doctor {
            return;
        }

        for color in PlagueColor::ALL {
            let cured = self.plague_status(color).map(|s| s.cured).unwrap_or(false);
            let has_cubes = self
                .board
                .field(field)
                .map(|f| f.cubes.get(color) > 0)
                .unwrap_or(false);
            if cured && has_cubes {
                events.push(GameEvent::TriggerFired {
                    trigger: Trigger {
                        player: mover,
                        kind: TriggerKind::DoctorCure { field, color },
                    },
                });
                self.treat_field(mover, color, events);
            }
        }
    }

    // ==================== Card draws ====================

    /// Draw one player card. Deck exhaustion is a loss, reported as an
    /// event, never as an `Err`.
    pub fn draw_player_card(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        if self.pending_approval.is_some() {
            return Err(GameError::ApprovalPending);
        }
        let turn = self.current_turn();
        if turn.player != player {
            return Err(GameError::NotYourTurn);
        }
        if turn.phase != TurnPhase::CardDraw || turn.discard_required {
            return Err(GameError::WrongPhase);
        }
        // Resolve the player before the deck mutates; an error past this
        // point would lose the drawn card
        if self.player(player).is_none() {
            return Err(GameError::UnknownPlayer);
        }

        let mut events = Vec::new();

        let card = match self.player_deck.draw() {
            Some(card) => card,
            None => {
                self.set_lost(LossReason::PlayerDeckExhausted, &mut events);
                return Ok(events);
            }
        };

        match card {
            PlayerCard::Epidemic => {
                events.push(GameEvent::EpidemicDrawn { player });
                self.player_deck.discard(PlayerCard::Epidemic);
                self.resolve_epidemic(&mut events);
                if self.is_over() {
                    return Ok(events);
                }
            }
            PlayerCard::City(_) => {
                events.push(GameEvent::PlayerCardDrawn { player, card });
                let max_hand = self.config.max_hand_cards;
                let mut over_limit = false;
                if let Some(p) = self.player_mut(player) {
                    p.hand.push(card);
                    over_limit = p.cards_over_limit(max_hand) > 0;
                }
                if over_limit {
                    self.current_turn_mut().discard_required = true;
                    events.push(GameEvent::HandLimitExceeded { player });
                }
            }
        }

        let rate = self.config.infection_rate(self.infection_level);
        let turn = self.current_turn_mut();
        turn.record_card_draw();
        turn.try_enter_infection_phase(rate);

        Ok(events)
    }

    /// Epidemic: raise the infection level, infect the bottom card's field
    /// to the per-field maximum, then reshuffle the discard on top of the
    /// draw stack
    fn resolve_epidemic(&mut self, events: &mut Vec<GameEvent>) {
        self.infection_level += 1;
        events.push(GameEvent::InfectionLevelIncreased {
            level: self.infection_level,
        });
        if self.config.infection_level_exceeded(self.infection_level) {
            self.set_lost(LossReason::InfectionLevelLimit, events);
            return;
        }

        if let Some(card) = self.infection_deck.draw_bottom() {
            let target = card.field;
            let color = match self.board.field(target) {
                Some(f) => f.color,
                None => return,
            };
            let exterminated = self
                .plague_status(color)
                .map(|s| s.exterminated)
                .unwrap_or(true);
            if !exterminated {
                let max = self.config.max_cubes_per_field;
                let current = self
                    .board
                    .field(target)
                    .map(|f| f.cubes.get(color))
                    .unwrap_or(0);
                if current >= max {
                    // Already maximal: a single further infection cascades
                    self.infect_field(target, color, events);
                } else {
                    // The fill never draws past the supply; coming up short
                    // is a loss
                    let needed = u32::from(max - current);
                    let placed = needed.min(self.supply_remaining(color));
                    if let Some(field) = self.board.field_mut(target) {
                        field.cubes.add(color, placed as u8);
                    }
                    for _ in 0..placed {
                        events.push(GameEvent::FieldInfected {
                            field: target,
                            color,
                        });
                    }
                    if placed < needed {
                        self.set_lost(LossReason::CubeSupplyExhausted, events);
                    }
                }
            }
            self.infection_deck.discard(card);
        }

        if self.is_over() {
            return;
        }
        self.infection_deck
            .reshuffle_discard_on_top(&mut rand::thread_rng());
    }

    /// Draw one infection card and infect its field
    pub fn draw_infection_card(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        if self.pending_approval.is_some() {
            return Err(GameError::ApprovalPending);
        }
        let turn = self.current_turn();
        if turn.player != player {
            return Err(GameError::NotYourTurn);
        }
        if turn.phase != TurnPhase::Infection {
            return Err(GameError::WrongPhase);
        }

        let mut events = Vec::new();

        if self.infection_deck.remaining() == 0 {
            self.infection_deck
                .reshuffle_discard_on_top(&mut rand::thread_rng());
        }
        if let Some(card) = self.infection_deck.draw() {
            events.push(GameEvent::InfectionCardDrawn { field: card.field });
            if let Some(color) = self.board.field(card.field).map(|f| f.color) {
                self.infect_field(card.field, color, &mut events);
            }
            self.infection_deck.discard(card);
        }

        if !self.is_over() && self.current_turn_mut().record_infection_draw() {
            events.push(GameEvent::TurnCompleted { player });
        }

        Ok(events)
    }

    // ==================== Infection & outbreaks ====================

    /// Add one cube of `color` to `field`, cascading an outbreak when the
    /// field is already at the per-field maximum. Each field outbreaks at
    /// most once per cascade; placing from an empty supply loses the game.
    pub(crate) fn infect_field(
        &mut self,
        field: FieldId,
        color: PlagueColor,
        events: &mut Vec<GameEvent>,
    ) {
        let mut visited = HashSet::new();
        self.infect_inner(field, color, &mut visited, events);
    }

    fn infect_inner(
        &mut self,
        field: FieldId,
        color: PlagueColor,
        visited: &mut HashSet<FieldId>,
        events: &mut Vec<GameEvent>,
    ) {
        if self.is_over() {
            return;
        }
        let exterminated = self
            .plague_status(color)
            .map(|s| s.exterminated)
            .unwrap_or(true);
        if exterminated {
            return;
        }

        let max = self.config.max_cubes_per_field;
        let current = match self.board.field(field) {
            Some(f) => f.cubes.get(color),
            None => return,
        };

        if current < max {
            if self.supply_remaining(color) == 0 {
                self.set_lost(LossReason::CubeSupplyExhausted, events);
                return;
            }
            if let Some(f) = self.board.field_mut(field) {
                f.cubes.add(color, 1);
            }
            events.push(GameEvent::FieldInfected { field, color });
            return;
        }

        // Already maximal: outbreak, unless this field blew up earlier in
        // the same cascade
        if !visited.insert(field) {
            return;
        }
        self.outbreaks += 1;
        events.push(GameEvent::Outbreak { field, color });
        if self.outbreaks >= self.config.max_outbreaks {
            self.set_lost(LossReason::OutbreakLimit, events);
            return;
        }

        let neighbors: Vec<FieldId> = self.board.neighbors(field).to_vec();
        for neighbor in neighbors {
            self.infect_inner(neighbor, color, visited, events);
        }
    }

    // ==================== Turn & lifecycle ====================

    /// End the current turn and open the next player's. A no-op when the
    /// game is already won or lost.
    pub fn end_turn(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        if self.is_over() {
            return Ok(Vec::new());
        }
        let turn = self.current_turn();
        if turn.player != player {
            return Err(GameError::NotYourTurn);
        }
        if turn.phase != TurnPhase::Complete {
            return Err(GameError::WrongPhase);
        }

        let next = (self.current_player + 1) % self.players.len() as PlayerId;
        self.current_player = next;
        let turn = self.new_turn(next);
        self.turns.push(turn);

        Ok(vec![GameEvent::TurnEnded {
            player,
            next_player: next,
        }])
    }

    /// A player abandons the game: any approval involving them is force
    /// rejected and the game resolves to lost
    pub fn player_leaves(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        if self.player(player).is_none() {
            return Err(GameError::UnknownPlayer);
        }
        if self.is_over() {
            return Ok(Vec::new());
        }

        let mut events = Vec::new();

        let involves_leaver = self
            .pending_approval
            .as_ref()
            .map(|a| a.approver == player || a.actor == player)
            .unwrap_or(false);
        if involves_leaver {
            if let Some(approval) = self.pending_approval.take() {
                events.push(GameEvent::ApprovalResolved {
                    approval,
                    status: ApprovalStatus::Rejected,
                });
            }
        }

        if let Some(p) = self.player_mut(player) {
            p.has_left = true;
        }
        events.push(GameEvent::PlayerLeft { player });
        self.set_lost(LossReason::PlayerAbandoned, &mut events);

        Ok(events)
    }

    // ==================== Win / loss ====================

    /// A cured plague with no cubes left anywhere is exterminated
    fn check_extermination(&mut self, color: PlagueColor, events: &mut Vec<GameEvent>) {
        let gone = self.board.cubes_on_board(color) == 0;
        if let Some(status) = self.plague_status_mut(color) {
            if status.cured && !status.exterminated && gone {
                status.exterminated = true;
                events.push(GameEvent::PlagueExterminated { color });
            }
        }
    }

    fn check_win(&mut self, events: &mut Vec<GameEvent>) {
        if !self.won && self.loss.is_none() && self.plagues.iter().all(|p| p.cured) {
            self.won = true;
            events.push(GameEvent::GameWon);
        }
    }

    fn set_lost(&mut self, reason: LossReason, events: &mut Vec<GameEvent>) {
        if !self.is_over() {
            self.loss = Some(reason);
            events.push(GameEvent::GameLost { reason });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::MoveKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quiet_config() -> RuleConfig {
        // No setup infections or epidemics; tests arrange cubes by hand
        RuleConfig {
            epidemic_cards: 0,
            initial_infections: vec![],
            ..RuleConfig::default()
        }
    }

    fn two_player_game() -> Game {
        let mut rng = StdRng::seed_from_u64(11);
        let mut game = Game::new_with_rng(
            quiet_config(),
            MapType::World,
            PlagueColor::ALL.to_vec(),
            vec![
                ("Ada".to_string(), PlayerKind::Human),
                ("Ben".to_string(), PlayerKind::Human),
            ],
            &mut rng,
        )
        .unwrap();
        // Pin roles so budgets and sweeps are deterministic
        game.players[0].role = Role::Scientist;
        game.players[1].role = Role::Logistician;
        game.turns = vec![PlayerTurn::new(0, 4, 2)];
        game
    }

    #[test]
    fn test_new_game_shape() {
        let game = two_player_game();
        assert_eq!(game.players.len(), 2);
        assert_eq!(game.turns.len(), 1);
        assert_eq!(game.current_turn().player, 0);
        assert!(!game.is_over());

        // Start field holds the first laboratory
        assert!(game.board.field(game.board.start_field()).unwrap().has_research_lab);
        assert_eq!(game.labs_built, 1);

        // Two players draw four cards each
        assert_eq!(game.players[0].hand_size(), 4);
        assert_eq!(game.players[1].hand_size(), 4);
    }

    #[test]
    fn test_player_count_bounds() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = Game::new_with_rng(
            quiet_config(),
            MapType::World,
            PlagueColor::ALL.to_vec(),
            vec![("Solo".to_string(), PlayerKind::Human)],
            &mut rng,
        );
        assert!(matches!(result, Err(GameError::InvalidSetup(_))));
    }

    #[test]
    fn test_car_move_spends_one_action() {
        let mut game = two_player_game();
        let from = game.players[0].field;
        let to = game.board.neighbors(from)[0];

        let events = game
            .submit_action(
                0,
                Action::Move {
                    kind: MoveKind::Car,
                    destination: to,
                },
            )
            .unwrap();

        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::PlayerMoved { player: 0, .. })));
        assert_eq!(game.players[0].field, to);
        assert_eq!(game.current_turn().actions_remaining, 3);
        assert!(game.current_turn().are_actions_executable());
    }

    #[test]
    fn test_fourth_action_releases_draw_phase() {
        let mut game = two_player_game();

        let mut last_events = Vec::new();
        for _ in 0..4 {
            let from = game.players[0].field;
            let to = game.board.neighbors(from)[0];
            last_events = game
                .submit_action(
                    0,
                    Action::Move {
                        kind: MoveKind::Car,
                        destination: to,
                    },
                )
                .unwrap();
        }

        assert_eq!(game.current_turn().actions_remaining, 0);
        assert!(!game.current_turn().are_actions_executable());
        assert!(last_events
            .iter()
            .any(|e| matches!(e, GameEvent::ActionsExhausted { player: 0 })));
        assert_eq!(game.current_turn().phase, TurnPhase::CardDraw);
    }

    #[test]
    fn test_unavailable_action_rejects_without_effect() {
        let mut game = two_player_game();
        let from = game.players[0].field;
        // Some field that is not a neighbor
        let far = (0..game.board.field_count())
            .find(|f| *f != from && !game.board.neighbors(from).contains(f))
            .unwrap();

        let action = Action::Move {
            kind: MoveKind::Car,
            destination: far,
        };
        assert!(!action.is_available(&game, 0));
        let before = game.clone();
        let err = game.submit_action(0, action).unwrap_err();
        assert_eq!(err, GameError::ActionUnavailable);

        assert_eq!(game.players[0].field, before.players[0].field);
        assert_eq!(
            game.current_turn().actions_remaining,
            before.current_turn().actions_remaining
        );
    }

    #[test]
    fn test_charter_flight_without_card_is_no_such_card() {
        let mut game = two_player_game();
        let from = game.players[0].field;
        game.players[0].hand.retain(|c| *c != PlayerCard::City(from));

        let action = Action::Move {
            kind: MoveKind::CharterFlight,
            destination: (from + 1) % game.board.field_count(),
        };
        assert!(!action.is_available(&game, 0));
        let before = game.players[0].field;
        assert_eq!(game.submit_action(0, action).unwrap_err(), GameError::NoSuchCard);
        assert_eq!(game.players[0].field, before);
    }

    #[test]
    fn test_direct_flight_consumes_card() {
        let mut game = two_player_game();
        let from = game.players[0].field;
        let target = (0..game.board.field_count())
            .find(|&f| f != from)
            .unwrap();
        game.players[0].hand.push(PlayerCard::City(target));
        let hand_before = game.players[0].hand_size();

        game.submit_action(
            0,
            Action::Move {
                kind: MoveKind::DirectFlight,
                destination: target,
            },
        )
        .unwrap();

        assert_eq!(game.players[0].field, target);
        assert_eq!(game.players[0].hand_size(), hand_before - 1);
        assert_eq!(game.player_deck.discard.last(), Some(&PlayerCard::City(target)));
    }

    #[test]
    fn test_treat_cube() {
        let mut game = two_player_game();
        let at = game.players[0].field;
        game.board.field_mut(at).unwrap().cubes.add(PlagueColor::Blue, 2);
        // Doctors sweep the whole stack; pin a non-doctor role
        game.players[0].role = Role::Generalist;

        game.submit_action(0, Action::CurePlague { color: PlagueColor::Blue })
            .unwrap();
        assert_eq!(
            game.board.field(at).unwrap().cubes.get(PlagueColor::Blue),
            1
        );
    }

    #[test]
    fn test_cured_treat_sweeps_and_exterminates() {
        let mut game = two_player_game();
        let at = game.players[0].field;
        game.players[0].role = Role::Generalist;
        game.board.field_mut(at).unwrap().cubes.add(PlagueColor::Blue, 3);
        game.plague_status_mut(PlagueColor::Blue).unwrap().cured = true;

        let events = game
            .submit_action(0, Action::CurePlague { color: PlagueColor::Blue })
            .unwrap();

        assert_eq!(game.board.cubes_on_board(PlagueColor::Blue), 0);
        assert!(game.plague_status(PlagueColor::Blue).unwrap().exterminated);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::PlagueExterminated { color: PlagueColor::Blue })));
    }

    #[test]
    fn test_outbreak_cascade_touches_each_field_once() {
        let mut game = {
            let mut rng = StdRng::seed_from_u64(5);
            Game::new_with_rng(
                quiet_config(),
                MapType::Mini,
                PlagueColor::ALL.to_vec(),
                vec![
                    ("Ada".to_string(), PlayerKind::Human),
                    ("Ben".to_string(), PlayerKind::Human),
                ],
                &mut rng,
            )
            .unwrap()
        };

        // Saturate two adjacent fields with red
        let max = game.config.max_cubes_per_field;
        game.board.field_mut(0).unwrap().cubes.set(PlagueColor::Red, max);
        game.board.field_mut(1).unwrap().cubes.set(PlagueColor::Red, max);

        let mut events = Vec::new();
        game.infect_field(0, PlagueColor::Red, &mut events);

        let outbreak_fields: Vec<FieldId> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Outbreak { field, .. } => Some(*field),
                _ => None,
            })
            .collect();
        // Both saturated fields outbreak, each exactly once
        assert_eq!(outbreak_fields.len(), 2);
        assert!(outbreak_fields.contains(&0));
        assert!(outbreak_fields.contains(&1));
        assert_eq!(game.outbreaks, 2);

        // No field exceeds the cap
        for field in &game.board.fields {
            assert!(field.cubes.get(PlagueColor::Red) <= max);
        }
    }

    #[test]
    fn test_outbreak_limit_loses_game() {
        let mut game = two_player_game();
        game.outbreaks = game.config.max_outbreaks - 1;
        let max = game.config.max_cubes_per_field;
        game.board.field_mut(0).unwrap().cubes.set(PlagueColor::Blue, max);

        let mut events = Vec::new();
        game.infect_field(0, PlagueColor::Blue, &mut events);

        assert!(game.is_game_lost());
        assert_eq!(game.loss, Some(LossReason::OutbreakLimit));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::GameLost { reason: LossReason::OutbreakLimit })));
    }

    #[test]
    fn test_setup_infections_clamp_to_cube_supply() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = RuleConfig {
            epidemic_cards: 0,
            cubes_per_color: 1,
            initial_infections: vec![3, 3, 3, 3, 3, 3],
            ..RuleConfig::default()
        };
        let game = Game::new_with_rng(
            config,
            MapType::World,
            PlagueColor::ALL.to_vec(),
            vec![
                ("Ada".to_string(), PlayerKind::Human),
                ("Ben".to_string(), PlayerKind::Human),
            ],
            &mut rng,
        )
        .unwrap();

        for color in PlagueColor::ALL {
            assert!(game.board.cubes_on_board(color) <= 1);
        }
        assert!(!game.is_over());
    }

    #[test]
    fn test_infection_with_empty_supply_loses_game() {
        let mut game = two_player_game();
        game.config.cubes_per_color = 2;
        game.board.field_mut(1).unwrap().cubes.set(PlagueColor::Blue, 2);

        let mut events = Vec::new();
        game.infect_field(0, PlagueColor::Blue, &mut events);

        assert_eq!(game.loss, Some(LossReason::CubeSupplyExhausted));
        assert_eq!(game.board.field(0).unwrap().cubes.get(PlagueColor::Blue), 0);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::GameLost {
                reason: LossReason::CubeSupplyExhausted
            }
        )));
    }

    #[test]
    fn test_epidemic_fill_stops_at_the_supply() {
        let mut game = two_player_game();
        game.current_turn_mut().phase = TurnPhase::CardDraw;
        game.current_turn_mut().actions_remaining = 0;
        game.player_deck.draw.push(PlayerCard::Epidemic);

        let bottom = game.infection_deck.draw[0].field;
        let color = game.board.field(bottom).unwrap().color;
        game.config.cubes_per_color = 1;

        let events = game.draw_player_card(0).unwrap();

        // One cube placed, then the supply runs dry mid-fill
        assert_eq!(game.loss, Some(LossReason::CubeSupplyExhausted));
        assert_eq!(game.board.field(bottom).unwrap().cubes.get(color), 1);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::FieldInfected { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_rejected_draw_leaves_deck_untouched() {
        let mut game = two_player_game();
        let before = game.player_deck.remaining();

        // Still in the action phase
        assert_eq!(game.draw_player_card(0).unwrap_err(), GameError::WrongPhase);

        // Not the turn owner
        game.current_turn_mut().phase = TurnPhase::CardDraw;
        game.current_turn_mut().actions_remaining = 0;
        assert_eq!(game.draw_player_card(1).unwrap_err(), GameError::NotYourTurn);

        assert_eq!(game.player_deck.remaining(), before);
    }

    #[test]
    fn test_empty_player_deck_is_a_loss_not_an_error() {
        let mut game = two_player_game();
        game.current_turn_mut().phase = TurnPhase::CardDraw;
        game.current_turn_mut().actions_remaining = 0;
        game.player_deck.draw.clear();

        let events = game.draw_player_card(0).unwrap();
        assert!(game.is_game_lost());
        assert_eq!(game.loss, Some(LossReason::PlayerDeckExhausted));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::GameLost { .. })));
    }

    #[test]
    fn test_discover_antidote_wins_when_last() {
        let mut game = two_player_game();
        // Three of four already cured
        for color in [PlagueColor::Red, PlagueColor::Yellow, PlagueColor::Black] {
            game.plague_status_mut(color).unwrap().cured = true;
        }
        game.players[0].role = Role::Generalist;
        // Stand at the lab with five blue cards
        game.players[0].field = game.board.start_field();
        game.players[0].hand = (0..5).map(PlayerCard::City).collect();

        let events = game
            .submit_action(
                0,
                Action::DiscoverAntidote {
                    color: PlagueColor::Blue,
                    card_fields: vec![0, 1, 2, 3, 4],
                },
            )
            .unwrap();

        assert!(game.is_game_won());
        assert!(events.iter().any(|e| matches!(e, GameEvent::GameWon)));
        assert_eq!(
            game.board.field(game.players[0].field).unwrap().antidote_marker,
            Some(PlagueColor::Blue)
        );
    }

    #[test]
    fn test_end_turn_is_noop_after_game_over() {
        let mut game = two_player_game();
        game.won = true;
        let events = game.end_turn(0).unwrap();
        assert!(events.is_empty());
        assert_eq!(game.turns.len(), 1);
    }

    #[test]
    fn test_turn_rotation_is_circular() {
        let mut game = two_player_game();
        game.current_turn_mut().phase = TurnPhase::Complete;
        game.end_turn(0).unwrap();
        assert_eq!(game.current_player, 1);
        assert_eq!(game.current_turn().player, 1);

        game.current_turn_mut().phase = TurnPhase::Complete;
        game.end_turn(1).unwrap();
        assert_eq!(game.current_player, 0);
        assert_eq!(game.turns.len(), 3);
    }

    #[test]
    fn test_player_leaving_loses_game() {
        let mut game = two_player_game();
        let events = game.player_leaves(1).unwrap();
        assert!(game.is_game_lost());
        assert_eq!(game.loss, Some(LossReason::PlayerAbandoned));
        assert!(game.players[1].has_left);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::PlayerLeft { player: 1 })));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let game = two_player_game();
        let json = serde_json::to_string(&game).unwrap();
        let back: Game = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, game.id);
        assert_eq!(back.players.len(), game.players.len());
        assert_eq!(back.current_turn(), game.current_turn());
    }
}
