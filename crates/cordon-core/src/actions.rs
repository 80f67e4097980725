//! Game actions that players can take.
//!
//! Every action is a tagged variant carrying its parameters; capability
//! methods (`validate`, `available_fields`, `moved_player`,
//! `approving_player`, `discarded_card`) replace a type hierarchy.
//! Validation is pure and always precedes execution: an action that fails
//! `validate` leaves board, hand, and turn state untouched.

use crate::board::{FieldId, PlagueColor, PlayerId};
use crate::cards::PlayerCard;
use crate::game::{Game, GameError};
use crate::turn::TurnPhase;
use serde::{Deserialize, Serialize};

/// How a pawn moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveKind {
    /// To a neighboring field
    Car,
    /// To any field whose city card the mover discards
    DirectFlight,
    /// To any field, discarding the city card of the mover's current field
    CharterFlight,
    /// Between two research laboratories
    ShuttleFlight,
}

impl MoveKind {
    /// All move kinds
    pub const ALL: [MoveKind; 4] = [
        MoveKind::Car,
        MoveKind::DirectFlight,
        MoveKind::CharterFlight,
        MoveKind::ShuttleFlight,
    ];

    /// Fields the mover could travel to with this kind, given their
    /// current position and hand
    pub fn available_fields(self, game: &Game, mover: PlayerId) -> Vec<FieldId> {
        let player = match game.player(mover) {
            Some(p) => p,
            None => return Vec::new(),
        };
        let from = player.field;

        match self {
            MoveKind::Car => game.board.neighbors(from).to_vec(),
            MoveKind::DirectFlight => player
                .hand
                .iter()
                .filter_map(|c| c.field())
                .filter(|&f| f != from)
                .collect(),
            MoveKind::CharterFlight => {
                if player.has_city_card(from) {
                    (0..game.board.field_count()).filter(|&f| f != from).collect()
                } else {
                    Vec::new()
                }
            }
            MoveKind::ShuttleFlight => {
                if game.board.field(from).map(|f| f.has_research_lab).unwrap_or(false) {
                    game.board
                        .lab_fields()
                        .into_iter()
                        .filter(|&f| f != from)
                        .collect()
                } else {
                    Vec::new()
                }
            }
        }
    }
}

/// All actions a player can submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Move your own pawn
    Move { kind: MoveKind, destination: FieldId },

    /// Move another player's pawn; commits only after the ally approves
    MoveAlly {
        kind: MoveKind,
        ally: PlayerId,
        destination: FieldId,
    },

    /// Treat plague cubes on your current field
    CurePlague { color: PlagueColor },

    /// Build a laboratory on your current field, discarding its city card.
    /// When the configured maximum is already on the board, an existing
    /// laboratory must be relocated.
    BuildResearchLaboratory { relocate_from: Option<FieldId> },

    /// Discover the antidote for a color at a laboratory, discarding the
    /// listed city cards of that color
    DiscoverAntidote {
        color: PlagueColor,
        card_fields: Vec<FieldId>,
    },

    /// Forced hand-limit discard; legal only while the discard sub-state is
    /// active and never consumes the action budget
    DiscardCard { card: PlayerCard },
}

impl Action {
    /// Whose pawn this action moves (for move actions)
    pub fn moved_player(&self, actor: PlayerId) -> PlayerId {
        match self {
            Action::MoveAlly { ally, .. } => *ally,
            _ => actor,
        }
    }

    /// The player who must approve this action before it commits, if any
    pub fn approving_player(&self) -> Option<PlayerId> {
        match self {
            Action::MoveAlly { ally, .. } => Some(*ally),
            _ => None,
        }
    }

    /// Whether this action needs an approval round-trip
    pub fn requires_approval(&self) -> bool {
        self.approving_player().is_some()
    }

    /// The card this action will discard when it executes, if any
    pub fn discarded_card(&self, game: &Game, actor: PlayerId) -> Option<PlayerCard> {
        let mover = self.moved_player(actor);
        match self {
            Action::Move { kind, destination } | Action::MoveAlly { kind, destination, .. } => {
                match kind {
                    MoveKind::DirectFlight => Some(PlayerCard::City(*destination)),
                    MoveKind::CharterFlight => {
                        let from = game.player(mover)?.field;
                        Some(PlayerCard::City(from))
                    }
                    MoveKind::Car | MoveKind::ShuttleFlight => None,
                }
            }
            Action::BuildResearchLaboratory { .. } => {
                let from = game.player(actor)?.field;
                Some(PlayerCard::City(from))
            }
            Action::DiscardCard { card } => Some(*card),
            Action::CurePlague { .. } | Action::DiscoverAntidote { .. } => None,
        }
    }

    /// Pure availability check: true iff `validate` would pass
    pub fn is_available(&self, game: &Game, actor: PlayerId) -> bool {
        self.validate(game, actor).is_ok()
    }

    /// Check every precondition without mutating anything.
    ///
    /// The engine calls this at the top of `submit_action`; callers that
    /// skip `is_available` get the same error instead of a silent no-op.
    pub fn validate(&self, game: &Game, actor: PlayerId) -> Result<(), GameError> {
        if game.is_over() {
            return Err(GameError::GameOver);
        }
        let turn = game.current_turn();
        if turn.player != actor {
            return Err(GameError::NotYourTurn);
        }
        let player = game.player(actor).ok_or(GameError::UnknownPlayer)?;

        // The forced discard sits outside the action budget
        if let Action::DiscardCard { card } = self {
            if !turn.discard_required {
                return Err(GameError::DiscardNotRequired);
            }
            if !player.hand.contains(card) {
                return Err(GameError::NoSuchCard);
            }
            return Ok(());
        }

        if turn.phase != TurnPhase::Actions {
            return Err(GameError::WrongPhase);
        }
        if !turn.are_actions_executable() {
            return Err(GameError::NoActionsRemaining);
        }

        match self {
            Action::Move { kind, destination } => validate_move(game, actor, *kind, *destination),

            Action::MoveAlly {
                kind,
                ally,
                destination,
            } => {
                if !player.role.can_move_allies() {
                    return Err(GameError::ActionUnavailable);
                }
                if *ally == actor {
                    return Err(GameError::ActionUnavailable);
                }
                let ally_player = game.player(*ally).ok_or(GameError::UnknownPlayer)?;
                if ally_player.has_left {
                    return Err(GameError::UnknownPlayer);
                }
                validate_move(game, *ally, *kind, *destination)
            }

            Action::CurePlague { color } => {
                let field = game.board.field(player.field).ok_or(GameError::UnknownField)?;
                if field.cubes.get(*color) == 0 {
                    return Err(GameError::ActionUnavailable);
                }
                Ok(())
            }

            Action::BuildResearchLaboratory { relocate_from } => {
                let field = game.board.field(player.field).ok_or(GameError::UnknownField)?;
                if field.has_research_lab {
                    return Err(GameError::ActionUnavailable);
                }
                if !player.has_city_card(player.field) {
                    return Err(GameError::NoSuchCard);
                }
                let at_max = game.board.lab_count() >= game.config.max_research_labs;
                match relocate_from {
                    Some(from) => {
                        if !at_max {
                            return Err(GameError::ActionUnavailable);
                        }
                        let source = game.board.field(*from).ok_or(GameError::UnknownField)?;
                        if !source.has_research_lab {
                            return Err(GameError::ActionUnavailable);
                        }
                    }
                    None => {
                        if at_max {
                            return Err(GameError::ActionUnavailable);
                        }
                    }
                }
                Ok(())
            }

            Action::DiscoverAntidote { color, card_fields } => {
                let field = game.board.field(player.field).ok_or(GameError::UnknownField)?;
                if !field.has_research_lab {
                    return Err(GameError::ActionUnavailable);
                }
                let status = game.plague_status(*color).ok_or(GameError::ActionUnavailable)?;
                if status.cured {
                    return Err(GameError::ActionUnavailable);
                }
                let required = player
                    .role
                    .antidote_cards_required(game.config.antidote_cards_required);
                if card_fields.len() != required {
                    return Err(GameError::ActionUnavailable);
                }
                for &card_field in card_fields {
                    if !player.has_city_card(card_field) {
                        return Err(GameError::NoSuchCard);
                    }
                    let card_color = game
                        .board
                        .field(card_field)
                        .ok_or(GameError::UnknownField)?
                        .color;
                    if card_color != *color {
                        return Err(GameError::ActionUnavailable);
                    }
                }
                // Duplicate entries would double-spend one card
                let mut seen = card_fields.clone();
                seen.sort_unstable();
                seen.dedup();
                if seen.len() != card_fields.len() {
                    return Err(GameError::ActionUnavailable);
                }
                Ok(())
            }

            Action::DiscardCard { .. } => unreachable!("handled above"),
        }
    }

    /// One-line description used in approval requests and logs
    pub fn describe(&self, game: &Game, actor: PlayerId) -> String {
        let actor_name = game
            .player(actor)
            .map(|p| p.name.as_str())
            .unwrap_or("unknown");
        let city = |f: FieldId| {
            game.board
                .field(f)
                .map(|fl| fl.city.as_str())
                .unwrap_or("unknown")
        };

        match self {
            Action::Move { destination, .. } => {
                format!("{} moves to {}", actor_name, city(*destination))
            }
            Action::MoveAlly { ally, destination, .. } => {
                let ally_name = game
                    .player(*ally)
                    .map(|p| p.name.as_str())
                    .unwrap_or("unknown");
                format!(
                    "{} wants to move {} to {}",
                    actor_name,
                    ally_name,
                    city(*destination)
                )
            }
            Action::CurePlague { color } => {
                format!("{} treats the {} plague", actor_name, color.name())
            }
            Action::BuildResearchLaboratory { .. } => {
                format!("{} builds a research laboratory", actor_name)
            }
            Action::DiscoverAntidote { color, .. } => {
                format!("{} discovers the {} antidote", actor_name, color.name())
            }
            Action::DiscardCard { .. } => format!("{} discards a card", actor_name),
        }
    }
}

/// Shared move validation: the destination must be reachable for the mover
fn validate_move(
    game: &Game,
    mover: PlayerId,
    kind: MoveKind,
    destination: FieldId,
) -> Result<(), GameError> {
    let player = game.player(mover).ok_or(GameError::UnknownPlayer)?;
    if destination >= game.board.field_count() {
        return Err(GameError::UnknownField);
    }

    // Charter flight without the matching card is the documented
    // illegal-state edge case, reported as a missing card
    if kind == MoveKind::CharterFlight && !player.has_city_card(player.field) {
        return Err(GameError::NoSuchCard);
    }

    if !kind.available_fields(game, mover).contains(&destination) {
        return Err(GameError::ActionUnavailable);
    }
    Ok(())
}

/// Enumerate every action `player` could legally submit right now
pub fn legal_actions(game: &Game, player: PlayerId) -> Vec<Action> {
    let mut actions = Vec::new();

    if game.is_over() || game.pending_approval().is_some() {
        return actions;
    }
    let turn = game.current_turn();
    if turn.player != player {
        return actions;
    }
    let p = match game.player(player) {
        Some(p) => p,
        None => return actions,
    };

    if turn.discard_required {
        for card in &p.hand {
            let action = Action::DiscardCard { card: *card };
            if !actions.contains(&action) {
                actions.push(action);
            }
        }
        return actions;
    }

    if !turn.are_actions_executable() {
        return actions;
    }

    // Moves
    for kind in MoveKind::ALL {
        for destination in kind.available_fields(game, player) {
            actions.push(Action::Move { kind, destination });
        }
    }

    // Ally moves
    if p.role.can_move_allies() {
        for ally in game.players.iter().filter(|a| a.id != player && !a.has_left) {
            for kind in MoveKind::ALL {
                for destination in kind.available_fields(game, ally.id) {
                    actions.push(Action::MoveAlly {
                        kind,
                        ally: ally.id,
                        destination,
                    });
                }
            }
        }
    }

    // Treat cubes on the current field
    if let Some(field) = game.board.field(p.field) {
        for color in PlagueColor::ALL {
            if field.cubes.get(color) > 0 {
                actions.push(Action::CurePlague { color });
            }
        }

        // Build a laboratory
        if !field.has_research_lab && p.has_city_card(p.field) {
            if game.board.lab_count() < game.config.max_research_labs {
                actions.push(Action::BuildResearchLaboratory { relocate_from: None });
            } else {
                for from in game.board.lab_fields() {
                    actions.push(Action::BuildResearchLaboratory {
                        relocate_from: Some(from),
                    });
                }
            }
        }

        // Discover an antidote
        if field.has_research_lab {
            for color in PlagueColor::ALL {
                let uncured = game
                    .plague_status(color)
                    .map(|s| !s.cured)
                    .unwrap_or(false);
                if !uncured {
                    continue;
                }
                let required = p
                    .role
                    .antidote_cards_required(game.config.antidote_cards_required);
                let matching = p.city_cards_of_color(&game.board, color);
                if matching.len() >= required {
                    actions.push(Action::DiscoverAntidote {
                        color,
                        card_fields: matching.into_iter().take(required).collect(),
                    });
                }
            }
        }
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moved_and_approving_player() {
        let own = Action::Move {
            kind: MoveKind::Car,
            destination: 1,
        };
        assert_eq!(own.moved_player(0), 0);
        assert_eq!(own.approving_player(), None);
        assert!(!own.requires_approval());

        let ally = Action::MoveAlly {
            kind: MoveKind::Car,
            ally: 2,
            destination: 1,
        };
        assert_eq!(ally.moved_player(0), 2);
        assert_eq!(ally.approving_player(), Some(2));
        assert!(ally.requires_approval());
    }
}
