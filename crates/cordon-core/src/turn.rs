//! The per-turn state machine.
//!
//! A `PlayerTurn` tracks one player's budgets through the phase sequence
//! `Actions -> CardDraw -> Infection -> Complete`. Transitions are driven by
//! the game aggregate as actions and draws are applied; once the turn ends
//! it stays in the history untouched.

use crate::board::PlayerId;
use serde::{Deserialize, Serialize};

/// Phases of one player's turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Actions remaining > 0
    Actions,
    /// Actions exhausted, player-card draws remaining
    CardDraw,
    /// Card draws done, infection draws remaining
    Infection,
    /// Turn over; waiting for `end_turn`
    Complete,
}

/// One turn's mutable session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTurn {
    /// Whose turn this is
    pub player: PlayerId,
    /// Current phase
    pub phase: TurnPhase,
    /// Actions left in the action phase
    pub actions_remaining: u32,
    /// Player-card draws left in the draw phase
    pub card_draws_remaining: u32,
    /// Infection draws left; latched from the infection track when the
    /// infection phase is entered
    pub infection_draws_remaining: u32,
    /// Hand-limit sub-state: a discard must resolve before the turn advances
    pub discard_required: bool,
    /// The operations flight trigger fires at most once per turn
    pub operations_flight_used: bool,
}

impl PlayerTurn {
    /// Start a turn in the action phase
    pub fn new(player: PlayerId, action_budget: u32, card_draws: u32) -> Self {
        Self {
            player,
            phase: TurnPhase::Actions,
            actions_remaining: action_budget,
            card_draws_remaining: card_draws,
            infection_draws_remaining: 0,
            discard_required: false,
            operations_flight_used: false,
        }
    }

    /// Whether actions may still be executed this turn
    pub fn are_actions_executable(&self) -> bool {
        self.phase == TurnPhase::Actions && self.actions_remaining > 0
    }

    /// Spend one action; returns true when the budget just ran out and the
    /// card-draw phase was released
    pub fn spend_action(&mut self) -> bool {
        debug_assert!(self.are_actions_executable());
        self.actions_remaining -= 1;
        if self.actions_remaining == 0 {
            self.phase = TurnPhase::CardDraw;
            true
        } else {
            false
        }
    }

    /// Record one player-card draw. The transition to the infection phase
    /// waits for `try_enter_infection_phase`, since a hand-limit discard may
    /// still be pending.
    pub fn record_card_draw(&mut self) {
        debug_assert!(self.phase == TurnPhase::CardDraw && self.card_draws_remaining > 0);
        self.card_draws_remaining -= 1;
    }

    /// Enter the infection phase if all card draws are done and no forced
    /// discard is pending; `infection_draws` is read from the infection
    /// track at this moment
    pub fn try_enter_infection_phase(&mut self, infection_draws: u32) -> bool {
        if self.phase == TurnPhase::CardDraw
            && self.card_draws_remaining == 0
            && !self.discard_required
        {
            // A zero-draw track entry skips the phase entirely
            if infection_draws == 0 {
                self.phase = TurnPhase::Complete;
            } else {
                self.phase = TurnPhase::Infection;
                self.infection_draws_remaining = infection_draws;
            }
            true
        } else {
            false
        }
    }

    /// Record one infection draw; returns true when the turn just completed
    pub fn record_infection_draw(&mut self) -> bool {
        debug_assert!(self.phase == TurnPhase::Infection && self.infection_draws_remaining > 0);
        self.infection_draws_remaining -= 1;
        if self.infection_draws_remaining == 0 {
            self.phase = TurnPhase::Complete;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_turn_starts_in_action_phase() {
        let turn = PlayerTurn::new(0, 4, 2);
        assert_eq!(turn.phase, TurnPhase::Actions);
        assert_eq!(turn.actions_remaining, 4);
        assert!(turn.are_actions_executable());
    }

    #[test]
    fn test_budget_strictly_decreases() {
        let mut turn = PlayerTurn::new(0, 4, 2);
        for expected in (0..4).rev() {
            turn.spend_action();
            assert_eq!(turn.actions_remaining, expected);
        }
        assert!(!turn.are_actions_executable());
        assert_eq!(turn.phase, TurnPhase::CardDraw);
    }

    #[test]
    fn test_last_action_releases_card_draw() {
        let mut turn = PlayerTurn::new(1, 2, 2);
        assert!(!turn.spend_action());
        assert!(turn.spend_action());
        assert_eq!(turn.phase, TurnPhase::CardDraw);
    }

    #[test]
    fn test_pending_discard_blocks_infection_phase() {
        let mut turn = PlayerTurn::new(0, 1, 1);
        turn.spend_action();
        turn.record_card_draw();
        turn.discard_required = true;

        assert!(!turn.try_enter_infection_phase(2));
        assert_eq!(turn.phase, TurnPhase::CardDraw);

        turn.discard_required = false;
        assert!(turn.try_enter_infection_phase(2));
        assert_eq!(turn.phase, TurnPhase::Infection);
        assert_eq!(turn.infection_draws_remaining, 2);
    }

    #[test]
    fn test_infection_draws_complete_turn() {
        let mut turn = PlayerTurn::new(0, 1, 1);
        turn.spend_action();
        turn.record_card_draw();
        turn.try_enter_infection_phase(2);

        assert!(!turn.record_infection_draw());
        assert!(turn.record_infection_draw());
        assert_eq!(turn.phase, TurnPhase::Complete);
    }
}
