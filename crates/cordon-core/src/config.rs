//! Rule configuration threaded through game construction.
//!
//! Every tunable the engine consults lives here; there is no global state.
//! `RuleConfig::default()` matches the classic rule set.

use serde::{Deserialize, Serialize};

/// All rule parameters for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Maximum cards a player may hold at the end of a draw
    pub max_hand_cards: usize,
    /// Plague cubes in the supply per color
    pub cubes_per_color: u32,
    /// Maximum research laboratories on the board at once
    pub max_research_labs: u32,
    /// Epidemic cards mixed into the player deck
    pub epidemic_cards: usize,
    /// Cubes placed per infection card during initial setup,
    /// one entry per card drawn (e.g. `[3, 3, 3, 2, 2, 2, 1, 1, 1]`)
    pub initial_infections: Vec<u8>,
    /// Maximum cubes of a single color on one field
    pub max_cubes_per_field: u8,
    /// Actions per turn before role bonuses
    pub actions_per_turn: u32,
    /// Player cards drawn per turn
    pub player_card_draws: u32,
    /// Infection cards drawn per turn, indexed by the infection-level marker
    pub infection_track: Vec<u32>,
    /// Outbreak count at which the game is lost
    pub max_outbreaks: u32,
    /// City cards of one color needed to discover its antidote
    pub antidote_cards_required: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            max_hand_cards: 7,
            cubes_per_color: 24,
            max_research_labs: 6,
            epidemic_cards: 4,
            initial_infections: vec![3, 3, 3, 2, 2, 2, 1, 1, 1],
            max_cubes_per_field: 3,
            actions_per_turn: 4,
            player_card_draws: 2,
            infection_track: vec![2, 2, 2, 3, 3, 4, 4],
            max_outbreaks: 8,
            antidote_cards_required: 5,
        }
    }
}

impl RuleConfig {
    /// Infection cards drawn per turn at the given marker level.
    ///
    /// Levels past the end of the track clamp to the last entry; the
    /// loss check for running off the track happens before this is read.
    pub fn infection_rate(&self, level: usize) -> u32 {
        self.infection_track
            .get(level)
            .or_else(|| self.infection_track.last())
            .copied()
            .unwrap_or(0)
    }

    /// Whether the given marker level is past the end of the track.
    pub fn infection_level_exceeded(&self, level: usize) -> bool {
        level >= self.infection_track.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_track_length() {
        let config = RuleConfig::default();
        assert_eq!(config.infection_track.len(), 7);
        assert_eq!(config.infection_rate(0), 2);
        assert_eq!(config.infection_rate(6), 4);
    }

    #[test]
    fn test_infection_rate_clamps() {
        let config = RuleConfig::default();
        assert_eq!(config.infection_rate(100), 4);
    }

    #[test]
    fn test_level_exceeded() {
        let config = RuleConfig::default();
        assert!(!config.infection_level_exceeded(6));
        assert!(config.infection_level_exceeded(7));
    }
}
