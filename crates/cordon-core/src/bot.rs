//! Bot players for Cordon.
//!
//! This module provides different difficulty levels of bot players:
//! - Easy: Random legal actions
//! - Medium: Basic heuristics (treat local cubes, cure when possible)
//! - Hard: Targeted containment (chase the heaviest infections, place labs)

use crate::actions::Action;
use crate::approvals::{Approval, ApprovalStatus};
use crate::board::{FieldId, PlayerId};
use crate::cards::PlayerCard;
use crate::game::Game;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Bot difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotDifficulty {
    Easy,
    Medium,
    Hard,
}

/// A bot player that can decide on actions
pub struct Bot {
    pub player_id: PlayerId,
    pub difficulty: BotDifficulty,
    rng: StdRng,
}

impl Bot {
    pub fn new(player_id: PlayerId, difficulty: BotDifficulty) -> Self {
        Self {
            player_id,
            difficulty,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(player_id: PlayerId, difficulty: BotDifficulty, seed: u64) -> Self {
        Self {
            player_id,
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose an action from the legal actions
    pub fn choose_action(&mut self, game: &Game) -> Option<Action> {
        let legal = game.legal_actions(self.player_id);
        if legal.is_empty() {
            return None;
        }

        match self.difficulty {
            BotDifficulty::Easy => self.choose_easy(&legal),
            BotDifficulty::Medium => self.choose_medium(game, &legal),
            BotDifficulty::Hard => self.choose_hard(game, &legal),
        }
    }

    /// Decide a pending approval addressed to this bot. Moves that land the
    /// bot on an infected field get approved; pointless shuffling is
    /// rejected.
    pub fn respond_approval(&mut self, game: &Game, approval: &Approval) -> ApprovalStatus {
        if let Action::MoveAlly { destination, .. } = approval.action {
            let helps = field_cubes(game, destination) > 0
                || game
                    .board
                    .field(destination)
                    .map(|f| f.has_research_lab)
                    .unwrap_or(false);
            if helps || self.rng.gen_bool(0.5) {
                return ApprovalStatus::Approved;
            }
        }
        ApprovalStatus::Rejected
    }

    /// Easy: Just pick a random legal action
    fn choose_easy(&mut self, actions: &[Action]) -> Option<Action> {
        actions.choose(&mut self.rng).cloned()
    }

    /// Medium: Use basic heuristics
    fn choose_medium(&mut self, game: &Game, actions: &[Action]) -> Option<Action> {
        // Priority order for medium bot:
        // 1. Resolve forced discards
        // 2. Discover an antidote if the cards are there
        // 3. Treat cubes on the current field
        // 4. Move toward infected neighbors
        // 5. Anything else

        if let Some(action) = self.choose_discard(game, actions) {
            return Some(action);
        }

        let antidotes: Vec<_> = actions
            .iter()
            .filter(|a| matches!(a, Action::DiscoverAntidote { .. }))
            .collect();
        if let Some(action) = antidotes.choose(&mut self.rng) {
            return Some((*action).clone());
        }

        let treats: Vec<_> = actions
            .iter()
            .filter(|a| matches!(a, Action::CurePlague { .. }))
            .collect();
        if let Some(action) = treats.choose(&mut self.rng) {
            return Some((*action).clone());
        }

        let moves: Vec<_> = actions
            .iter()
            .filter_map(|a| match a {
                Action::Move { destination, .. } => Some((a, field_cubes(game, *destination))),
                _ => None,
            })
            .filter(|(_, cubes)| *cubes > 0)
            .collect();
        if let Some((action, _)) = moves.iter().max_by_key(|(_, cubes)| *cubes) {
            return Some((*action).clone());
        }

        actions.choose(&mut self.rng).cloned()
    }

    /// Hard: Targeted containment
    fn choose_hard(&mut self, game: &Game, actions: &[Action]) -> Option<Action> {
        // Hard bot refines the medium priorities:
        // - Antidotes always come first
        // - Treats prefer the color with the tallest local stack
        // - Labs get built when the hand allows it
        // - Moves chase the heaviest reachable infection

        if let Some(action) = self.choose_discard(game, actions) {
            return Some(action);
        }

        if let Some(action) = actions
            .iter()
            .find(|a| matches!(a, Action::DiscoverAntidote { .. }))
        {
            return Some(action.clone());
        }

        let best_treat = actions
            .iter()
            .filter_map(|a| match a {
                Action::CurePlague { color } => {
                    let at = game.player(self.player_id)?.field;
                    let stack = game.board.field(at)?.cubes.get(*color);
                    Some((a, stack))
                }
                _ => None,
            })
            .max_by_key(|(_, stack)| *stack);
        if let Some((action, _)) = best_treat {
            return Some(action.clone());
        }

        // A lab extends antidote and shuttle reach
        if let Some(action) = actions
            .iter()
            .find(|a| matches!(a, Action::BuildResearchLaboratory { relocate_from: None }))
        {
            return Some(action.clone());
        }

        let best_move = actions
            .iter()
            .filter_map(|a| match a {
                Action::Move { destination, .. } => Some((a, field_cubes(game, *destination))),
                _ => None,
            })
            .max_by_key(|(_, cubes)| *cubes);
        if let Some((action, cubes)) = best_move {
            if cubes > 0 {
                return Some(action.clone());
            }
        }

        actions.choose(&mut self.rng).cloned()
    }

    /// Resolve a forced discard by keeping the colors the hand is deepest
    /// in; the shallowest color's card goes first
    fn choose_discard(&mut self, game: &Game, actions: &[Action]) -> Option<Action> {
        let discards: Vec<_> = actions
            .iter()
            .filter_map(|a| match a {
                Action::DiscardCard { card } => Some((a, *card)),
                _ => None,
            })
            .collect();
        if discards.is_empty() {
            return None;
        }

        let player = game.player(self.player_id)?;
        let depth = |card: PlayerCard| -> usize {
            match card.field().and_then(|f| game.board.field(f)) {
                Some(field) => player.city_cards_of_color(&game.board, field.color).len(),
                // Epidemics never sit in hands; anything unrecognized goes first
                None => 0,
            }
        };

        discards
            .iter()
            .min_by_key(|(_, card)| depth(*card))
            .map(|(a, _)| (*a).clone())
    }
}

fn field_cubes(game: &Game, field: FieldId) -> u32 {
    game.board
        .field(field)
        .map(|f| f.cubes.total())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::MoveKind;
    use crate::board::{MapType, PlagueColor};
    use crate::config::RuleConfig;
    use crate::player::PlayerKind;

    fn test_game() -> Game {
        let mut rng = StdRng::seed_from_u64(42);
        let config = RuleConfig {
            epidemic_cards: 0,
            initial_infections: vec![],
            ..RuleConfig::default()
        };
        let mut game = Game::new_with_rng(
            config,
            MapType::World,
            PlagueColor::ALL.to_vec(),
            vec![
                ("Bot".to_string(), PlayerKind::Bot(BotDifficulty::Easy)),
                ("Human".to_string(), PlayerKind::Human),
            ],
            &mut rng,
        )
        .unwrap();
        // Generalists have no special availabilities to trip over
        game.players[0].role = crate::roles::Role::Generalist;
        game.players[1].role = crate::roles::Role::Scientist;
        game
    }

    #[test]
    fn test_bot_creation() {
        let bot = Bot::new(0, BotDifficulty::Easy);
        assert_eq!(bot.player_id, 0);
        assert_eq!(bot.difficulty, BotDifficulty::Easy);
    }

    #[test]
    fn test_easy_bot_chooses_legal_action() {
        let game = test_game();
        let mut bot = Bot::with_seed(0, BotDifficulty::Easy, 7);

        let action = bot.choose_action(&game).unwrap();
        assert!(game.legal_actions(0).contains(&action));
    }

    #[test]
    fn test_bot_off_turn_has_no_action() {
        let game = test_game();
        let mut bot = Bot::new(1, BotDifficulty::Medium);
        assert!(bot.choose_action(&game).is_none());
    }

    #[test]
    fn test_medium_bot_treats_local_cubes() {
        let mut game = test_game();
        let at = game.players[0].field;
        game.board
            .field_mut(at)
            .unwrap()
            .cubes
            .add(PlagueColor::Blue, 2);

        let mut bot = Bot::with_seed(0, BotDifficulty::Medium, 7);
        let action = bot.choose_action(&game).unwrap();
        assert!(matches!(action, Action::CurePlague { .. }));
    }

    #[test]
    fn test_hard_bot_chases_infection() {
        let mut game = test_game();
        let at = game.players[0].field;
        let neighbor = game.board.neighbors(at)[0];
        game.board
            .field_mut(neighbor)
            .unwrap()
            .cubes
            .add(PlagueColor::Blue, 3);

        let mut bot = Bot::with_seed(0, BotDifficulty::Hard, 7);
        let action = bot.choose_action(&game).unwrap();
        assert_eq!(
            action,
            Action::Move {
                kind: MoveKind::Car,
                destination: neighbor,
            }
        );
    }

    #[test]
    fn test_bot_approves_useful_ally_move() {
        let game = test_game();
        let mut bot = Bot::with_seed(1, BotDifficulty::Hard, 7);

        // The start field has a lab, so moving there is always useful
        let approval = Approval::new(
            Action::MoveAlly {
                kind: MoveKind::Car,
                ally: 1,
                destination: game.board.start_field(),
            },
            0,
            1,
        );
        assert_eq!(
            bot.respond_approval(&game, &approval),
            ApprovalStatus::Approved
        );
    }
}
