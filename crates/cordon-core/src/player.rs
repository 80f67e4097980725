//! Player state: identity, pawn position, hand, and role.

use crate::board::{FieldId, PlayerId};
use crate::bot::BotDifficulty;
use crate::cards::PlayerCard;
use crate::roles::Role;
use serde::{Deserialize, Serialize};

/// What drives a player's decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerKind {
    Human,
    Bot(BotDifficulty),
}

/// A single player's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Player ID (0-3)
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Human or bot backed
    pub kind: PlayerKind,
    /// Role card dealt at game start
    pub role: Role,
    /// The field this player's pawn stands on
    pub field: FieldId,
    /// Hand of player cards
    pub hand: Vec<PlayerCard>,
    /// Set when the player abandons the game
    pub has_left: bool,
}

impl Player {
    /// Create a player at the given start field
    pub fn new(id: PlayerId, name: String, kind: PlayerKind, role: Role, field: FieldId) -> Self {
        Self {
            id,
            name,
            kind,
            role,
            field,
            hand: Vec::new(),
            has_left: false,
        }
    }

    /// Number of cards in hand
    pub fn hand_size(&self) -> usize {
        self.hand.len()
    }

    /// Whether the hand holds the city card for a field
    pub fn has_city_card(&self, field: FieldId) -> bool {
        self.hand.contains(&PlayerCard::City(field))
    }

    /// Remove an exact card from the hand, if held
    pub fn remove_card(&mut self, card: PlayerCard) -> Option<PlayerCard> {
        let pos = self.hand.iter().position(|c| *c == card)?;
        Some(self.hand.remove(pos))
    }

    /// City cards in hand referring to fields of the given color
    pub fn city_cards_of_color(
        &self,
        board: &crate::board::Board,
        color: crate::board::PlagueColor,
    ) -> Vec<FieldId> {
        self.hand
            .iter()
            .filter_map(|c| c.field())
            .filter(|&f| board.field(f).map(|fl| fl.color == color).unwrap_or(false))
            .collect()
    }

    /// How many cards over the hand limit this player is
    pub fn cards_over_limit(&self, max_hand_cards: usize) -> usize {
        self.hand.len().saturating_sub(max_hand_cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, MapType, PlagueColor};

    fn test_player() -> Player {
        Player::new(0, "Ada".to_string(), PlayerKind::Human, Role::Generalist, 0)
    }

    #[test]
    fn test_city_card_lookup() {
        let mut player = test_player();
        player.hand.push(PlayerCard::City(3));

        assert!(player.has_city_card(3));
        assert!(!player.has_city_card(4));

        let removed = player.remove_card(PlayerCard::City(3));
        assert_eq!(removed, Some(PlayerCard::City(3)));
        assert!(player.hand.is_empty());
        assert_eq!(player.remove_card(PlayerCard::City(3)), None);
    }

    #[test]
    fn test_cards_over_limit() {
        let mut player = test_player();
        for f in 0..9 {
            player.hand.push(PlayerCard::City(f));
        }
        assert_eq!(player.cards_over_limit(7), 2);
        assert_eq!(player.cards_over_limit(9), 0);
    }

    #[test]
    fn test_city_cards_of_color() {
        let board = Board::new(MapType::World);
        let mut player = test_player();
        // Fields 0-5 are blue on the world map
        player.hand.push(PlayerCard::City(0));
        player.hand.push(PlayerCard::City(1));
        player.hand.push(PlayerCard::City(6));
        player.hand.push(PlayerCard::Epidemic);

        let blue = player.city_cards_of_color(&board, PlagueColor::Blue);
        assert_eq!(blue, vec![0, 1]);
    }
}
