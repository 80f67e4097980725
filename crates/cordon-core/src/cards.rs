//! Card subsystem: the player deck and the infection deck.
//!
//! Both decks are ordered stacks with draw-from-top / discard-to-top
//! semantics (`Vec` tail is the top). The player deck mixes epidemic cards
//! into near-equal sub-piles after initial hands are dealt; the infection
//! deck supports the epidemic's bottom draw and discard reshuffle.

use crate::board::{Board, FieldId};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A card in the player deck or a player's hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerCard {
    /// City card, tied to exactly one field; its color is the field's color
    City(FieldId),
    /// Epidemic card, resolved immediately when drawn
    Epidemic,
}

impl PlayerCard {
    /// The field a city card refers to
    pub fn field(&self) -> Option<FieldId> {
        match self {
            PlayerCard::City(f) => Some(*f),
            PlayerCard::Epidemic => None,
        }
    }
}

/// A card in the infection deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfectionCard {
    /// The field this card infects
    pub field: FieldId,
}

/// Player-card draw and discard stacks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDeck {
    /// Draw stack; last element is the top
    pub draw: Vec<PlayerCard>,
    /// Discard stack; last element is the top
    pub discard: Vec<PlayerCard>,
}

impl PlayerDeck {
    /// One shuffled city card per field
    pub fn shuffled_city_cards<R: Rng>(board: &Board, rng: &mut R) -> Vec<PlayerCard> {
        let mut cards: Vec<PlayerCard> =
            (0..board.field_count()).map(PlayerCard::City).collect();
        cards.shuffle(rng);
        cards
    }

    /// Build the draw stack from the city cards left after dealing hands:
    /// split into `epidemic_cards` near-equal piles, shuffle one epidemic
    /// into each, then stack the piles.
    pub fn build<R: Rng>(remainder: Vec<PlayerCard>, epidemic_cards: usize, rng: &mut R) -> Self {
        if epidemic_cards == 0 {
            return Self {
                draw: remainder,
                discard: Vec::new(),
            };
        }

        let pile_count = epidemic_cards.min(remainder.len().max(1));
        let base = remainder.len() / pile_count;
        let extra = remainder.len() % pile_count;

        let mut draw = Vec::with_capacity(remainder.len() + epidemic_cards);
        let mut rest = remainder;
        for i in 0..pile_count {
            let size = base + usize::from(i < extra);
            let mut pile: Vec<PlayerCard> = rest.drain(..size).collect();
            pile.push(PlayerCard::Epidemic);
            pile.shuffle(rng);
            draw.extend(pile);
        }

        Self {
            draw,
            discard: Vec::new(),
        }
    }

    /// Draw from the top; `None` means the stack is exhausted (a loss
    /// condition handled by the caller, not an error)
    pub fn draw(&mut self) -> Option<PlayerCard> {
        self.draw.pop()
    }

    /// Discard to the top of the discard pile
    pub fn discard(&mut self, card: PlayerCard) {
        self.discard.push(card);
    }

    /// Cards left in the draw stack
    pub fn remaining(&self) -> usize {
        self.draw.len()
    }
}

/// Infection-card draw and discard stacks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfectionDeck {
    /// Draw stack; last element is the top
    pub draw: Vec<InfectionCard>,
    /// Discard stack; last element is the top
    pub discard: Vec<InfectionCard>,
}

impl InfectionDeck {
    /// One shuffled infection card per field
    pub fn new<R: Rng>(board: &Board, rng: &mut R) -> Self {
        let mut draw: Vec<InfectionCard> = (0..board.field_count())
            .map(|field| InfectionCard { field })
            .collect();
        draw.shuffle(rng);
        Self {
            draw,
            discard: Vec::new(),
        }
    }

    /// Draw from the top
    pub fn draw(&mut self) -> Option<InfectionCard> {
        self.draw.pop()
    }

    /// Take the bottom card (the epidemic's infection target)
    pub fn draw_bottom(&mut self) -> Option<InfectionCard> {
        if self.draw.is_empty() {
            None
        } else {
            Some(self.draw.remove(0))
        }
    }

    /// Discard to the top of the discard pile
    pub fn discard(&mut self, card: InfectionCard) {
        self.discard.push(card);
    }

    /// Epidemic reshuffle: shuffle the discard pile and place it on top of
    /// the remaining (unshuffled) draw stack
    pub fn reshuffle_discard_on_top<R: Rng>(&mut self, rng: &mut R) {
        self.discard.shuffle(rng);
        self.draw.append(&mut self.discard);
    }

    /// Cards left in the draw stack
    pub fn remaining(&self) -> usize {
        self.draw.len()
    }
}
