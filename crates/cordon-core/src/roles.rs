//! Role cards and their rule modifiers.
//!
//! Roles never appear as special cases inside action execution; instead each
//! modifier is a method consulted where the base rule applies (action budget,
//! antidote cost, treat strength, ally moves, laboratory flights).

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Role card assigned to each player at game start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Treating removes every cube of that color; cured plagues are
    /// swept automatically when the doctor enters a field
    Doctor,
    /// Needs one fewer city card to discover an antidote
    Scientist,
    /// May move other players' pawns (with their approval)
    Logistician,
    /// Once per turn, may fly from a laboratory to any field by
    /// discarding any city card
    OperationsExpert,
    /// One extra action per turn
    Generalist,
}

impl Role {
    /// All roles, in deal order before shuffling
    pub const ALL: [Role; 5] = [
        Role::Doctor,
        Role::Scientist,
        Role::Logistician,
        Role::OperationsExpert,
        Role::Generalist,
    ];

    /// Deal one distinct role per player
    pub fn deal<R: Rng>(count: usize, rng: &mut R) -> Vec<Role> {
        let mut deck = Role::ALL.to_vec();
        deck.shuffle(rng);
        deck.truncate(count);
        deck
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Role::Doctor => "Doctor",
            Role::Scientist => "Scientist",
            Role::Logistician => "Logistician",
            Role::OperationsExpert => "Operations Expert",
            Role::Generalist => "Generalist",
        }
    }

    /// Extra actions granted on top of the configured budget
    pub fn action_bonus(&self) -> u32 {
        match self {
            Role::Generalist => 1,
            _ => 0,
        }
    }

    /// City cards needed to discover an antidote, given the configured base
    pub fn antidote_cards_required(&self, base: usize) -> usize {
        match self {
            Role::Scientist => base.saturating_sub(1).max(1),
            _ => base,
        }
    }

    /// Whether treating removes the whole stack of a color
    pub fn treats_all_cubes(&self) -> bool {
        matches!(self, Role::Doctor)
    }

    /// Whether this role may move other players' pawns
    pub fn can_move_allies(&self) -> bool {
        matches!(self, Role::Logistician)
    }

    /// Whether this role has the laboratory flight trigger
    pub fn has_operations_flight(&self) -> bool {
        matches!(self, Role::OperationsExpert)
    }
}
