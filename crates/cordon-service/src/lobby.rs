//! The stored lobby entity games are created from.

use cordon_core::PlayerKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One seat in a lobby.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyMember {
    pub name: String,
    pub kind: PlayerKind,
}

/// A group of players waiting to start a game.
///
/// Lobby formation mechanics (ready checks, hosts, chat) live outside this
/// service; a lobby here is just the member list `CreateGame` reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lobby {
    pub id: Uuid,
    pub members: Vec<LobbyMember>,
}

impl Lobby {
    pub fn new(members: Vec<LobbyMember>) -> Self {
        Self {
            id: Uuid::new_v4(),
            members,
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Whether a member with this name is seated
    pub fn has_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| m.name == name)
    }

    /// The `(name, kind)` pairs game construction expects, in seat order
    pub fn seats(&self) -> Vec<(String, PlayerKind)> {
        self.members
            .iter()
            .map(|m| (m.name.clone(), m.kind))
            .collect()
    }
}
