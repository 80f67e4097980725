//! Game and lobby registry.
//!
//! Identity-keyed storage shared across all connections. Games are stored
//! as worker handles, never as bare state: all mutation goes through the
//! owning worker task. Domain invariant violations (duplicate registration,
//! unknown ids, emptying a lobby) surface as `RegistryError`.

use crate::lobby::Lobby;
use crate::service::GameHandle;
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Game is already registered")]
    DuplicateGame,

    #[error("Unknown game")]
    UnknownGame,

    #[error("Lobby is already registered")]
    DuplicateLobby,

    #[error("Unknown lobby")]
    UnknownLobby,

    #[error("No such member in the lobby")]
    UnknownMember,

    #[error("A lobby cannot be left with no members")]
    EmptyLobby,
}

/// Registry of lobbies and running games.
#[derive(Default)]
pub struct Registry {
    lobbies: DashMap<Uuid, Lobby>,
    games: DashMap<Uuid, GameHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_lobby(&self, lobby: Lobby) -> Result<(), RegistryError> {
        if self.lobbies.contains_key(&lobby.id) {
            return Err(RegistryError::DuplicateLobby);
        }
        self.lobbies.insert(lobby.id, lobby);
        Ok(())
    }

    pub fn lobby(&self, id: Uuid) -> Result<Lobby, RegistryError> {
        self.lobbies
            .get(&id)
            .map(|l| l.clone())
            .ok_or(RegistryError::UnknownLobby)
    }

    /// Remove one named member. Removing the last member is a domain
    /// error: empty lobbies are deleted with `remove_lobby`, never drained.
    pub fn leave_lobby(&self, id: Uuid, name: &str) -> Result<(), RegistryError> {
        let mut lobby = self.lobbies.get_mut(&id).ok_or(RegistryError::UnknownLobby)?;
        if !lobby.has_member(name) {
            return Err(RegistryError::UnknownMember);
        }
        if lobby.member_count() == 1 {
            return Err(RegistryError::EmptyLobby);
        }
        lobby.members.retain(|m| m.name != name);
        Ok(())
    }

    pub fn remove_lobby(&self, id: Uuid) -> Result<Lobby, RegistryError> {
        self.lobbies
            .remove(&id)
            .map(|(_, l)| l)
            .ok_or(RegistryError::UnknownLobby)
    }

    pub fn insert_game(&self, handle: GameHandle) -> Result<(), RegistryError> {
        if self.games.contains_key(&handle.id) {
            return Err(RegistryError::DuplicateGame);
        }
        self.games.insert(handle.id, handle);
        Ok(())
    }

    pub fn game(&self, id: Uuid) -> Result<GameHandle, RegistryError> {
        self.games
            .get(&id)
            .map(|h| h.clone())
            .ok_or(RegistryError::UnknownGame)
    }

    /// Remove a game; dropping the last handle shuts its worker down
    pub fn remove_game(&self, id: Uuid) -> Result<GameHandle, RegistryError> {
        self.games
            .remove(&id)
            .map(|(_, h)| h)
            .ok_or(RegistryError::UnknownGame)
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lobby::LobbyMember;
    use cordon_core::PlayerKind;

    fn test_lobby() -> Lobby {
        Lobby::new(vec![
            LobbyMember {
                name: "Ada".to_string(),
                kind: PlayerKind::Human,
            },
            LobbyMember {
                name: "Ben".to_string(),
                kind: PlayerKind::Human,
            },
        ])
    }

    #[test]
    fn test_duplicate_lobby_rejected() {
        let registry = Registry::new();
        let lobby = test_lobby();
        let id = lobby.id;

        registry.insert_lobby(lobby.clone()).unwrap();
        assert_eq!(
            registry.insert_lobby(lobby),
            Err(RegistryError::DuplicateLobby)
        );
        assert!(registry.lobby(id).is_ok());
    }

    #[test]
    fn test_unknown_ids_rejected() {
        let registry = Registry::new();
        assert_eq!(
            registry.lobby(Uuid::new_v4()).unwrap_err(),
            RegistryError::UnknownLobby
        );
        assert_eq!(
            registry.game(Uuid::new_v4()).unwrap_err(),
            RegistryError::UnknownGame
        );
        assert_eq!(
            registry.remove_lobby(Uuid::new_v4()).unwrap_err(),
            RegistryError::UnknownLobby
        );
    }

    #[test]
    fn test_leaving_requires_a_seated_member() {
        let registry = Registry::new();
        let lobby = test_lobby();
        let id = lobby.id;
        registry.insert_lobby(lobby).unwrap();

        assert_eq!(
            registry.leave_lobby(id, "Cara"),
            Err(RegistryError::UnknownMember)
        );
        assert_eq!(registry.lobby(id).unwrap().member_count(), 2);
    }

    #[test]
    fn test_lobby_cannot_be_drained() {
        let registry = Registry::new();
        let lobby = test_lobby();
        let id = lobby.id;
        registry.insert_lobby(lobby).unwrap();

        registry.leave_lobby(id, "Ben").unwrap();
        assert_eq!(
            registry.leave_lobby(id, "Ada"),
            Err(RegistryError::EmptyLobby)
        );
        assert_eq!(registry.lobby(id).unwrap().member_count(), 1);
    }
}
