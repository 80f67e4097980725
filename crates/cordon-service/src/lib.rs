//! Cordon game service: the request/response boundary around the engine.
//!
//! Transport framing, authentication, and lobby formation mechanics live
//! elsewhere; this crate takes typed requests, routes them to the single
//! worker task owning each game, and returns the snapshot, events, and
//! directed notices the caller should deliver.
//!
//! # Modules
//!
//! - [`protocol`]: Request/response messages and directed notices
//! - [`lobby`]: The stored lobby entity games are created from
//! - [`store`]: Identity-keyed lobby/game registry with domain errors
//! - [`service`]: Game creation and per-game dispatch workers

pub mod lobby;
pub mod protocol;
pub mod service;
pub mod store;

pub use lobby::{Lobby, LobbyMember};
pub use protocol::{CreateGameRequest, EngineRequest, EngineResponse, Notice, Reply};
pub use service::{GameHandle, GameService, ServiceError};
pub use store::{Registry, RegistryError};
