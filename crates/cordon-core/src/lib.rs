//! Cordon - a cooperative outbreak-containment game engine
//!
//! This crate provides the core game logic for Cordon, including:
//! - City graph boards with per-field plague cube stacks
//! - Player, role, and hand management
//! - The action/approval/trigger protocol
//! - Turn state machine with full rule enforcement
//!
//! # Architecture
//!
//! The engine is pure state transformation: every operation validates,
//! then applies, then reports what happened as a list of [`GameEvent`]s.
//! It performs no I/O of its own; `cordon-service` hosts games behind a
//! request/response boundary.
//!
//! # Modules
//!
//! - [`board`]: City graph, plague colors, and cube stacks
//! - [`cards`]: Player and infection decks
//! - [`actions`]: Player actions and their validation
//! - [`approvals`]: Ally approvals and role triggers
//! - [`turn`]: The per-turn phase machine
//! - [`game`]: The game aggregate tying it all together
//! - [`bot`]: Bot players at three difficulty levels

pub mod actions;
pub mod approvals;
pub mod board;
pub mod bot;
pub mod cards;
pub mod config;
pub mod game;
pub mod player;
pub mod roles;
pub mod turn;

// Re-export commonly used types
pub use actions::{legal_actions, Action, MoveKind};
pub use approvals::{Approval, ApprovalStatus, Trigger, TriggerKind};
pub use board::{Board, CubeSet, Field, FieldId, MapType, PlagueColor, PlayerId};
pub use bot::{Bot, BotDifficulty};
pub use cards::{InfectionCard, InfectionDeck, PlayerCard, PlayerDeck};
pub use config::RuleConfig;
pub use game::{Game, GameError, GameEvent, LossReason, PlagueStatus};
pub use player::{Player, PlayerKind};
pub use roles::Role;
pub use turn::{PlayerTurn, TurnPhase};
