//! Room orchestration for Gauntlet.
//!
//! A room is driven by one [`RoomOrchestrator`]. It owns the room's
//! shadow [`Registry`] of tracked objects, turns raw simulation events
//! into registry mutations plus derived events, and forwards everything
//! it processed to the bound [`Level`].
//!
//! # Key types
//!
//! - [`RoomOrchestrator`]: lifecycle (`bind`, `start`, `update`) and event routing
//! - [`Registry`] / [`TrackedGameObject`]: the shadow object registry
//! - [`resolve`]: the collision rules
//! - [`Area`] / [`Level`]: the collaborators the orchestrator talks to
//! - [`Dungeon`]: the stack of rooms a game plays through
//! - [`RulesConfig`]: scoring and map constants

mod collaborator;
mod config;
mod dungeon;
mod error;
mod orchestrator;
mod registry;
mod resolver;

pub use collaborator::{Area, Level, ObjectPlacement, Player, RoomMap};
pub use config::{
    OrchestratorState, RulesConfig, POINTS_PER_DOOR, POINTS_PER_KEY, POINTS_PER_LEVEL,
    TILE_SIZE,
};
pub use dungeon::{Dungeon, RoomDefinition};
pub use error::RoomError;
pub use orchestrator::RoomOrchestrator;
pub use registry::{Registry, TrackedGameObject};
pub use resolver::{resolve, EXIT_STATE};
