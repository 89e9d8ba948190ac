//! Event vocabulary for Gauntlet rooms.
//!
//! This crate defines the "language" spoken between the simulation, the
//! room orchestrator, and the level:
//!
//! - **Types** ([`ObjectId`], [`Position`], [`ObjectClass`], [`ObjectType`],
//!   [`Stats`], [`ActorAttributes`]): the values events carry.
//! - **Events** ([`Event`]): the closed set of room events, plus an
//!   [`Event::Opaque`] escape hatch for tags nobody here understands.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become bytes
//!   for traces.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Simulation ──raw events──→ Orchestrator ──forwarded events──→ Level
//! ```

mod codec;
mod error;
mod event;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use event::{Event, TileGrid};
pub use types::{
    ActorAttributes, Attribute, AttributeValue, Decoration, ObjectClass, ObjectId,
    ObjectType, Position, Stats,
};
