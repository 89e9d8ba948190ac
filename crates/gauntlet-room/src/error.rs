//! Error types for the room layer.

use gauntlet_protocol::{ObjectId, ProtocolError};

/// Errors that can occur while orchestrating a room.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// A mutation named an object the registry does not track. Spawn
    /// events are always applied before anything can refer to the object,
    /// so this means events arrived out of order.
    #[error("object {0} is not tracked in this room")]
    UnknownObject(ObjectId),

    /// The orchestrator already has a level and identifier.
    #[error("orchestrator is already bound to player {0}")]
    AlreadyBound(ObjectId),

    /// The orchestrator is in a state that doesn't allow this operation,
    /// e.g. `update` before `start`.
    #[error("invalid orchestrator state for this operation: {0}")]
    InvalidState(String),

    /// An attribute write was rejected.
    #[error(transparent)]
    Attribute(#[from] ProtocolError),
}
