//! Unified error type for the Gauntlet runtime.

use gauntlet_protocol::ProtocolError;
use gauntlet_room::RoomError;

use crate::game::GameError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GauntletError {
    /// An encoding or attribute-type error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (unknown object, lifecycle misuse).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A game state machine error.
    #[error(transparent)]
    Game(#[from] GameError),
}
