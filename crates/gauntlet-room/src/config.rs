//! Rules configuration and the orchestrator state machine.

use std::collections::BTreeSet;

use gauntlet_protocol::{ObjectClass, ObjectType};
use serde::{Deserialize, Serialize};

/// Score for picking up a key.
pub const POINTS_PER_KEY: i64 = 100;
/// Score for opening a door.
pub const POINTS_PER_DOOR: i64 = 50;
/// Score for reaching the exit of a room.
pub const POINTS_PER_LEVEL: i64 = 1000;
/// Edge length of a map tile, in pixels.
pub const TILE_SIZE: i32 = 8;

// ---------------------------------------------------------------------------
// RulesConfig
// ---------------------------------------------------------------------------

/// Scoring and map constants used by the orchestrator and the collision
/// rules.
///
/// Missing fields in a rules file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub points_per_key: i64,
    pub points_per_door: i64,
    pub points_per_level: i64,

    /// Pixel size of a tile; converts map coordinates to world positions.
    pub tile_size: i32,

    /// Object tags classified as doors. Every other static object is an item.
    pub door_types: BTreeSet<ObjectType>,

    /// How many random draws to try when picking a non-zero offset around
    /// a teleport before falling back to a direct pick.
    pub teleport_offset_attempts: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            points_per_key: POINTS_PER_KEY,
            points_per_door: POINTS_PER_DOOR,
            points_per_level: POINTS_PER_LEVEL,
            tile_size: TILE_SIZE,
            door_types: [
                ObjectType::from_tag("door_horizontal"),
                ObjectType::from_tag("door_vertical"),
            ]
            .into_iter()
            .collect(),
            teleport_offset_attempts: 16,
        }
    }
}

impl RulesConfig {
    /// Fixes values that would break tile math.
    ///
    /// `tile_size` must be positive; anything else is reset to
    /// [`TILE_SIZE`].
    pub fn validated(mut self) -> Self {
        if self.tile_size <= 0 {
            tracing::warn!(
                tile_size = self.tile_size,
                default = TILE_SIZE,
                "tile_size must be positive, using default"
            );
            self.tile_size = TILE_SIZE;
        }
        self
    }

    /// Class of a static map object: door if its tag is listed in
    /// `door_types`, item otherwise.
    pub fn classify(&self, kind: &ObjectType) -> ObjectClass {
        if self.door_types.contains(kind) {
            ObjectClass::Door
        } else {
            ObjectClass::Item
        }
    }
}

// ---------------------------------------------------------------------------
// OrchestratorState
// ---------------------------------------------------------------------------

/// Lifecycle of a [`RoomOrchestrator`](crate::RoomOrchestrator).
///
/// ```text
/// Unbound → Bound → Running → Discarded
/// ```
///
/// - **Unbound**: constructed with its area, no level or identifier yet.
/// - **Bound**: level and identifier assigned. Irreversible.
/// - **Running**: `start` populated the registry. `start` may run again
///   (room re-entry) and stays in this state.
/// - **Discarded**: the room was abandoned. `abandon` consumes the
///   orchestrator, so no live value ever holds this state; it names the
///   end of the lifecycle in the `room abandoned` log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestratorState {
    Unbound,
    Bound,
    Running,
    Discarded,
}

impl OrchestratorState {
    /// Returns `true` once a level is attached.
    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound | Self::Running)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// The next state in the lifecycle, `None` at the end.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Unbound => Some(Self::Bound),
            Self::Bound => Some(Self::Running),
            Self::Running => Some(Self::Discarded),
            Self::Discarded => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unbound => write!(f, "Unbound"),
            Self::Bound => write!(f, "Bound"),
            Self::Running => write!(f, "Running"),
            Self::Discarded => write!(f, "Discarded"),
        }
    }
}
