//! The orchestrator's collaborators: where a room comes from ([`Area`])
//! and who mirrors it for the player ([`Level`]).
//!
//! Both are traits so the orchestrator can be driven by a real game, a
//! headless simulation, or a test double.

use gauntlet_protocol::{ActorAttributes, Event, ObjectId, ObjectType, TileGrid};
use serde::{Deserialize, Serialize};

/// Static description of a room's map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMap {
    pub name: String,
    pub author: String,
    pub tiles: TileGrid,
}

/// A static object placed on the map at tile coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectPlacement {
    pub id: ObjectId,
    pub kind: ObjectType,
    pub tile: (i32, i32),
}

impl ObjectPlacement {
    pub fn new(id: impl Into<ObjectId>, kind: ObjectType, tx: i32, ty: i32) -> Self {
        Self {
            id: id.into(),
            kind,
            tile: (tx, ty),
        }
    }
}

/// The controlling player, as the level knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub identifier: ObjectId,
    pub attributes: ActorAttributes,
    /// Name of the steering strategy that controls the player's hero.
    pub steer: String,
}

/// Source of a room: its map, objects and pre-placed actors.
///
/// Non-local events the orchestrator fires pass through [`Area::route`]
/// before they come back to the orchestrator's handler, which gives the
/// area a chance to rewrite or swallow them.
///
/// ## Ownership
///
/// The orchestrator takes the area by value and keeps it for its whole
/// life. That makes it the only caller of `route`, so an area never has to
/// guard against events arriving from somewhere else. `map`, `objects` and
/// `actors` return owned values because `start` may run more than once
/// (room re-entry) and each run spawns a fresh copy.
///
/// ## No thread bounds
///
/// There is no `Send` or `Sync` here. The orchestrator is driven from a
/// single frame loop and never crosses a thread, so an area is free to
/// hold `Rc` or `Cell` state. Test doubles in this crate do exactly that.
pub trait Area {
    fn map(&self) -> RoomMap;

    fn objects(&self) -> Vec<ObjectPlacement>;

    fn actors(&self) -> Vec<(ObjectId, ActorAttributes)>;

    /// Intercepts an outgoing event. Returning `None` vetoes it.
    /// Default: deliver unchanged.
    fn route(&mut self, event: Event) -> Option<Event> {
        Some(event)
    }

    /// Called once when the room is left without being replayed.
    fn abandon(&mut self) {}
}

/// Consumer of every event the orchestrator processed.
///
/// The level owns the authoritative, renderable room and applies each
/// forwarded event to it. It never touches the orchestrator's registry.
///
/// ## Contract
///
/// - Events arrive after the registry was updated, in the order they were
///   fired. A `kill_object` therefore reaches the level only once the
///   object is already gone from the registry.
/// - `collision` is never forwarded. The level sees the events a
///   collision produced instead.
/// - `event_handler` cannot fail. Anything the level cannot apply (an
///   unknown id, an `opaque` event it does not understand) is its own
///   business to ignore.
///
/// The level outlives a single room: [`RoomOrchestrator::abandon`]
/// hands it back so the next room can bind it again.
///
/// [`RoomOrchestrator::abandon`]: crate::RoomOrchestrator::abandon
pub trait Level {
    /// The player whose hero is spawned last on every `start`.
    fn player(&self) -> &Player;

    fn event_handler(&mut self, event: &Event);
}
