//! Dungeon: the ordered stack of rooms a game plays through.

use gauntlet_protocol::{ActorAttributes, ObjectId};
use serde::{Deserialize, Serialize};

use crate::{Area, ObjectPlacement, RoomMap};

/// One room as loaded from a dungeon file: map plus its placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDefinition {
    pub map: RoomMap,
    #[serde(default)]
    pub objects: Vec<ObjectPlacement>,
    #[serde(default)]
    pub actors: Vec<(ObjectId, ActorAttributes)>,
}

impl Area for RoomDefinition {
    fn map(&self) -> RoomMap {
        self.map.clone()
    }

    fn objects(&self) -> Vec<ObjectPlacement> {
        self.objects.clone()
    }

    fn actors(&self) -> Vec<(ObjectId, ActorAttributes)> {
        self.actors.clone()
    }

    fn abandon(&mut self) {
        tracing::debug!(room = %self.map.name, "area abandoned");
    }
}

/// Rooms still to be played, plus the one currently being played.
///
/// The list is reversed once at load and popped from the tail, so rooms
/// come out in the order they were defined.
#[derive(Debug, Clone, Default)]
pub struct Dungeon {
    pending: Vec<RoomDefinition>,
    current: Option<String>,
    played: usize,
}

impl Dungeon {
    pub fn new(mut rooms: Vec<RoomDefinition>) -> Self {
        rooms.reverse();
        Self {
            pending: rooms,
            current: None,
            played: 0,
        }
    }

    /// Takes the next room to play, or `None` when the dungeon is done.
    pub fn next_area(&mut self) -> Option<RoomDefinition> {
        let room = self.pending.pop()?;
        tracing::info!(
            room = %room.map.name,
            remaining = self.pending.len(),
            "entering room"
        );
        self.current = Some(room.map.name.clone());
        self.played += 1;
        Some(room)
    }

    /// Marks the current room as left.
    pub fn abandon_area(&mut self) {
        if let Some(name) = self.current.take() {
            tracing::info!(room = %name, "leaving room");
        }
    }

    /// `true` once every room has been handed out.
    pub fn finished(&self) -> bool {
        self.pending.is_empty()
    }

    /// Name of the room being played, if any.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// How many rooms have been handed out so far.
    pub fn played(&self) -> usize {
        self.played
    }
}
