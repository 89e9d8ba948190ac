//! The shadow registry: a data-only mirror of every live object in a room.
//!
//! The registry is what the collision rules consult. It never renders or
//! simulates anything; the level keeps the authoritative room and both
//! sides stay in step because every change is an event applied to both.

use std::collections::BTreeMap;

use gauntlet_protocol::{ActorAttributes, ObjectClass, ObjectId, ObjectType, Position, Stats};

use crate::RoomError;

// ---------------------------------------------------------------------------
// TrackedGameObject
// ---------------------------------------------------------------------------

/// Data-only record of one live object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedGameObject {
    identifier: ObjectId,
    position: Position,
    class: Option<ObjectClass>,
    kind: ObjectType,
    state: String,
    stats: Stats,
}

impl TrackedGameObject {
    /// State every object starts in.
    pub const INITIAL_STATE: &'static str = "initial";

    /// Record for a spawned actor.
    pub fn actor(identifier: ObjectId, attributes: &ActorAttributes) -> Self {
        Self {
            identifier,
            position: attributes.position,
            class: attributes.class,
            kind: attributes.kind.clone(),
            state: Self::INITIAL_STATE.to_string(),
            stats: attributes.stats.clone(),
        }
    }

    /// Record for a static map object (item or door).
    pub fn object(
        identifier: ObjectId,
        kind: ObjectType,
        class: ObjectClass,
        position: Position,
    ) -> Self {
        Self {
            identifier,
            position,
            class: Some(class),
            kind,
            state: Self::INITIAL_STATE.to_string(),
            stats: Stats::default(),
        }
    }

    pub fn identifier(&self) -> &ObjectId {
        &self.identifier
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn class(&self) -> Option<ObjectClass> {
        self.class
    }

    pub fn kind(&self) -> &ObjectType {
        &self.kind
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn is_hero(&self) -> bool {
        self.class == Some(ObjectClass::Hero)
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn set_state(&mut self, state: impl Into<String>) {
        self.state = state.into();
    }

    pub fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Map from identifier to tracked record.
///
/// An identifier is present exactly while the object is live. Records are
/// kept ordered by identifier so that searches over the registry (nearest
/// teleport) break ties the same way on every run.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    objects: BTreeMap<ObjectId, TrackedGameObject>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record`, replacing any previous record with the same id.
    pub fn insert(&mut self, record: TrackedGameObject) -> Option<TrackedGameObject> {
        self.objects.insert(record.identifier.clone(), record)
    }

    /// Removes `id`. Absent ids are a no-op.
    pub fn remove(&mut self, id: &ObjectId) -> Option<TrackedGameObject> {
        self.objects.remove(id)
    }

    pub fn get(&self, id: &ObjectId) -> Option<&TrackedGameObject> {
        self.objects.get(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Applies `f` to the record for `id`. Returns `false` (and does
    /// nothing) if the id is not tracked.
    pub fn update(&mut self, id: &ObjectId, f: impl FnOnce(&mut TrackedGameObject)) -> bool {
        match self.objects.get_mut(id) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    /// Mutable access that treats a missing id as an ordering bug.
    ///
    /// # Errors
    /// [`RoomError::UnknownObject`] if `id` is not tracked.
    pub fn get_mut_strict(&mut self, id: &ObjectId) -> Result<&mut TrackedGameObject, RoomError> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| RoomError::UnknownObject(id.clone()))
    }

    /// All tracked objects of `kind`, skipping `exclude`.
    pub fn find_by_kind<'a>(
        &'a self,
        kind: &'a ObjectType,
        exclude: Option<&'a ObjectId>,
    ) -> impl Iterator<Item = &'a TrackedGameObject> + 'a {
        self.objects
            .values()
            .filter(move |o| &o.kind == kind && Some(&o.identifier) != exclude)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.objects.keys()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drops every record. Used when a room is (re)entered.
    pub fn clear(&mut self) {
        self.objects.clear();
    }
}
