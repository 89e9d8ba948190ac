//! Headless level: the authoritative room, without any rendering.
//!
//! The orchestrator forwards every processed event here and the level
//! applies it to its own copy of the room. Unlike the orchestrator's
//! registry, the level is lenient: an event naming an object it does not
//! know is ignored.
//!
//! Some effects originate in the level (opening a run of doors). Those are
//! queued as outbound events and fed back into the orchestrator by the
//! session, so both sides of the room change through the same path.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use gauntlet_protocol::{
    ActorAttributes, Attribute, AttributeValue, Decoration, Event, ObjectClass, ObjectId,
    ObjectType, Position, Stats, TileGrid,
};
use gauntlet_room::{Level, Player, RulesConfig};
use serde::{Deserialize, Serialize};

/// Steering used for every actor that is not the player.
pub const NPC_STEER: &str = "random";

// ---------------------------------------------------------------------------
// Room records
// ---------------------------------------------------------------------------

/// One live thing in the room: an actor or a static object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomObject {
    pub kind: ObjectType,
    pub class: Option<ObjectClass>,
    pub position: Position,
    pub state: String,
    pub stats: Stats,
    /// Steering strategy. `None` for static objects.
    pub steer: Option<String>,
}

impl RoomObject {
    fn actor(attributes: &ActorAttributes, steer: String) -> Self {
        Self {
            kind: attributes.kind.clone(),
            class: attributes.class,
            position: attributes.position,
            state: "initial".into(),
            stats: attributes.stats.clone(),
            steer: Some(steer),
        }
    }

    fn object(kind: ObjectType, class: ObjectClass, position: Position) -> Self {
        Self {
            kind,
            class: Some(class),
            position,
            state: "initial".into(),
            stats: Stats::default(),
            steer: None,
        }
    }

    pub fn is_hero(&self) -> bool {
        self.class == Some(ObjectClass::Hero)
    }

    pub fn is_door(&self) -> bool {
        self.class == Some(ObjectClass::Door)
    }
}

/// The room as the player would see it.
#[derive(Debug, Clone, Default)]
struct Room {
    name: String,
    author: String,
    tiles: TileGrid,
    objects: BTreeMap<ObjectId, RoomObject>,
    decorations: Vec<(Decoration, Position)>,
}

/// On-screen numbers for the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hud {
    pub life: i64,
    pub score: i64,
    pub keys: i64,
}

// ---------------------------------------------------------------------------
// HeadlessLevel
// ---------------------------------------------------------------------------

/// A [`Level`] that keeps the room as plain data.
#[derive(Debug)]
pub struct HeadlessLevel {
    player: Player,
    rules: RulesConfig,
    room: Option<Room>,
    /// Doors already queued for removal, so a second `open_door` on the
    /// same run does not spend another key.
    opening: BTreeSet<ObjectId>,
    outbound: Vec<Event>,
    history: Vec<Event>,
}

impl HeadlessLevel {
    pub fn new(player: Player, rules: RulesConfig) -> Self {
        Self {
            player,
            rules: rules.validated(),
            room: None,
            opening: BTreeSet::new(),
            outbound: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Name and author of the loaded room.
    pub fn room_info(&self) -> Option<(&str, &str)> {
        self.room
            .as_ref()
            .map(|room| (room.name.as_str(), room.author.as_str()))
    }

    pub fn tiles(&self) -> Option<&TileGrid> {
        self.room.as_ref().map(|room| &room.tiles)
    }

    pub fn object(&self, id: &ObjectId) -> Option<&RoomObject> {
        self.room.as_ref()?.objects.get(id)
    }

    /// Every live object, ordered by identifier.
    pub fn objects(&self) -> impl Iterator<Item = (&ObjectId, &RoomObject)> {
        self.room.iter().flat_map(|room| room.objects.iter())
    }

    pub fn decorations(&self) -> &[(Decoration, Position)] {
        self.room
            .as_ref()
            .map(|room| room.decorations.as_slice())
            .unwrap_or_default()
    }

    /// The player's own record in the room, once spawned.
    pub fn hero(&self) -> Option<&RoomObject> {
        self.object(&self.player.identifier)
    }

    /// Life, score and keys of the player. Zero before the hero spawns.
    pub fn hud(&self) -> Hud {
        self.hero()
            .map(|hero| Hud {
                life: hero.stats.life,
                score: hero.stats.score,
                keys: hero.stats.keys,
            })
            .unwrap_or_default()
    }

    /// Events the level produced itself and that still have to go through
    /// the orchestrator.
    pub fn take_outbound(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbound)
    }

    /// Every event forwarded to this level since the last call.
    pub fn take_history(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.history)
    }

    /// Finds overlapping pairs of a hero and any other object.
    ///
    /// Every object occupies one tile-sized box at its position. Each hero
    /// is paired with every other overlapping object exactly once, hero
    /// first, in identifier order.
    pub fn detect_collisions(&self) -> Vec<Event> {
        let Some(room) = &self.room else {
            return Vec::new();
        };
        let size = self.rules.tile_size;
        let overlaps =
            |a: Position, b: Position| (a.x - b.x).abs() < size && (a.y - b.y).abs() < size;

        let mut collisions = Vec::new();
        for (hero_id, hero) in room.objects.iter().filter(|(_, o)| o.is_hero()) {
            for (other_id, other) in &room.objects {
                if other_id != hero_id && overlaps(hero.position, other.position) {
                    collisions.push(Event::collision(hero_id.clone(), other_id.clone()));
                }
            }
        }
        if !collisions.is_empty() {
            tracing::trace!(count = collisions.len(), "collisions detected");
        }
        collisions
    }

    // -- Handlers --

    fn load_room(&mut self, name: &str, author: &str, tiles: &TileGrid) {
        tracing::debug!(room = %name, %author, "building room");
        self.opening.clear();
        self.room = Some(Room {
            name: name.to_string(),
            author: author.to_string(),
            tiles: tiles.clone(),
            ..Room::default()
        });
    }

    fn spawn_actor(&mut self, id: &ObjectId, attributes: &ActorAttributes) {
        let steer = if *id == self.player.identifier {
            self.player.steer.clone()
        } else {
            NPC_STEER.to_string()
        };
        let Some(room) = self.room.as_mut() else {
            return;
        };
        room.objects
            .insert(id.clone(), RoomObject::actor(attributes, steer));
        room.decorations
            .push((Decoration::Explosion, attributes.position));
    }

    fn spawn_object(&mut self, id: &ObjectId, kind: &ObjectType, x: i32, y: i32) {
        let class = self.rules.classify(kind);
        let position = Position::from_tile(x, y, self.rules.tile_size);
        if let Some(room) = self.room.as_mut() {
            room.objects
                .insert(id.clone(), RoomObject::object(kind.clone(), class, position));
        }
    }

    fn kill_object(&mut self, id: &ObjectId) {
        self.opening.remove(id);
        if let Some(room) = self.room.as_mut() {
            room.objects.remove(id);
        }
    }

    /// Queues removal of `door` and every door touching it, and the key
    /// the player spends on them.
    fn open_door(&mut self, player: &ObjectId, door: &ObjectId) {
        if self.opening.contains(door) {
            return;
        }
        let Some(room) = &self.room else {
            return;
        };
        let run = connected_doors(room, door, self.rules.tile_size);
        if run.is_empty() {
            return;
        }
        tracing::debug!(%player, %door, doors = run.len(), "opening doors");
        for id in run {
            self.outbound.push(Event::kill(&id));
            self.opening.insert(id);
        }
        self.outbound
            .push(Event::increase(player, Attribute::Keys, -1));
    }

    fn with_object(&mut self, id: &ObjectId, f: impl FnOnce(&mut RoomObject)) {
        if let Some(object) = self.room.as_mut().and_then(|room| room.objects.get_mut(id)) {
            f(object);
        }
    }

    fn set_attribute(&mut self, id: &ObjectId, attribute: &Attribute, value: &AttributeValue) {
        self.with_object(id, |object| {
            if let Err(e) = object.stats.set(attribute, value.clone()) {
                tracing::warn!(%id, error = %e, "attribute not set");
            }
        });
    }

    fn increase_attribute(&mut self, id: &ObjectId, attribute: &Attribute, delta: i64) {
        self.with_object(id, |object| {
            if let Err(e) = object.stats.increase(attribute, delta) {
                tracing::warn!(%id, error = %e, "attribute not increased");
            }
        });
    }
}

impl Level for HeadlessLevel {
    fn player(&self) -> &Player {
        &self.player
    }

    fn event_handler(&mut self, event: &Event) {
        match event {
            Event::LoadRoom { name, data, author } => self.load_room(name, author, data),
            Event::SpawnActor { id, attributes } => self.spawn_actor(id, attributes),
            Event::SpawnObject { id, kind, x, y } => self.spawn_object(id, kind, *x, *y),
            Event::SpawnDecoration { kind, position } => {
                if let Some(room) = self.room.as_mut() {
                    room.decorations.push((*kind, *position));
                }
            }
            Event::KillObject { id } => self.kill_object(id),
            Event::OpenDoor { player, door } => self.open_door(player, door),
            Event::SetAttribute {
                id,
                attribute,
                value,
            } => self.set_attribute(id, attribute, value),
            Event::IncreaseAttribute {
                id,
                attribute,
                delta,
            } => self.increase_attribute(id, attribute, *delta),
            Event::WarpTo { id, position } => self.with_object(id, |o| o.position = *position),
            Event::SetState { id, state } => self.with_object(id, |o| o.state = state.clone()),
            Event::SetDirection { id, dx, dy } => {
                let (dx, dy) = (i64::from(*dx), i64::from(*dy));
                self.set_attribute(id, &Attribute::custom("dir_x"), &AttributeValue::Int(dx));
                self.set_attribute(id, &Attribute::custom("dir_y"), &AttributeValue::Int(dy));
            }
            Event::Collision { .. } => {
                tracing::warn!(%event, "collision reached the level");
            }
            Event::Opaque { tag, .. } => {
                tracing::trace!(%tag, "opaque event ignored");
            }
        }
        self.history.push(event.clone());
    }
}

/// `start` and every door reachable from it through doors on the four
/// neighbouring tiles. Empty if `start` is not a door.
fn connected_doors(room: &Room, start: &ObjectId, tile_size: i32) -> Vec<ObjectId> {
    let is_door = |id: &ObjectId| room.objects.get(id).is_some_and(RoomObject::is_door);
    if !is_door(start) {
        return Vec::new();
    }

    let doors: BTreeMap<(i32, i32), &ObjectId> = room
        .objects
        .iter()
        .filter(|(_, o)| o.is_door())
        .map(|(id, o)| (o.position.to_tile(tile_size), id))
        .collect();

    let mut seen: BTreeSet<&ObjectId> = BTreeSet::new();
    let mut queue = VecDeque::from([start]);
    let mut run = Vec::new();
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        run.push(id.clone());
        let Some(object) = room.objects.get(id) else {
            continue;
        };
        let (tx, ty) = object.position.to_tile(tile_size);
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            if let Some(next) = doors.get(&(tx + dx, ty + dy)) {
                queue.push_back(*next);
            }
        }
    }
    run
}
