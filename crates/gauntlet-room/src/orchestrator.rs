//! Room orchestrator: the single authority over a room's tracked objects.
//!
//! Raw events from the simulation enter through [`RoomOrchestrator::fire_event`],
//! take a round trip through the area, and land in
//! [`RoomOrchestrator::event_handler`]. The handler applies the event to the
//! registry first and then forwards it to the level. Collisions are the
//! exception: they are turned into derived events by the collision rules
//! and never forwarded themselves.
//!
//! Everything is synchronous. A call to `fire_event` returns only after
//! the event and everything it caused has been applied and forwarded.
//!
//! ## Event flow
//!
//! ```text
//! fire_event(e, only_local)
//!     │
//!     ├─ only_local ──────────────────────────┐
//!     │                                       │
//!     └─ Area::route(e) ── None ──> dropped   │
//!            │                                │
//!            └─ Some(e') ───────────────> event_handler
//!                                             │
//!                      collision ─────────────┼──> resolve ──> fire_event (each)
//!                                             │
//!                      everything else ───> Registry ──> Level::event_handler
//! ```
//!
//! Derived events re-enter at the top, so the area sees them too and may
//! veto a pickup or a door. Because the handler recurses, every event a
//! collision produced has been applied before the next collision of the
//! same frame is looked at. That is what
//! lets a second collision with an item that was just picked up fall
//! through the "untracked object" check instead of paying out twice.
//!
//! ## Error policy
//!
//! Spawns and kills are lenient: spawning an existing id replaces it and
//! killing a missing id does nothing. Mutations of a named object are
//! strict and return [`RoomError`] before the level sees anything, since
//! an event about an object that was never spawned means the caller
//! fired events out of order.

use gauntlet_protocol::{Attribute, Event, ObjectId, Position};
use gauntlet_tick::{Clock, LifeDrainClock, SystemClock};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{Area, Level, OrchestratorState, Registry, RoomError, RulesConfig, TrackedGameObject};

/// Orchestrates one room for one player.
///
/// Created per room and thrown away with it; nothing carries over to the
/// next room except the level, which [`abandon`](Self::abandon) hands
/// back.
pub struct RoomOrchestrator<A: Area, L: Level> {
    identifier: Option<ObjectId>,
    area: A,
    level: Option<L>,
    registry: Registry,
    rules: RulesConfig,
    life_drain: LifeDrainClock,
    rng: StdRng,
    state: OrchestratorState,
}

impl<A: Area, L: Level> RoomOrchestrator<A, L> {
    /// Creates an unbound orchestrator for `area`, using the system clock
    /// and an OS-seeded random source.
    pub fn new(area: A, rules: RulesConfig) -> Self {
        Self {
            identifier: None,
            area,
            level: None,
            registry: Registry::new(),
            rules: rules.validated(),
            life_drain: LifeDrainClock::new(SystemClock),
            rng: StdRng::from_rng(&mut rand::rng()),
            state: OrchestratorState::Unbound,
        }
    }

    /// Replaces the time source of the life-drain clock. The current
    /// second of `clock` becomes the new baseline.
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.life_drain = LifeDrainClock::new(clock);
        self
    }

    /// Seeds the random source so collision outcomes are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // -- Accessors --

    /// The owning player's identifier, once bound.
    pub fn identifier(&self) -> Option<&ObjectId> {
        self.identifier.as_ref()
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn area(&self) -> &A {
        &self.area
    }

    pub fn level(&self) -> Option<&L> {
        self.level.as_ref()
    }

    pub fn level_mut(&mut self) -> Option<&mut L> {
        self.level.as_mut()
    }

    // -- Lifecycle --

    /// Attaches the level and the owning player's identifier.
    ///
    /// # Errors
    /// [`RoomError::AlreadyBound`] if called more than once.
    pub fn bind(&mut self, identifier: ObjectId, level: L) -> Result<(), RoomError> {
        if let Some(current) = &self.identifier {
            return Err(RoomError::AlreadyBound(current.clone()));
        }
        if !self.state.can_transition_to(OrchestratorState::Bound) {
            return Err(RoomError::InvalidState(format!(
                "cannot bind in state {}",
                self.state
            )));
        }
        tracing::debug!(player = %identifier, "orchestrator bound");
        self.identifier = Some(identifier);
        self.level = Some(level);
        self.state = OrchestratorState::Bound;
        Ok(())
    }

    /// Populates the room: clears the registry, loads the map, then spawns
    /// static objects, pre-placed actors, and finally the player's hero.
    pub fn start(&mut self) -> Result<(), RoomError> {
        if !self.state.is_bound() {
            return Err(RoomError::InvalidState(format!(
                "cannot start in state {}",
                self.state
            )));
        }

        self.registry.clear();

        let map = self.area.map();
        tracing::info!(room = %map.name, author = %map.author, "room starting");
        self.fire_event(
            Event::LoadRoom {
                name: map.name,
                data: map.tiles,
                author: map.author,
            },
            true,
        )?;

        for placement in self.area.objects() {
            let (x, y) = placement.tile;
            self.fire_event(
                Event::SpawnObject {
                    id: placement.id,
                    kind: placement.kind,
                    x,
                    y,
                },
                false,
            )?;
        }

        for (id, attributes) in self.area.actors() {
            self.fire_event(Event::SpawnActor { id, attributes }, false)?;
        }

        let player = self.bound_level()?.player().clone();
        self.fire_event(
            Event::SpawnActor {
                id: player.identifier,
                attributes: player.attributes,
            },
            false,
        )?;

        self.state = OrchestratorState::Running;
        tracing::info!(objects = self.registry.len(), "room running");
        Ok(())
    }

    /// One frame. Drains one point of the player's life whenever a new
    /// whole second has started since the last drain.
    pub fn update(&mut self) -> Result<(), RoomError> {
        if !self.state.is_running() {
            return Err(RoomError::InvalidState(format!(
                "cannot update in state {}",
                self.state
            )));
        }
        if self.life_drain.poll() {
            let player = self.bound_identifier()?.clone();
            self.fire_event(Event::increase(&player, Attribute::Life, -1), false)?;
        }
        Ok(())
    }

    /// Leaves the room for good. Tells the area, drops the registry, and
    /// returns the level so it can be bound to the next room.
    ///
    /// The orchestrator is consumed, so `Discarded` only shows up in the
    /// lifecycle log line written here.
    pub fn abandon(mut self) -> Option<L> {
        self.area.abandon();
        tracing::info!(
            from = %self.state,
            to = %OrchestratorState::Discarded,
            tracked = self.registry.len(),
            "room abandoned"
        );
        self.level.take()
    }

    // -- Routing --

    /// Fires an event into the room.
    ///
    /// `only_local` skips the area and hands the event straight to
    /// [`event_handler`](Self::event_handler); only the initial
    /// `load_room` uses it. Everything else goes through
    /// [`Area::route`], which may veto it.
    pub fn fire_event(&mut self, event: Event, only_local: bool) -> Result<(), RoomError> {
        if only_local {
            return self.event_handler(event);
        }
        let tag = event.tag().to_string();
        match self.area.route(event) {
            Some(event) => self.event_handler(event),
            None => {
                tracing::warn!(event = %tag, "event vetoed by area");
                Ok(())
            }
        }
    }

    /// Applies one event: mutate the registry, then forward to the level.
    ///
    /// # Errors
    /// [`RoomError::UnknownObject`] when `set_attribute`,
    /// `increase_attribute`, `warp_to` or `set_state` name an object that
    /// was never spawned (or is already dead). Nothing is forwarded in
    /// that case.
    pub fn event_handler(&mut self, event: Event) -> Result<(), RoomError> {
        if !self.state.is_bound() {
            return Err(RoomError::InvalidState(format!(
                "cannot handle {} in state {}",
                event.tag(),
                self.state
            )));
        }
        tracing::debug!(%event, "handling event");

        match &event {
            Event::Collision { a, b } => return self.process_collision(a, b),
            Event::SpawnActor { id, attributes } => {
                self.registry
                    .insert(TrackedGameObject::actor(id.clone(), attributes));
            }
            Event::SpawnObject { id, kind, x, y } => {
                let class = self.rules.classify(kind);
                let position = Position::from_tile(*x, *y, self.rules.tile_size);
                self.registry.insert(TrackedGameObject::object(
                    id.clone(),
                    kind.clone(),
                    class,
                    position,
                ));
            }
            Event::KillObject { id } => {
                self.registry.remove(id);
            }
            Event::SetAttribute {
                id,
                attribute,
                value,
            } => {
                self.registry
                    .get_mut_strict(id)?
                    .stats_mut()
                    .set(attribute, value.clone())?;
            }
            Event::IncreaseAttribute {
                id,
                attribute,
                delta,
            } => {
                self.registry
                    .get_mut_strict(id)?
                    .stats_mut()
                    .increase(attribute, *delta)?;
            }
            Event::WarpTo { id, position } => {
                self.registry.get_mut_strict(id)?.set_position(*position);
            }
            Event::SetState { id, state } => {
                self.registry.get_mut_strict(id)?.set_state(state.clone());
            }
            Event::LoadRoom { .. }
            | Event::SpawnDecoration { .. }
            | Event::OpenDoor { .. }
            | Event::SetDirection { .. }
            | Event::Opaque { .. } => {}
        }

        self.bound_level_mut()?.event_handler(&event);
        Ok(())
    }

    fn process_collision(&mut self, a: &ObjectId, b: &ObjectId) -> Result<(), RoomError> {
        if !self.registry.contains(a) || !self.registry.contains(b) {
            tracing::trace!(%a, %b, "collision with untracked object dropped");
            return Ok(());
        }
        let derived = crate::resolve(a, b, &self.registry, &self.rules, &mut self.rng);
        if !derived.is_empty() {
            tracing::debug!(%a, %b, derived = derived.len(), "collision resolved");
        }
        for event in derived {
            self.fire_event(event, false)?;
        }
        Ok(())
    }

    fn bound_identifier(&self) -> Result<&ObjectId, RoomError> {
        self.identifier
            .as_ref()
            .ok_or_else(|| RoomError::InvalidState("no player identifier bound".into()))
    }

    fn bound_level(&self) -> Result<&L, RoomError> {
        self.level
            .as_ref()
            .ok_or_else(|| RoomError::InvalidState("no level bound".into()))
    }

    fn bound_level_mut(&mut self) -> Result<&mut L, RoomError> {
        self.level
            .as_mut()
            .ok_or_else(|| RoomError::InvalidState("no level bound".into()))
    }
}
