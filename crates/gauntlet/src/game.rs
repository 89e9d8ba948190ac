//! Game flow: the screen state machine and the session that plays a
//! dungeon room by room.

use std::collections::{BTreeMap, BTreeSet};

use gauntlet_protocol::{Event, ObjectId};
use gauntlet_room::{
    Dungeon, EXIT_STATE, Player, RoomDefinition, RoomOrchestrator, RulesConfig,
};
use gauntlet_tick::{Clock, SystemClock};
use serde::{Deserialize, Serialize};

use crate::{GauntletError, HeadlessLevel, Hud};

/// Playing a room.
pub const LEVEL: &str = "level";
/// Between rooms.
pub const STATUS: &str = "status";
/// The hero ran out of life.
pub const GAME_OVER: &str = "game_over";
/// Every room of the dungeon was cleared.
pub const GOOD_END: &str = "good_end";

/// Errors from the game state machine and the session driver.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// A state name that was never registered.
    #[error("unknown state: \"{0}\"")]
    UnknownState(String),

    /// Both states exist but the move between them is not allowed.
    #[error("cannot go from {from} to {to}")]
    IllegalTransition { from: String, to: String },

    /// A frame or room operation while no room is being played.
    #[error("no room is being played")]
    NoActiveRoom,
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Settings for a [`Session`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rules: RulesConfig,

    /// Base seed for collision randomness. Room `n` uses `seed + n`.
    /// `None` seeds every room from the OS.
    pub seed: Option<u64>,

    /// Frame rate the driver should aim for.
    pub frames_per_second: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rules: RulesConfig::default(),
            seed: None,
            frames_per_second: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// GameStates
// ---------------------------------------------------------------------------

/// Named screens and the moves allowed between them.
///
/// The first state added is where the machine starts.
#[derive(Debug, Clone)]
pub struct GameStates {
    transitions: BTreeMap<String, BTreeSet<String>>,
    current: String,
}

impl GameStates {
    pub fn builder() -> GameStatesBuilder {
        GameStatesBuilder::default()
    }

    /// The four screens of a standard game, starting at [`STATUS`]:
    ///
    /// ```text
    /// status → level → status | game_over | good_end
    /// ```
    pub fn standard() -> Self {
        Self::standard_builder().assemble()
    }

    fn standard_builder() -> GameStatesBuilder {
        Self::builder()
            .state(STATUS, &[LEVEL])
            .state(LEVEL, &[STATUS, GAME_OVER, GOOD_END])
            .state(GAME_OVER, &[])
            .state(GOOD_END, &[])
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transitions.contains_key(name)
    }

    pub fn can_enter(&self, name: &str) -> bool {
        self.transitions
            .get(&self.current)
            .is_some_and(|next| next.contains(name))
    }

    /// Moves to `name`.
    ///
    /// # Errors
    /// [`GameError::UnknownState`] for a name that was never added,
    /// [`GameError::IllegalTransition`] if the current state does not
    /// lead to it.
    pub fn enter_state(&mut self, name: &str) -> Result<(), GameError> {
        if !self.contains(name) {
            return Err(GameError::UnknownState(name.to_string()));
        }
        if !self.can_enter(name) {
            return Err(GameError::IllegalTransition {
                from: self.current.clone(),
                to: name.to_string(),
            });
        }
        tracing::info!(from = %self.current, to = %name, "game state changed");
        self.current = name.to_string();
        Ok(())
    }
}

/// Builder for [`GameStates`].
#[derive(Debug, Default)]
pub struct GameStatesBuilder {
    states: Vec<(String, Vec<String>)>,
}

impl GameStatesBuilder {
    /// Adds a state and the states it may move to.
    pub fn state(mut self, name: &str, next: &[&str]) -> Self {
        self.states
            .push((name.to_string(), next.iter().map(|s| s.to_string()).collect()));
        self
    }

    /// # Errors
    /// [`GameError::UnknownState`] if a transition names a state that was
    /// not added, or if no state was added at all.
    pub fn build(self) -> Result<GameStates, GameError> {
        if self.states.is_empty() {
            return Err(GameError::UnknownState(String::new()));
        }
        let states = self.assemble();
        if let Some(missing) = states
            .transitions
            .values()
            .flatten()
            .find(|target| !states.contains(target))
        {
            return Err(GameError::UnknownState(missing.clone()));
        }
        Ok(states)
    }

    /// Turns the collected states into a machine without checking the
    /// transitions.
    fn assemble(self) -> GameStates {
        let current = self
            .states
            .first()
            .map(|(name, _)| name.clone())
            .unwrap_or_default();
        let transitions = self
            .states
            .into_iter()
            .map(|(name, next)| (name, next.into_iter().collect()))
            .collect();
        GameStates {
            transitions,
            current,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// What a call to [`Session::frame`] led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The room goes on.
    Continue,
    /// The room ended and the game moved to this state.
    RoomEnded(String),
}

type ActiveRoom = RoomOrchestrator<RoomDefinition, HeadlessLevel>;

/// Plays one dungeon for one player.
///
/// Each room gets its own orchestrator and level. The player's life,
/// score and keys carry over from one room to the next.
pub struct Session<C: Clock + Clone = SystemClock> {
    config: GameConfig,
    dungeon: Dungeon,
    states: GameStates,
    player: Player,
    clock: C,
    room: Option<ActiveRoom>,
    level_count: u32,
    trace: Vec<Event>,
}

impl Session<SystemClock> {
    pub fn new(dungeon: Dungeon, player: Player, config: GameConfig) -> Self {
        Self {
            config,
            dungeon,
            states: GameStates::standard(),
            player,
            clock: SystemClock,
            room: None,
            level_count: 1,
            trace: Vec::new(),
        }
    }
}

impl<C: Clock + Clone> Session<C> {
    /// Uses `clock` for the life drain of every room entered from now on.
    pub fn with_clock<D: Clock + Clone>(self, clock: D) -> Session<D> {
        Session {
            config: self.config,
            dungeon: self.dungeon,
            states: self.states,
            player: self.player,
            clock,
            room: self.room,
            level_count: self.level_count,
            trace: self.trace,
        }
    }

    /// Replaces the state machine. It must know [`LEVEL`], [`STATUS`],
    /// [`GAME_OVER`] and [`GOOD_END`].
    pub fn with_states(mut self, states: GameStates) -> Result<Self, GameError> {
        if let Some(missing) = [LEVEL, STATUS, GAME_OVER, GOOD_END]
            .into_iter()
            .find(|name| !states.contains(name))
        {
            return Err(GameError::UnknownState(missing.to_string()));
        }
        self.states = states;
        Ok(self)
    }

    // -- Accessors --

    pub fn state(&self) -> &str {
        self.states.current()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn dungeon(&self) -> &Dungeon {
        &self.dungeon
    }

    /// Number of the room being played, starting at 1.
    pub fn level_count(&self) -> u32 {
        self.level_count
    }

    pub fn room(&self) -> Option<&ActiveRoom> {
        self.room.as_ref()
    }

    pub fn level(&self) -> Option<&HeadlessLevel> {
        self.room.as_ref()?.level()
    }

    /// The player's numbers: live from the room while one is played,
    /// otherwise what was carried out of the last room.
    pub fn hud(&self) -> Hud {
        match self.level() {
            Some(level) => level.hud(),
            None => {
                let stats = &self.player.attributes.stats;
                Hud {
                    life: stats.life,
                    score: stats.score,
                    keys: stats.keys,
                }
            }
        }
    }

    /// Every event forwarded to a level since the last call, in order.
    pub fn drain_trace(&mut self) -> Vec<Event> {
        self.collect_trace();
        std::mem::take(&mut self.trace)
    }

    // -- Flow --

    /// Loads the next room of the dungeon and enters [`LEVEL`].
    /// Returns `false` when there are no rooms left.
    pub fn enter_next_room(&mut self) -> Result<bool, GauntletError> {
        if self.dungeon.finished() {
            return Ok(false);
        }
        self.states.enter_state(LEVEL)?;
        let Some(area) = self.dungeon.next_area() else {
            return Ok(false);
        };

        let mut room = RoomOrchestrator::new(area, self.config.rules.clone())
            .with_clock(self.clock.clone());
        if let Some(seed) = self.config.seed {
            room = room.with_seed(seed.wrapping_add(self.dungeon.played() as u64));
        }
        let level = HeadlessLevel::new(self.player.clone(), self.config.rules.clone());
        room.bind(self.player.identifier.clone(), level)?;
        room.start()?;
        self.room = Some(room);
        self.flush_outbound()?;
        Ok(true)
    }

    /// Fires an input event (movement, facing) into the current room.
    pub fn fire(&mut self, event: Event) -> Result<(), GauntletError> {
        self.active_room()?.fire_event(event, false)?;
        self.flush_outbound()
    }

    /// One frame: life drain, then collisions, then the end-of-room check.
    pub fn frame(&mut self) -> Result<FrameOutcome, GauntletError> {
        self.active_room()?.update()?;
        self.flush_outbound()?;

        let collisions = match self.level() {
            Some(level) => level.detect_collisions(),
            None => Vec::new(),
        };
        for collision in collisions {
            self.active_room()?.fire_event(collision, false)?;
            self.flush_outbound()?;
        }

        if self.room_over() {
            let state = self.end_current_room()?;
            return Ok(FrameOutcome::RoomEnded(state.to_string()));
        }
        Ok(FrameOutcome::Continue)
    }

    /// Leaves the current room and picks the next screen: [`GAME_OVER`]
    /// if the hero is dead, [`GOOD_END`] if it was the last room,
    /// [`STATUS`] otherwise (and the level counter goes up).
    pub fn end_current_room(&mut self) -> Result<&str, GauntletError> {
        self.collect_trace();
        let room = self.room.take().ok_or(GameError::NoActiveRoom)?;
        let level = room.abandon().ok_or(GameError::NoActiveRoom)?;
        self.dungeon.abandon_area();

        if let Some(hero) = level.hero() {
            let stats = &mut self.player.attributes.stats;
            stats.life = hero.stats.life;
            stats.score = hero.stats.score;
            stats.keys = hero.stats.keys;
        }

        let next = if self.player.attributes.stats.life <= 0 {
            GAME_OVER
        } else if self.dungeon.finished() {
            GOOD_END
        } else {
            self.level_count += 1;
            STATUS
        };
        tracing::info!(
            player = %self.player.identifier,
            next,
            level = self.level_count,
            "room ended"
        );
        self.states.enter_state(next)?;
        Ok(self.states.current())
    }

    /// The hero reached an exit or has no life left.
    fn room_over(&self) -> bool {
        self.level()
            .and_then(HeadlessLevel::hero)
            .is_some_and(|hero| hero.state == EXIT_STATE || hero.stats.life <= 0)
    }

    fn active_room(&mut self) -> Result<&mut ActiveRoom, GameError> {
        self.room.as_mut().ok_or(GameError::NoActiveRoom)
    }

    /// Feeds events the level raised back through the orchestrator until
    /// none are left.
    fn flush_outbound(&mut self) -> Result<(), GauntletError> {
        let room = self.active_room()?;
        loop {
            let outbound = room
                .level_mut()
                .map(HeadlessLevel::take_outbound)
                .unwrap_or_default();
            if outbound.is_empty() {
                break;
            }
            for event in outbound {
                room.fire_event(event, false)?;
            }
        }
        self.collect_trace();
        Ok(())
    }

    fn collect_trace(&mut self) {
        if let Some(level) = self.room.as_mut().and_then(|room| room.level_mut()) {
            self.trace.extend(level.take_history());
        }
    }

    /// Identifier of the controlling player.
    pub fn identifier(&self) -> &ObjectId {
        &self.player.identifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // GameStates
    // =====================================================================

    #[test]
    fn test_standard_states_start_at_status() {
        let states = GameStates::standard();
        assert_eq!(states.current(), STATUS);
        for name in [LEVEL, STATUS, GAME_OVER, GOOD_END] {
            assert!(states.contains(name));
        }
    }

    #[test]
    fn test_standard_transitions_pass_validation() {
        let validated = GameStates::standard_builder().build().unwrap();
        assert_eq!(validated.transitions, GameStates::standard().transitions);
    }

    #[test]
    fn test_new_session_starts_at_status() {
        let player = Player {
            identifier: ObjectId::new("p1"),
            attributes: gauntlet_protocol::ActorAttributes::hero("elf"),
            steer: "keyboard".into(),
        };
        let session = Session::new(Dungeon::default(), player, GameConfig::default());
        assert_eq!(session.state(), STATUS);
        assert!(session.states.can_enter(LEVEL));
    }

    #[test]
    fn test_build_rejects_unknown_target() {
        let result = GameStates::builder()
            .state("title", &["level"])
            .state("level", &["credits"])
            .build();
        assert!(matches!(result, Err(GameError::UnknownState(name)) if name == "credits"));
    }

    #[test]
    fn test_build_rejects_empty_machine() {
        assert!(GameStates::builder().build().is_err());
    }

    #[test]
    fn test_enter_unknown_state_fails_loudly() {
        let mut states = GameStates::standard();
        let err = states.enter_state("bonus").unwrap_err();
        assert!(matches!(&err, GameError::UnknownState(name) if name == "bonus"));
        assert_eq!(err.to_string(), "unknown state: \"bonus\"");
        assert_eq!(states.current(), STATUS);
    }

    #[test]
    fn test_enter_state_follows_transitions() {
        let mut states = GameStates::standard();
        states.enter_state(LEVEL).unwrap();
        states.enter_state(GOOD_END).unwrap();
        assert!(matches!(
            states.enter_state(LEVEL),
            Err(GameError::IllegalTransition { .. })
        ));
        assert_eq!(states.current(), GOOD_END);
    }

    // =====================================================================
    // GameConfig
    // =====================================================================

    #[test]
    fn test_config_partial_json_fills_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{ "seed": 7, "rules": { "points_per_door": 75 } }"#)
                .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.frames_per_second, 60);
        assert_eq!(config.rules.points_per_door, 75);
        assert_eq!(config.rules.points_per_key, gauntlet_room::POINTS_PER_KEY);
    }
}
