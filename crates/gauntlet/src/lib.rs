//! # Gauntlet
//!
//! Headless runtime for a top-down dungeon game.
//!
//! A [`Session`] walks the player through a [`Dungeon`]: for every room it
//! creates a [`RoomOrchestrator`](gauntlet_room::RoomOrchestrator) bound to
//! a [`HeadlessLevel`], feeds it frames, and moves the [`GameStates`]
//! machine along when the room ends.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gauntlet::prelude::*;
//!
//! # fn rooms() -> Vec<RoomDefinition> { Vec::new() }
//! let player = Player {
//!     identifier: ObjectId::new("p1"),
//!     attributes: ActorAttributes::hero("warrior").with_life(600),
//!     steer: "scripted".into(),
//! };
//! let mut session = Session::new(Dungeon::new(rooms()), player, GameConfig::default());
//! session.enter_next_room()?;
//! while let FrameOutcome::Continue = session.frame()? {}
//! # Ok::<(), GauntletError>(())
//! ```

pub mod error;
pub mod game;
pub mod level;

pub use error::GauntletError;
pub use game::{FrameOutcome, GameConfig, GameError, GameStates, GameStatesBuilder, Session};
pub use level::{HeadlessLevel, Hud, RoomObject};

/// Everything needed to run a dungeon headlessly.
pub mod prelude {
    pub use crate::{
        FrameOutcome, GameConfig, GameError, GameStates, GauntletError, HeadlessLevel, Hud,
        Session,
    };
    pub use gauntlet_protocol::{
        ActorAttributes, Attribute, Codec, Event, JsonCodec, ObjectId, ObjectType, Position,
    };
    pub use gauntlet_room::{
        Dungeon, ObjectPlacement, Player, RoomDefinition, RoomMap, RulesConfig,
    };
    pub use gauntlet_tick::{Clock, ManualClock, SystemClock};
}
