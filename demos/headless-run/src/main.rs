use std::io::Write;
use std::time::Duration;

use gauntlet::prelude::*;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

/// Frames between two steps of the scripted hero.
const FRAMES_PER_STEP: u32 = 6;
/// Hard stop in case the script never reaches an exit.
const MAX_FRAMES: u32 = 10_000;

// ---------------------------------------------------------------------------
// Dungeon
// ---------------------------------------------------------------------------

fn walls(width: usize, height: usize) -> Vec<Vec<u16>> {
    (0..height)
        .map(|y| {
            (0..width)
                .map(|x| u16::from(x == 0 || y == 0 || x == width - 1 || y == height - 1))
                .collect()
        })
        .collect()
}

fn dungeon() -> Vec<RoomDefinition> {
    let door = ObjectType::from_tag("door_vertical");
    vec![
        RoomDefinition {
            map: RoomMap {
                name: "gatehouse".into(),
                author: "demo".into(),
                tiles: walls(10, 6),
            },
            objects: vec![
                ObjectPlacement::new("key-1", ObjectType::Key, 3, 2),
                ObjectPlacement::new("jar-1", ObjectType::Jar, 4, 3),
                ObjectPlacement::new("door-1", door.clone(), 6, 1),
                ObjectPlacement::new("door-2", door.clone(), 6, 2),
                ObjectPlacement::new("door-3", door, 6, 3),
                ObjectPlacement::new("exit-1", ObjectType::Exit, 8, 2),
            ],
            actors: vec![(
                ObjectId::new("ghost-1"),
                ActorAttributes::enemy("ghost")
                    .with_life(10)
                    .at(Position::from_tile(2, 4, 8)),
            )],
        },
        RoomDefinition {
            map: RoomMap {
                name: "treasury".into(),
                author: "demo".into(),
                tiles: walls(12, 6),
            },
            objects: vec![
                ObjectPlacement::new("gold-1", ObjectType::Treasure, 2, 2),
                ObjectPlacement::new("portal-a", ObjectType::Teleport, 3, 2),
                ObjectPlacement::new("portal-b", ObjectType::Teleport, 8, 3),
                ObjectPlacement::new("ham-1", ObjectType::Ham, 9, 2),
                ObjectPlacement::new("exit-2", ObjectType::Exit, 10, 2),
            ],
            actors: vec![],
        },
    ]
}

/// Tiles the hero walks through in each room, one step at a time.
fn route(room: &str) -> Vec<(i32, i32)> {
    match room {
        "gatehouse" => vec![
            (2, 2),
            (3, 2),
            (4, 2),
            (4, 3),
            (5, 3),
            (5, 2),
            (6, 2),
            (7, 2),
            (8, 2),
        ],
        "treasury" => vec![(2, 2), (3, 2), (9, 2), (10, 2)],
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn load_config() -> Result<GameConfig, Box<dyn std::error::Error>> {
    let mut config = GameConfig::default();
    if let Ok(path) = std::env::var("GAUNTLET_RULES") {
        let text = std::fs::read_to_string(&path)?;
        config.rules = serde_json::from_str(&text)?;
        tracing::info!(%path, "rules loaded");
    }
    Ok(config)
}

fn print_trace(
    session: &mut Session,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let events = session.drain_trace();
    if !events.is_empty() {
        out.write_all(&JsonCodec.encode_trace(&events)?)?;
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config()?;
    let frame = Duration::from_secs(1) / config.frames_per_second.max(1);
    let player = Player {
        identifier: ObjectId::new("hero"),
        attributes: ActorAttributes::hero("warrior")
            .with_life(600)
            .at(Position::from_tile(1, 2, config.rules.tile_size)),
        steer: "scripted".into(),
    };
    let tile_size = config.rules.tile_size;
    let mut session = Session::new(Dungeon::new(dungeon()), player, config);
    let mut stdout = std::io::stdout().lock();

    let mut ticker = tokio::time::interval(frame);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while session.enter_next_room()? {
        let room = session
            .level()
            .and_then(HeadlessLevel::room_info)
            .map(|(name, _)| name.to_string())
            .unwrap_or_default();
        let mut steps = route(&room).into_iter();
        let mut last = (1, 2);
        let mut frames = 0;

        loop {
            ticker.tick().await;
            frames += 1;

            if frames % FRAMES_PER_STEP == 0 {
                if let Some((tx, ty)) = steps.next() {
                    let id = session.identifier().clone();
                    session.fire(Event::SetDirection {
                        id: id.clone(),
                        dx: (tx - last.0).signum(),
                        dy: (ty - last.1).signum(),
                    })?;
                    session.fire(Event::warp(&id, Position::from_tile(tx, ty, tile_size)))?;
                    last = (tx, ty);
                }
            }

            let outcome = session.frame()?;
            print_trace(&mut session, &mut stdout)?;
            match outcome {
                FrameOutcome::Continue if frames < MAX_FRAMES => {}
                FrameOutcome::Continue => {
                    tracing::warn!(%room, frames, "script did not reach the exit");
                    session.end_current_room()?;
                    break;
                }
                FrameOutcome::RoomEnded(state) => {
                    let hud = session.hud();
                    tracing::info!(
                        %room,
                        %state,
                        frames,
                        life = hud.life,
                        score = hud.score,
                        keys = hud.keys,
                        "room finished"
                    );
                    break;
                }
            }
        }
        print_trace(&mut session, &mut stdout)?;
    }

    let hud = session.hud();
    tracing::info!(
        state = %session.state(),
        rooms = session.dungeon().played(),
        score = hud.score,
        life = hud.life,
        "run finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_move_one_tile_at_a_time() {
        for room in dungeon() {
            let mut last = (1, 2);
            let steps = route(&room.map.name);
            assert!(!steps.is_empty(), "{} has no route", room.map.name);
            for step in steps {
                let (dx, dy) = (step.0 - last.0, step.1 - last.1);
                // Teleports may move the hero anywhere, so only walks are checked.
                if dx.abs() + dy.abs() > 1 {
                    assert!(
                        room.objects.iter().any(|o| o.kind == ObjectType::Teleport),
                        "{} jumps from {last:?} to {step:?}",
                        room.map.name
                    );
                }
                last = step;
            }
        }
    }

    #[test]
    fn test_every_route_ends_on_an_exit() {
        for room in dungeon() {
            let end = route(&room.map.name).last().copied();
            let exit = room
                .objects
                .iter()
                .find(|o| o.kind == ObjectType::Exit)
                .map(|o| o.tile);
            assert_eq!(end, exit, "{}", room.map.name);
        }
    }
}
