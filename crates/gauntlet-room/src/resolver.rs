//! Collision rules.
//!
//! [`resolve`] is a pure decision function: given a collision between two
//! tracked objects and the current registry, it returns the events that
//! should happen. It never touches the registry itself; the orchestrator
//! fires the returned events one by one through its normal routing.
//!
//! ## Returning events
//!
//! Handing back a `Vec<Event>` instead of mutating keeps every change on
//! the one path the level and the area already watch. A key pickup is
//! just `kill_object`, `increase_attribute` and `increase_attribute` in a
//! row, and the level mirrors it without knowing any rules. It also
//! means the function can be tested against a registry snapshot with no
//! orchestrator around it.
//!
//! ## Rule order
//!
//! Only the first object of the pair acts, and it must be a hero. The
//! second object is then matched by class and kind:
//!
//! | `b` is      | events |
//! |-------------|--------|
//! | key         | kill `b`, keys +1, score +key points |
//! | treasure    | kill `b`, smoke, score +k×1000 (k in 1..=4) |
//! | jar / ham   | kill `b`, smoke, life +100 / +50 |
//! | teleport    | smoke, warp `a` next to the nearest other teleport, explosion |
//! | exit        | warp onto it, state `exit`, score +level points |
//! | door        | with a key: score +door points, then `open_door` |
//!
//! Items match on kind, doors on class, so every configured door kind
//! opens the same way. The level spends the key when it handles
//! `open_door`, because only it knows which tiles belong to the run.
//!
//! Anything else returns no events. The exit rule checks the hero's state
//! first, so standing on an exit for several frames scores once.
//!
//! ## Randomness
//!
//! Treasure value and the teleport landing offset draw from the `rng`
//! passed in. The orchestrator owns a seeded `StdRng`, so a fixed seed
//! replays the same run.

use gauntlet_protocol::{Attribute, Decoration, Event, ObjectClass, ObjectId, ObjectType, Position};
use rand::Rng;

use crate::{Registry, RulesConfig, TrackedGameObject};

/// State a hero enters on reaching an exit. Guards against scoring the
/// same exit twice.
pub const EXIT_STATE: &str = "exit";

/// Treasure is worth `k * TREASURE_UNIT` with `k` drawn from 1..=4.
const TREASURE_UNIT: i64 = 1000;
const JAR_LIFE: i64 = 100;
const HAM_LIFE: i64 = 50;

/// The eight tile offsets around a point.
const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Decides what a collision between `a` and `b` does.
///
/// Returns no events when:
/// - either id is no longer tracked (e.g. killed earlier this frame),
/// - `a` is not a hero (resolution is directional: only the first object
///   of the pair acts),
/// - no rule matches `b`.
pub fn resolve<R: Rng>(
    a: &ObjectId,
    b: &ObjectId,
    registry: &Registry,
    rules: &RulesConfig,
    rng: &mut R,
) -> Vec<Event> {
    let (Some(hero), Some(other)) = (registry.get(a), registry.get(b)) else {
        return Vec::new();
    };
    if !hero.is_hero() {
        return Vec::new();
    }

    match other.class() {
        Some(ObjectClass::Item) => pick_up(hero, other, registry, rules, rng),
        Some(ObjectClass::Door) => open_door(hero, other, rules),
        _ => Vec::new(),
    }
}

fn pick_up<R: Rng>(
    hero: &TrackedGameObject,
    item: &TrackedGameObject,
    registry: &Registry,
    rules: &RulesConfig,
    rng: &mut R,
) -> Vec<Event> {
    let h = hero.identifier();
    let o = item.identifier();
    match item.kind() {
        ObjectType::Key => vec![
            Event::kill(o),
            Event::increase(h, Attribute::Keys, 1),
            Event::increase(h, Attribute::Score, rules.points_per_key),
        ],
        ObjectType::Treasure => vec![
            Event::kill(o),
            Event::decoration(Decoration::Smoke, item.position()),
            Event::increase(h, Attribute::Score, rng.random_range(1..=4_i64) * TREASURE_UNIT),
        ],
        ObjectType::Jar => vec![
            Event::kill(o),
            Event::decoration(Decoration::Smoke, item.position()),
            Event::increase(h, Attribute::Life, JAR_LIFE),
        ],
        ObjectType::Ham => vec![
            Event::kill(o),
            Event::decoration(Decoration::Smoke, item.position()),
            Event::increase(h, Attribute::Life, HAM_LIFE),
        ],
        ObjectType::Teleport => {
            let others = registry.find_by_kind(&ObjectType::Teleport, Some(o));
            let Some(target) = nearest(hero.position(), others) else {
                return Vec::new();
            };
            let destination = random_around(target.position(), rules, rng);
            vec![
                Event::decoration(Decoration::Smoke, hero.position()),
                Event::warp(h, destination),
                Event::decoration(Decoration::Explosion, destination),
            ]
        }
        ObjectType::Exit if hero.state() != EXIT_STATE => vec![
            Event::warp(h, item.position()),
            Event::state(h, EXIT_STATE),
            Event::increase(h, Attribute::Score, rules.points_per_level),
        ],
        _ => Vec::new(),
    }
}

fn open_door(hero: &TrackedGameObject, door: &TrackedGameObject, rules: &RulesConfig) -> Vec<Event> {
    if hero.stats().keys <= 0 {
        return Vec::new();
    }
    vec![
        Event::increase(hero.identifier(), Attribute::Score, rules.points_per_door),
        Event::OpenDoor {
            player: hero.identifier().clone(),
            door: door.identifier().clone(),
        },
    ]
}

/// Closest candidate to `target` by Euclidean distance. Ties keep the
/// first candidate seen.
fn nearest<'a>(
    target: Position,
    candidates: impl Iterator<Item = &'a TrackedGameObject>,
) -> Option<&'a TrackedGameObject> {
    let mut best: Option<(f64, &TrackedGameObject)> = None;
    for candidate in candidates {
        let distance = target.distance_to(candidate.position());
        if best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, candidate));
        }
    }
    best.map(|(_, candidate)| candidate)
}

/// A tile-aligned position one tile away from `center` in a random
/// direction.
///
/// Draws dx and dy from -1..=1 until they are not both zero, for at most
/// `rules.teleport_offset_attempts` draws; after that picks one of the
/// eight neighbours directly.
fn random_around<R: Rng>(center: Position, rules: &RulesConfig, rng: &mut R) -> Position {
    let (tx, ty) = center.to_tile(rules.tile_size);
    let mut offset = None;
    for _ in 0..rules.teleport_offset_attempts {
        let dx = rng.random_range(-1..=1_i32);
        let dy = rng.random_range(-1..=1_i32);
        if (dx, dy) != (0, 0) {
            offset = Some((dx, dy));
            break;
        }
    }
    let (dx, dy) =
        offset.unwrap_or_else(|| NEIGHBOURS[rng.random_range(0..NEIGHBOURS.len())]);
    Position::from_tile(tx + dx, ty + dy, rules.tile_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_protocol::ActorAttributes;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const TILE: i32 = 8;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn item(id: &str, kind: ObjectType, tx: i32, ty: i32) -> TrackedGameObject {
        TrackedGameObject::object(
            ObjectId::new(id),
            kind,
            ObjectClass::Item,
            Position::from_tile(tx, ty, TILE),
        )
    }

    fn hero_at(id: &str, position: Position) -> TrackedGameObject {
        TrackedGameObject::actor(
            ObjectId::new(id),
            &ActorAttributes::hero("warrior").with_life(100).at(position),
        )
    }

    fn registry_with(objects: Vec<TrackedGameObject>) -> Registry {
        let mut registry = Registry::new();
        for o in objects {
            registry.insert(o);
        }
        registry
    }

    fn run(registry: &Registry, a: &str, b: &str) -> Vec<Event> {
        resolve(
            &ObjectId::new(a),
            &ObjectId::new(b),
            registry,
            &RulesConfig::default(),
            &mut rng(),
        )
    }

    // =====================================================================
    // Guards
    // =====================================================================

    #[test]
    fn test_missing_object_is_dropped() {
        let registry = registry_with(vec![hero_at("h1", Position::default())]);
        assert!(run(&registry, "h1", "gone").is_empty());
        assert!(run(&registry, "gone", "h1").is_empty());
    }

    #[test]
    fn test_non_hero_pairs_produce_nothing() {
        let mut doors = RulesConfig::default().door_types.into_iter();
        let door_kind = doors.next().unwrap();
        let registry = registry_with(vec![
            item("k1", ObjectType::Key, 0, 0),
            item("k2", ObjectType::Key, 0, 0),
            TrackedGameObject::object(
                ObjectId::new("d1"),
                door_kind.clone(),
                ObjectClass::Door,
                Position::default(),
            ),
            TrackedGameObject::object(
                ObjectId::new("d2"),
                door_kind,
                ObjectClass::Door,
                Position::default(),
            ),
            TrackedGameObject::actor(ObjectId::new("g1"), &ActorAttributes::enemy("ghost")),
        ]);
        assert!(run(&registry, "k1", "k2").is_empty());
        assert!(run(&registry, "d1", "d2").is_empty());
        assert!(run(&registry, "g1", "k1").is_empty());
    }

    #[test]
    fn test_resolution_is_directional() {
        let registry = registry_with(vec![
            hero_at("h1", Position::default()),
            item("k1", ObjectType::Key, 0, 0),
        ]);
        assert!(run(&registry, "k1", "h1").is_empty());
        assert_eq!(run(&registry, "h1", "k1").len(), 3);
    }

    #[test]
    fn test_hero_vs_hero_produces_nothing() {
        let registry = registry_with(vec![
            hero_at("h1", Position::default()),
            hero_at("h2", Position::default()),
        ]);
        assert!(run(&registry, "h1", "h2").is_empty());
    }

    // =====================================================================
    // Items
    // =====================================================================

    #[test]
    fn test_key_pickup() {
        let registry = registry_with(vec![
            hero_at("h1", Position::default()),
            item("k1", ObjectType::Key, 1, 1),
        ]);
        let h1 = ObjectId::new("h1");
        assert_eq!(
            run(&registry, "h1", "k1"),
            vec![
                Event::kill(&ObjectId::new("k1")),
                Event::increase(&h1, Attribute::Keys, 1),
                Event::increase(&h1, Attribute::Score, crate::POINTS_PER_KEY),
            ]
        );
    }

    #[test]
    fn test_treasure_bonus_is_one_to_four_thousand() {
        let registry = registry_with(vec![
            hero_at("h1", Position::default()),
            item("t1", ObjectType::Treasure, 2, 2),
        ]);
        let mut rng = rng();
        for _ in 0..50 {
            let events = resolve(
                &ObjectId::new("h1"),
                &ObjectId::new("t1"),
                &registry,
                &RulesConfig::default(),
                &mut rng,
            );
            assert_eq!(events[0], Event::kill(&ObjectId::new("t1")));
            assert_eq!(
                events[1],
                Event::decoration(Decoration::Smoke, Position::from_tile(2, 2, TILE))
            );
            let Event::IncreaseAttribute {
                attribute, delta, ..
            } = &events[2]
            else {
                panic!("expected score increase, got {:?}", events[2]);
            };
            assert_eq!(*attribute, Attribute::Score);
            assert!([1000, 2000, 3000, 4000].contains(delta), "bonus {delta}");
        }
    }

    #[test]
    fn test_jar_and_ham_restore_life() {
        let registry = registry_with(vec![
            hero_at("h1", Position::default()),
            item("j1", ObjectType::Jar, 1, 0),
            item("m1", ObjectType::Ham, 2, 0),
        ]);
        let h1 = ObjectId::new("h1");
        let jar = run(&registry, "h1", "j1");
        assert_eq!(jar[2], Event::increase(&h1, Attribute::Life, 100));
        let ham = run(&registry, "h1", "m1");
        assert_eq!(ham[0], Event::kill(&ObjectId::new("m1")));
        assert_eq!(ham[2], Event::increase(&h1, Attribute::Life, 50));
    }

    // =====================================================================
    // Exit
    // =====================================================================

    #[test]
    fn test_exit_warps_sets_state_and_scores() {
        let registry = registry_with(vec![
            hero_at("h1", Position::default()),
            item("x1", ObjectType::Exit, 5, 5),
        ]);
        let h1 = ObjectId::new("h1");
        assert_eq!(
            run(&registry, "h1", "x1"),
            vec![
                Event::warp(&h1, Position::from_tile(5, 5, TILE)),
                Event::state(&h1, EXIT_STATE),
                Event::increase(&h1, Attribute::Score, crate::POINTS_PER_LEVEL),
            ]
        );
    }

    #[test]
    fn test_exit_ignored_when_hero_already_exiting() {
        let mut hero = hero_at("h1", Position::default());
        hero.set_state(EXIT_STATE);
        let registry = registry_with(vec![hero, item("x1", ObjectType::Exit, 5, 5)]);
        assert!(run(&registry, "h1", "x1").is_empty());
    }

    // =====================================================================
    // Doors
    // =====================================================================

    fn door(id: &str) -> TrackedGameObject {
        TrackedGameObject::object(
            ObjectId::new(id),
            ObjectType::from_tag("door_vertical"),
            ObjectClass::Door,
            Position::from_tile(3, 3, TILE),
        )
    }

    #[test]
    fn test_door_without_key_stays_shut() {
        let registry = registry_with(vec![hero_at("h1", Position::default()), door("d1")]);
        assert!(run(&registry, "h1", "d1").is_empty());
    }

    #[test]
    fn test_door_with_key_opens_and_scores() {
        let hero = TrackedGameObject::actor(
            ObjectId::new("h1"),
            &ActorAttributes::hero("warrior").with_keys(1),
        );
        let registry = registry_with(vec![hero, door("d1")]);
        let h1 = ObjectId::new("h1");
        assert_eq!(
            run(&registry, "h1", "d1"),
            vec![
                Event::increase(&h1, Attribute::Score, crate::POINTS_PER_DOOR),
                Event::OpenDoor {
                    player: h1.clone(),
                    door: ObjectId::new("d1"),
                },
            ]
        );
    }

    // =====================================================================
    // Teleports
    // =====================================================================

    #[test]
    fn test_lone_teleport_does_nothing() {
        let registry = registry_with(vec![
            hero_at("h1", Position::default()),
            item("p1", ObjectType::Teleport, 1, 1),
        ]);
        assert!(run(&registry, "h1", "p1").is_empty());
    }

    #[test]
    fn test_teleport_lands_next_to_nearest_other_teleport() {
        // p2 is nearer vertically but far horizontally; p3 is the true
        // nearest by Euclidean distance.
        let hero_pos = Position::from_tile(10, 10, TILE);
        let registry = registry_with(vec![
            hero_at("h1", hero_pos),
            item("p1", ObjectType::Teleport, 10, 10),
            item("p2", ObjectType::Teleport, 40, 11),
            item("p3", ObjectType::Teleport, 13, 14),
        ]);

        let mut rng = rng();
        for _ in 0..30 {
            let events = resolve(
                &ObjectId::new("h1"),
                &ObjectId::new("p1"),
                &registry,
                &RulesConfig::default(),
                &mut rng,
            );
            assert_eq!(events.len(), 3);
            assert_eq!(events[0], Event::decoration(Decoration::Smoke, hero_pos));
            let Event::WarpTo { id, position } = &events[1] else {
                panic!("expected warp, got {:?}", events[1]);
            };
            assert_eq!(id.as_str(), "h1");
            let (tx, ty) = position.to_tile(TILE);
            let (dx, dy) = (tx - 13, ty - 14);
            assert!(dx.abs() <= 1 && dy.abs() <= 1 && (dx, dy) != (0, 0));
            assert_eq!(position.x % TILE, 0);
            assert_eq!(position.y % TILE, 0);
            assert_eq!(events[2], Event::decoration(Decoration::Explosion, *position));
        }
    }

    #[test]
    fn test_random_around_without_attempts_uses_fallback() {
        let rules = RulesConfig {
            teleport_offset_attempts: 0,
            ..RulesConfig::default()
        };
        let mut rng = rng();
        for _ in 0..20 {
            let p = random_around(Position::from_tile(4, 4, TILE), &rules, &mut rng);
            let (tx, ty) = p.to_tile(TILE);
            assert!((tx - 4).abs() <= 1 && (ty - 4).abs() <= 1);
            assert_ne!((tx, ty), (4, 4));
        }
    }

    #[test]
    fn test_nearest_on_empty_is_none() {
        assert!(nearest(Position::default(), std::iter::empty()).is_none());
    }
}
