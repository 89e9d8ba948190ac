//! The room event vocabulary.
//!
//! Events flow in one direction: the simulation raises raw events
//! (collision, spawn) toward the orchestrator, and the orchestrator
//! forwards every processed event (plus anything it derives) down to the
//! level. Every mutation of a room is represented as one of these.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::{ActorAttributes, Attribute, AttributeValue, Decoration, ObjectId, ObjectType, Position};

/// Rows of tile indices, as handed over by the map loader.
pub type TileGrid = Vec<Vec<u16>>;

/// A room event.
///
/// ## Wire format
///
/// Events are internally tagged: `{ "type": "kill_object", "id": "o1" }`
/// is the shape every trace line has.
///
/// [`Event::Opaque`] is written under its own tag rather than under
/// `"opaque"`, so `Opaque { tag: "play_sound", payload: [] }` becomes
/// `{ "type": "play_sound", "payload": [] }`. Reading goes the other way:
/// a line whose `type` is not one of the known tags comes back as
/// `Opaque`, keeping its `payload` (absent means empty) and dropping any
/// other field. A known tag with missing or malformed fields is still a
/// decode error; it never degrades to `Opaque`.
///
/// The derived impls are generated under `remote = "Self"` as the inherent
/// functions `Event::serialize` / `Event::deserialize`; the trait impls
/// below wrap them with the `Opaque` handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(remote = "Self")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A new room is being entered. Delivered locally only.
    LoadRoom {
        name: String,
        data: TileGrid,
        author: String,
    },

    /// An actor (hero or enemy) appears.
    SpawnActor {
        id: ObjectId,
        attributes: ActorAttributes,
    },

    /// A static map object appears at tile `(x, y)`.
    SpawnObject {
        id: ObjectId,
        kind: ObjectType,
        x: i32,
        y: i32,
    },

    /// A visual effect at a world position.
    SpawnDecoration {
        kind: Decoration,
        position: Position,
    },

    KillObject { id: ObjectId },

    /// `player` opened `door` (the level removes it and its neighbours).
    OpenDoor { player: ObjectId, door: ObjectId },

    SetAttribute {
        id: ObjectId,
        attribute: Attribute,
        value: AttributeValue,
    },

    IncreaseAttribute {
        id: ObjectId,
        attribute: Attribute,
        delta: i64,
    },

    WarpTo { id: ObjectId, position: Position },

    SetState { id: ObjectId, state: String },

    /// Facing direction of an actor, used by the level only.
    SetDirection { id: ObjectId, dx: i32, dy: i32 },

    /// Two objects overlap. Resolved by the orchestrator, never forwarded.
    Collision { a: ObjectId, b: ObjectId },

    /// Any event the orchestrator has no rule for. Passed through to the
    /// level untouched.
    Opaque {
        tag: String,
        #[serde(default)]
        payload: Vec<AttributeValue>,
    },
}

impl Event {
    /// Short snake_case name of the variant, for logs.
    pub fn tag(&self) -> &str {
        match self {
            Self::LoadRoom { .. } => "load_room",
            Self::SpawnActor { .. } => "spawn_actor",
            Self::SpawnObject { .. } => "spawn_object",
            Self::SpawnDecoration { .. } => "spawn_decoration",
            Self::KillObject { .. } => "kill_object",
            Self::OpenDoor { .. } => "open_door",
            Self::SetAttribute { .. } => "set_attribute",
            Self::IncreaseAttribute { .. } => "increase_attribute",
            Self::WarpTo { .. } => "warp_to",
            Self::SetState { .. } => "set_state",
            Self::SetDirection { .. } => "set_direction",
            Self::Collision { .. } => "collision",
            Self::Opaque { tag, .. } => tag,
        }
    }

    /// `true` for the tags of every variant except `Opaque`.
    pub fn is_known_tag(tag: &str) -> bool {
        matches!(
            tag,
            "load_room"
                | "spawn_actor"
                | "spawn_object"
                | "spawn_decoration"
                | "kill_object"
                | "open_door"
                | "set_attribute"
                | "increase_attribute"
                | "warp_to"
                | "set_state"
                | "set_direction"
                | "collision"
                | "opaque"
        )
    }

    pub fn is_collision(&self) -> bool {
        matches!(self, Self::Collision { .. })
    }

    // -- Constructors for the events the rules emit --

    pub fn kill(id: &ObjectId) -> Self {
        Self::KillObject { id: id.clone() }
    }

    pub fn increase(id: &ObjectId, attribute: Attribute, delta: i64) -> Self {
        Self::IncreaseAttribute {
            id: id.clone(),
            attribute,
            delta,
        }
    }

    pub fn decoration(kind: Decoration, position: Position) -> Self {
        Self::SpawnDecoration { kind, position }
    }

    pub fn warp(id: &ObjectId, position: Position) -> Self {
        Self::WarpTo {
            id: id.clone(),
            position,
        }
    }

    pub fn state(id: &ObjectId, state: impl Into<String>) -> Self {
        Self::SetState {
            id: id.clone(),
            state: state.into(),
        }
    }

    pub fn collision(a: impl Into<ObjectId>, b: impl Into<ObjectId>) -> Self {
        Self::Collision {
            a: a.into(),
            b: b.into(),
        }
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Opaque { tag, payload } => {
                let mut out = serializer.serialize_struct("Opaque", 2)?;
                out.serialize_field("type", tag)?;
                out.serialize_field("payload", payload)?;
                out.end()
            }
            _ => Event::serialize(self, serializer),
        }
    }
}

/// Either a known event or anything else that carries a `type`.
#[derive(Deserialize)]
#[serde(untagged)]
enum IncomingEvent {
    Known(#[serde(deserialize_with = "Event::deserialize")] Event),
    Foreign {
        #[serde(rename = "type")]
        tag: String,
        #[serde(default)]
        payload: Vec<AttributeValue>,
    },
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match IncomingEvent::deserialize(deserializer)? {
            IncomingEvent::Known(event) => Ok(event),
            IncomingEvent::Foreign { tag, .. } if Event::is_known_tag(&tag) => {
                Err(de::Error::custom(format!("malformed {tag} event")))
            }
            IncomingEvent::Foreign { tag, payload } => {
                Ok(Event::Opaque { tag, payload })
            }
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadRoom { name, author, .. } => {
                write!(f, "load_room({name}, by {author})")
            }
            Self::SpawnActor { id, attributes } => {
                write!(f, "spawn_actor({id}, {})", attributes.kind)
            }
            Self::SpawnObject { id, kind, x, y } => {
                write!(f, "spawn_object({id}, {kind}, {x}, {y})")
            }
            Self::SpawnDecoration { kind, position } => {
                write!(f, "spawn_decoration({kind}, {position})")
            }
            Self::KillObject { id } => write!(f, "kill_object({id})"),
            Self::OpenDoor { player, door } => {
                write!(f, "open_door({player}, {door})")
            }
            Self::SetAttribute {
                id,
                attribute,
                value,
            } => write!(f, "set_attribute({id}, {attribute}, {value})"),
            Self::IncreaseAttribute {
                id,
                attribute,
                delta,
            } => write!(f, "increase_attribute({id}, {attribute}, {delta})"),
            Self::WarpTo { id, position } => {
                write!(f, "warp_to({id}, {position})")
            }
            Self::SetState { id, state } => write!(f, "set_state({id}, {state})"),
            Self::SetDirection { id, dx, dy } => {
                write!(f, "set_direction({id}, {dx}, {dy})")
            }
            Self::Collision { a, b } => write!(f, "collision({a}, {b})"),
            Self::Opaque { tag, payload } => {
                write!(f, "{tag}(")?;
                for (i, value) in payload.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_is_internally_tagged() {
        let event = Event::kill(&ObjectId::new("o1"));
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "kill_object");
        assert_eq!(json["id"], "o1");
    }

    #[test]
    fn test_increase_attribute_json_uses_attribute_name() {
        let event = Event::increase(&ObjectId::new("h1"), Attribute::Keys, 1);
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "increase_attribute");
        assert_eq!(json["attribute"], "keys");
        assert_eq!(json["delta"], 1);
    }

    #[test]
    fn test_unknown_type_decodes_as_opaque() {
        let event: Event = serde_json::from_str(r#"{"type":"play_sound"}"#).unwrap();
        assert_eq!(
            event,
            Event::Opaque {
                tag: "play_sound".into(),
                payload: vec![],
            }
        );
        assert_eq!(event.tag(), "play_sound");
    }

    #[test]
    fn test_opaque_json_uses_its_own_tag() {
        let event = Event::Opaque {
            tag: "shake".into(),
            payload: vec![AttributeValue::Int(3), AttributeValue::from("hard")],
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "shake");
        assert_eq!(json["payload"][1], "hard");
        assert!(json.get("tag").is_none());

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_explicit_opaque_form_still_decodes() {
        let event: Event =
            serde_json::from_str(r#"{"type":"opaque","tag":"play_sound"}"#).unwrap();
        assert_eq!(event.tag(), "play_sound");
    }

    #[test]
    fn test_malformed_known_event_is_rejected() {
        let result: Result<Event, _> = serde_json::from_str(r#"{"type":"kill_object"}"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("malformed kill_object"), "{err}");

        let missing_type: Result<Event, _> = serde_json::from_str(r#"{"id":"o1"}"#);
        assert!(missing_type.is_err());
    }

    #[test]
    fn test_known_tags_match_variants() {
        let events = [
            Event::kill(&ObjectId::new("o1")),
            Event::collision("h1", "o1"),
            Event::state(&ObjectId::new("h1"), "exit"),
            Event::warp(&ObjectId::new("h1"), Position::default()),
            Event::decoration(Decoration::Smoke, Position::default()),
            Event::increase(&ObjectId::new("h1"), Attribute::Life, 1),
        ];
        for event in events {
            assert!(Event::is_known_tag(event.tag()), "{}", event.tag());
        }
        assert!(!Event::is_known_tag("play_sound"));
    }

    #[test]
    fn test_tag_and_display() {
        let event = Event::collision("h1", "o1");
        assert!(event.is_collision());
        assert_eq!(event.tag(), "collision");
        assert_eq!(event.to_string(), "collision(h1, o1)");

        let opaque = Event::Opaque {
            tag: "shake".into(),
            payload: vec![AttributeValue::Int(3), AttributeValue::from("hard")],
        };
        assert_eq!(opaque.to_string(), "shake(3, hard)");
    }
}
