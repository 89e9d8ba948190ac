//! Core value types shared by the orchestrator, the level, and the codec.
//!
//! Everything here is plain data: identifiers, positions, object
//! categories, and the attribute record carried by actors. Behavior lives
//! in `gauntlet-room`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Stable identifier of a live game object (hero, enemy, item, door).
///
/// Generated once by whoever creates the object (map loader, level,
/// player profile) and never changed for the object's lifetime.
/// `#[serde(transparent)]` keeps it a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub String);

impl ObjectId {
    /// Creates an identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A point in world (pixel) units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// World position of the top-left corner of tile `(tx, ty)`.
    pub const fn from_tile(tx: i32, ty: i32, tile_size: i32) -> Self {
        Self {
            x: tx * tile_size,
            y: ty * tile_size,
        }
    }

    /// Tile coordinates containing this position.
    ///
    /// Integer division truncates toward zero, same as the map loader.
    pub fn to_tile(self, tile_size: i32) -> (i32, i32) {
        (self.x / tile_size, self.y / tile_size)
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(self, other: Position) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// Object classification
// ---------------------------------------------------------------------------

/// Coarse category of a tracked object.
///
/// Enemies and other generic entities carry no class at all
/// (`Option<ObjectClass>::None`), which is what keeps them out of the
/// collision rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    Hero,
    Item,
    Door,
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hero => write!(f, "hero"),
            Self::Item => write!(f, "item"),
            Self::Door => write!(f, "door"),
        }
    }
}

/// Fine-grained kind of an object.
///
/// The item kinds the collision rules know about get their own variant;
/// everything else (door tiles, hero class names, enemy kinds) is kept as
/// a free tag. Serialized as the bare tag string, e.g. `"key"` or
/// `"door_vertical"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjectType {
    Key,
    Treasure,
    Jar,
    Ham,
    Teleport,
    Exit,
    Tag(String),
}

impl ObjectType {
    /// Parses a map/object tag. Unknown tags become [`ObjectType::Tag`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "key" => Self::Key,
            "treasure" => Self::Treasure,
            "jar" => Self::Jar,
            "ham" => Self::Ham,
            "teleport" => Self::Teleport,
            "exit" => Self::Exit,
            other => Self::Tag(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            Self::Key => "key",
            Self::Treasure => "treasure",
            Self::Jar => "jar",
            Self::Ham => "ham",
            Self::Teleport => "teleport",
            Self::Exit => "exit",
            Self::Tag(tag) => tag,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl From<String> for ObjectType {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<&str> for ObjectType {
    fn from(tag: &str) -> Self {
        Self::from_tag(tag)
    }
}

impl From<ObjectType> for String {
    fn from(kind: ObjectType) -> Self {
        match kind {
            ObjectType::Tag(tag) => tag,
            known => known.as_tag().to_string(),
        }
    }
}

/// A purely visual, non-interactive effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decoration {
    Smoke,
    Explosion,
}

impl fmt::Display for Decoration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Smoke => write!(f, "smoke"),
            Self::Explosion => write!(f, "explosion"),
        }
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Name of an actor attribute.
///
/// The three attributes the game rules read are named variants; anything
/// a level wants to hang off an actor (facing direction, level counter)
/// goes through `Custom`. Serialized as the bare name string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Attribute {
    Life,
    Score,
    Keys,
    Custom(String),
}

impl Attribute {
    pub fn custom(name: impl Into<String>) -> Self {
        Self::from_name(&name.into())
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "life" => Self::Life,
            "score" => Self::Score,
            "keys" => Self::Keys,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Life => "life",
            Self::Score => "score",
            Self::Keys => "keys",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Attribute {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<Attribute> for String {
    fn from(attribute: Attribute) -> Self {
        match attribute {
            Attribute::Custom(name) => name,
            known => known.name().to_string(),
        }
    }
}

/// Value stored in an attribute slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Int(i64),
    Text(String),
}

impl AttributeValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Attribute record of an actor.
///
/// `life`, `score` and `keys` are always present and default to 0, so a
/// read never has to distinguish "missing attribute" from "zero". Extra
/// attributes are created on first write in `custom`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub life: i64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub keys: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, AttributeValue>,
}

impl Stats {
    /// Numeric value of `attribute`; absent or non-numeric reads as 0.
    pub fn int(&self, attribute: &Attribute) -> i64 {
        match attribute {
            Attribute::Life => self.life,
            Attribute::Score => self.score,
            Attribute::Keys => self.keys,
            Attribute::Custom(name) => self
                .custom
                .get(name)
                .and_then(AttributeValue::as_int)
                .unwrap_or(0),
        }
    }

    /// Current value of `attribute`, if it has ever been written.
    pub fn get(&self, attribute: &Attribute) -> Option<AttributeValue> {
        match attribute {
            Attribute::Life => Some(AttributeValue::Int(self.life)),
            Attribute::Score => Some(AttributeValue::Int(self.score)),
            Attribute::Keys => Some(AttributeValue::Int(self.keys)),
            Attribute::Custom(name) => self.custom.get(name).cloned(),
        }
    }

    /// Overwrites `attribute` with `value`.
    ///
    /// # Errors
    /// [`ProtocolError::AttributeType`] if a text value is written into
    /// one of the numeric slots.
    pub fn set(
        &mut self,
        attribute: &Attribute,
        value: AttributeValue,
    ) -> Result<(), ProtocolError> {
        let slot = match attribute {
            Attribute::Life => &mut self.life,
            Attribute::Score => &mut self.score,
            Attribute::Keys => &mut self.keys,
            Attribute::Custom(name) => {
                self.custom.insert(name.clone(), value);
                return Ok(());
            }
        };
        *slot = value.as_int().ok_or_else(|| ProtocolError::AttributeType {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })?;
        Ok(())
    }

    /// Adds `delta` to `attribute`, treating an absent value as 0.
    ///
    /// The value is left untouched when the call fails.
    ///
    /// # Errors
    /// [`ProtocolError::AttributeType`] if the custom slot holds text,
    /// [`ProtocolError::AttributeOverflow`] if the sum does not fit in an
    /// `i64`.
    pub fn increase(
        &mut self,
        attribute: &Attribute,
        delta: i64,
    ) -> Result<(), ProtocolError> {
        let current = match attribute {
            Attribute::Life => self.life,
            Attribute::Score => self.score,
            Attribute::Keys => self.keys,
            Attribute::Custom(name) => match self.custom.get(name) {
                None => 0,
                Some(AttributeValue::Int(v)) => *v,
                Some(text @ AttributeValue::Text(_)) => {
                    return Err(ProtocolError::AttributeType {
                        attribute: name.clone(),
                        value: text.to_string(),
                    });
                }
            },
        };
        let sum = current
            .checked_add(delta)
            .ok_or_else(|| ProtocolError::AttributeOverflow {
                attribute: attribute.to_string(),
                delta,
            })?;
        match attribute {
            Attribute::Life => self.life = sum,
            Attribute::Score => self.score = sum,
            Attribute::Keys => self.keys = sum,
            Attribute::Custom(name) => {
                self.custom.insert(name.clone(), AttributeValue::Int(sum));
            }
        }
        Ok(())
    }
}

/// Everything needed to spawn an actor: what it is, where, and its stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorAttributes {
    /// `Some(Hero)` for player-controlled heroes, `None` for enemies.
    pub class: Option<ObjectClass>,
    /// Hero class name or enemy kind.
    pub kind: ObjectType,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub stats: Stats,
}

impl ActorAttributes {
    /// A hero of the given class (e.g. `"warrior"`).
    pub fn hero(kind: impl Into<ObjectType>) -> Self {
        Self {
            class: Some(ObjectClass::Hero),
            kind: kind.into(),
            position: Position::default(),
            stats: Stats::default(),
        }
    }

    /// A classless actor such as an enemy.
    pub fn enemy(kind: impl Into<ObjectType>) -> Self {
        Self {
            class: None,
            kind: kind.into(),
            position: Position::default(),
            stats: Stats::default(),
        }
    }

    pub fn with_life(mut self, life: i64) -> Self {
        self.stats.life = life;
        self
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.stats.score = score;
        self
    }

    pub fn with_keys(mut self, keys: i64) -> Self {
        self.stats.keys = keys;
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

// =========================================================================
// Tests
// =========================================================================
