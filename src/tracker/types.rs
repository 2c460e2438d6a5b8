use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::tracker::enchant::{EnchantmentId, EnchantmentInfo};

pub const REGION_SCHEMA_VERSION: u8 = 1;
pub const TRADE_SCHEMA_VERSION: u8 = 1;

/// Name of a world/dimension (`world`, `world_nether`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(String);

impl WorldId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorldId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for WorldId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable reference to a live villager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentRef(Uuid);

impl AgentRef {
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl FromStr for AgentRef {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl fmt::Display for AgentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in world space. Coordinates are raw (fractional) block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Block coordinates containing this point.
    pub fn block(&self) -> (i64, i64, i64) {
        (
            self.x.floor() as i64,
            self.y.floor() as i64,
            self.z.floor() as i64,
        )
    }

    /// Componentwise (min, max) of two corners.
    pub fn ordered(a: Position, b: Position) -> (Position, Position) {
        (
            Position::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            Position::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        )
    }

    /// True when every axis of `other` is within `radius` of this point.
    pub fn within_cube(&self, other: &Position, radius: f64) -> bool {
        (self.x - other.x).abs() <= radius
            && (self.y - other.y).abs() <= radius
            && (self.z - other.z).abs() <= radius
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// Where a live agent currently is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLocation {
    pub world: WorldId,
    pub position: Position,
}

impl AgentLocation {
    pub fn new(world: impl Into<WorldId>, position: Position) -> Self {
        Self {
            world: world.into(),
            position,
        }
    }
}

/// A named, world-scoped box used to group villagers.
///
/// `min`/`max` keep the raw corner coordinates, ordered componentwise. The box
/// covers whole blocks: a point is inside when
/// `floor(min) <= c < floor(max) + 1` on every axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionRecord {
    pub id: u64,
    pub name: String,
    pub world: WorldId,
    pub min: Position,
    pub max: Position,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_region_schema_version")]
    pub schema_version: u8,
}

fn default_region_schema_version() -> u8 {
    REGION_SCHEMA_VERSION
}

impl RegionRecord {
    /// Build an unsaved region (id 0) from two corners in any order.
    pub fn new(name: &str, world: impl Into<WorldId>, corner_a: Position, corner_b: Position) -> Self {
        let (min, max) = Position::ordered(corner_a, corner_b);
        Self {
            id: 0,
            name: name.to_string(),
            world: world.into(),
            min,
            max,
            created_at: Utc::now(),
            schema_version: REGION_SCHEMA_VERSION,
        }
    }

    /// Containment in this region's world only.
    pub fn contains(&self, world: &WorldId, point: &Position) -> bool {
        if &self.world != world {
            return false;
        }
        axis_contains(self.min.x, self.max.x, point.x)
            && axis_contains(self.min.y, self.max.y, point.y)
            && axis_contains(self.min.z, self.max.z, point.z)
    }

    pub fn contains_location(&self, location: &AgentLocation) -> bool {
        self.contains(&location.world, &location.position)
    }

    /// Exclusive upper corner of the covered block range.
    pub fn upper_bound(&self) -> Position {
        Position::new(
            self.max.x.floor() + 1.0,
            self.max.y.floor() + 1.0,
            self.max.z.floor() + 1.0,
        )
    }
}

fn axis_contains(min: f64, max: f64, value: f64) -> bool {
    value >= min.floor() && value < max.floor() + 1.0
}

/// Persisted trade row. Region membership is never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub id: u64,
    pub agent: AgentRef,
    pub enchant: EnchantmentId,
    pub level: u32,
    pub price: u32,
    pub description: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_trade_schema_version")]
    pub schema_version: u8,
}

fn default_trade_schema_version() -> u8 {
    TRADE_SCHEMA_VERSION
}

/// Input to an upsert. The enchantment id is normalized by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrade {
    pub agent: AgentRef,
    pub enchant: EnchantmentId,
    pub level: u32,
    pub price: u32,
    pub description: String,
}

impl NewTrade {
    pub fn new(
        agent: AgentRef,
        enchant: impl Into<EnchantmentId>,
        level: u32,
        price: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            agent,
            enchant: enchant.into(),
            level,
            price,
            description: description.into(),
        }
    }

    /// A trade for one live offer; unpriced offers are stored at 0.
    pub fn from_offer(agent: AgentRef, offer: &EnchantmentInfo, description: &str) -> Self {
        Self::new(
            agent,
            offer.id().clone(),
            offer.level(),
            offer.price.unwrap_or(0),
            description,
        )
    }
}

/// A stored trade annotated with live data.
///
/// `region_name` and `location` are filled from the agent's current position
/// at read time and are `None` when the agent cannot be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub id: u64,
    pub agent: AgentRef,
    pub enchant: EnchantmentId,
    pub level: u32,
    pub price: u32,
    pub description: String,
    pub region_name: Option<String>,
    pub location: Option<AgentLocation>,
}

impl Trade {
    pub fn unresolved(record: TradeRecord) -> Self {
        Self {
            id: record.id,
            agent: record.agent,
            enchant: record.enchant,
            level: record.level,
            price: record.price,
            description: record.description,
            region_name: None,
            location: None,
        }
    }

    pub fn offer(&self) -> EnchantmentInfo {
        EnchantmentInfo::new(self.enchant.clone(), self.level, Some(self.price))
    }
}
