//! Read-only view of the live world.
//!
//! The tracker never owns villagers. Everything it knows about where an agent
//! is *right now*, and what it currently offers, comes through [`AgentGateway`].
//! The game host implements the trait; [`WorldSnapshot`] is a file-backed
//! implementation for the CLI and tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::tracker::enchant::EnchantmentInfo;
use crate::tracker::errors::TrackerError;
use crate::tracker::types::{AgentLocation, AgentRef, Position, WorldId};

/// A live trading agent seen in a world scan.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSighting {
    pub agent: AgentRef,
    pub location: AgentLocation,
}

pub trait AgentGateway {
    /// Current location of the agent, or `None` when it no longer exists or
    /// is not loaded.
    fn resolve_agent(&self, agent: &AgentRef) -> Option<AgentLocation>;

    /// Enchantment offers the agent currently holds. Empty for unknown agents.
    fn agent_offers(&self, agent: &AgentRef) -> Vec<EnchantmentInfo>;

    /// Every loaded agent in `world` that can sell enchantments.
    fn trading_agents(&self, world: &WorldId) -> Vec<AgentSighting>;

    /// Trading agents within a cube of half-size `radius` around `center`.
    fn trading_agents_near(
        &self,
        world: &WorldId,
        center: &Position,
        radius: f64,
    ) -> Vec<AgentSighting> {
        self.trading_agents(world)
            .into_iter()
            .filter(|sighting| center.within_cube(&sighting.location.position, radius))
            .collect()
    }
}

fn default_profession() -> String {
    "librarian".to_string()
}

/// One villager in a snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotAgent {
    pub id: AgentRef,
    pub world: WorldId,
    pub position: Position,
    #[serde(default = "default_profession")]
    pub profession: String,
    #[serde(default)]
    pub offers: Vec<EnchantmentInfo>,
}

impl SnapshotAgent {
    pub fn sells_enchantments(&self) -> bool {
        self.profession.eq_ignore_ascii_case("librarian")
    }
}

/// Point-in-time copy of the world, loadable from JSON.
///
/// ```json
/// { "agents": [ { "id": "…uuid…", "world": "world",
///                 "position": { "x": 1.5, "y": 64.0, "z": -3.2 },
///                 "offers": [ { "key": { "id": "mending", "level": 1 }, "price": 22 } ] } ] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    #[serde(default)]
    pub agents: Vec<SnapshotAgent>,
    #[serde(skip)]
    index: HashMap<AgentRef, usize>,
}

impl WorldSnapshot {
    pub fn new(agents: Vec<SnapshotAgent>) -> Self {
        let mut snapshot = Self {
            agents,
            index: HashMap::new(),
        };
        snapshot.reindex();
        snapshot
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TrackerError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let snapshot: WorldSnapshot = serde_json::from_str(&content)?;
        Ok(Self::new(snapshot.agents))
    }

    fn reindex(&mut self) {
        self.index = self
            .agents
            .iter()
            .enumerate()
            .map(|(pos, agent)| (agent.id, pos))
            .collect();
    }

    /// Add or replace an agent.
    pub fn put_agent(&mut self, agent: SnapshotAgent) {
        match self.index.get(&agent.id) {
            Some(&pos) => self.agents[pos] = agent,
            None => {
                self.index.insert(agent.id, self.agents.len());
                self.agents.push(agent);
            }
        }
    }

    /// Move an agent; returns false when it is not in the snapshot.
    pub fn move_agent(&mut self, agent: &AgentRef, world: WorldId, position: Position) -> bool {
        let Some(&pos) = self.index.get(agent) else {
            return false;
        };
        self.agents[pos].world = world;
        self.agents[pos].position = position;
        true
    }

    /// Unload an agent; later lookups resolve to `None`.
    pub fn remove_agent(&mut self, agent: &AgentRef) -> bool {
        if self.index.remove(agent).is_none() {
            return false;
        }
        self.agents.retain(|a| &a.id != agent);
        self.reindex();
        true
    }

    fn agent(&self, agent: &AgentRef) -> Option<&SnapshotAgent> {
        self.index.get(agent).map(|&pos| &self.agents[pos])
    }
}

impl AgentGateway for WorldSnapshot {
    fn resolve_agent(&self, agent: &AgentRef) -> Option<AgentLocation> {
        self.agent(agent)
            .map(|a| AgentLocation::new(a.world.clone(), a.position))
    }

    fn agent_offers(&self, agent: &AgentRef) -> Vec<EnchantmentInfo> {
        self.agent(agent)
            .map(|a| a.offers.clone())
            .unwrap_or_default()
    }

    fn trading_agents(&self, world: &WorldId) -> Vec<AgentSighting> {
        self.agents
            .iter()
            .filter(|a| &a.world == world && a.sells_enchantments())
            .map(|a| AgentSighting {
                agent: a.id,
                location: AgentLocation::new(a.world.clone(), a.position),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn librarian(world: &str, x: f64) -> SnapshotAgent {
        SnapshotAgent {
            id: AgentRef::random(),
            world: WorldId::from(world),
            position: Position::new(x, 64.0, 0.0),
            profession: default_profession(),
            offers: vec![EnchantmentInfo::new("mending", 1, Some(20))],
        }
    }

    #[test]
    fn removed_agents_stop_resolving() {
        let a = librarian("world", 0.0);
        let b = librarian("world", 5.0);
        let (a_id, b_id) = (a.id, b.id);
        let mut world = WorldSnapshot::new(vec![a, b]);
        assert!(world.remove_agent(&a_id));
        assert!(world.resolve_agent(&a_id).is_none());
        assert!(world.agent_offers(&a_id).is_empty());
        assert_eq!(
            world.resolve_agent(&b_id).map(|loc| loc.position.x),
            Some(5.0)
        );
    }

    #[test]
    fn nearby_scan_is_world_scoped_and_skips_other_professions() {
        let mut farmer = librarian("world", 1.0);
        farmer.profession = "farmer".into();
        let near = librarian("world", 3.0);
        let far = librarian("world", 40.0);
        let nether = librarian("world_nether", 2.0);
        let near_id = near.id;
        let world = WorldSnapshot::new(vec![farmer, near, far, nether]);
        let found = world.trading_agents_near(
            &WorldId::from("world"),
            &Position::new(0.0, 64.0, 0.0),
            10.0,
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].agent, near_id);
    }

    #[test]
    fn snapshot_parses_from_json() {
        let json = r#"{ "agents": [ { "id": "6f1c1b9e-8a55-4c2b-9d0e-3b6a1f2c4d5e",
            "world": "world", "position": { "x": 1.5, "y": 64.0, "z": -3.2 },
            "offers": [ { "key": { "id": "Minecraft:Mending", "level": 1 }, "price": 22 } ] } ] }"#;
        let parsed: WorldSnapshot = serde_json::from_str(json).unwrap();
        let world = WorldSnapshot::new(parsed.agents);
        let agent: AgentRef = "6f1c1b9e-8a55-4c2b-9d0e-3b6a1f2c4d5e".parse().unwrap();
        let offers = world.agent_offers(&agent);
        assert_eq!(offers[0].id().as_str(), "minecraft:mending");
        assert_eq!(offers[0].price, Some(22));
    }
}
