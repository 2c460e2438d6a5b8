//! Enchantment catalog and coverage diff.
//!
//! The catalog lists every enchantment a librarian can sell, at its maximum
//! level. [`compute_coverage`] splits it against the offers already discovered:
//! a catalog entry is covered as soon as *any* discovered offer for the same
//! enchantment reaches its level, so one high-level offer covers every lower
//! target for that id.

use std::collections::HashMap;

use crate::config::CatalogConfig;
use crate::tracker::enchant::{EnchantmentId, EnchantmentInfo, EnchantmentKey, OfferSet};
use crate::tracker::gateway::AgentGateway;
use crate::tracker::types::AgentRef;

/// Static description of one vanilla enchantment.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub max_level: u32,
    pub curse: bool,
    /// False for enchantments only found as loot (never sold by librarians).
    pub villager_tradeable: bool,
}

const fn tradeable(id: &'static str, max_level: u32) -> CatalogEntry {
    CatalogEntry {
        id,
        max_level,
        curse: false,
        villager_tradeable: true,
    }
}

const fn loot_only(id: &'static str, max_level: u32) -> CatalogEntry {
    CatalogEntry {
        id,
        max_level,
        curse: false,
        villager_tradeable: false,
    }
}

const fn curse(id: &'static str) -> CatalogEntry {
    CatalogEntry {
        id,
        max_level: 1,
        curse: true,
        villager_tradeable: true,
    }
}

pub const VANILLA_ENCHANTMENTS: &[CatalogEntry] = &[
    tradeable("aqua_affinity", 1),
    tradeable("bane_of_arthropods", 5),
    curse("binding_curse"),
    tradeable("blast_protection", 4),
    loot_only("breach", 4),
    tradeable("channeling", 1),
    loot_only("density", 5),
    tradeable("depth_strider", 3),
    tradeable("efficiency", 5),
    tradeable("feather_falling", 4),
    tradeable("fire_aspect", 2),
    tradeable("fire_protection", 4),
    tradeable("flame", 1),
    tradeable("fortune", 3),
    tradeable("frost_walker", 2),
    tradeable("impaling", 5),
    tradeable("infinity", 1),
    tradeable("knockback", 2),
    tradeable("looting", 3),
    tradeable("loyalty", 3),
    tradeable("luck_of_the_sea", 3),
    tradeable("lure", 3),
    tradeable("mending", 1),
    tradeable("multishot", 1),
    tradeable("piercing", 4),
    tradeable("power", 5),
    tradeable("projectile_protection", 4),
    tradeable("protection", 4),
    tradeable("punch", 2),
    tradeable("quick_charge", 3),
    tradeable("respiration", 3),
    tradeable("riptide", 3),
    tradeable("sharpness", 5),
    tradeable("silk_touch", 1),
    tradeable("smite", 5),
    loot_only("soul_speed", 3),
    tradeable("sweeping_edge", 3),
    loot_only("swift_sneak", 3),
    tradeable("thorns", 3),
    tradeable("unbreaking", 3),
    curse("vanishing_curse"),
    loot_only("wind_burst", 3),
];

/// The enchantments obtainable through librarian trades, each at max level.
#[derive(Debug, Clone)]
pub struct TradeCatalog {
    max_levels: Vec<(EnchantmentId, u32)>,
}

impl TradeCatalog {
    /// Vanilla table minus curses and loot-only enchantments.
    pub fn vanilla() -> Self {
        Self::from_config(&CatalogConfig::default())
    }

    /// Vanilla table with operator exclusions and max-level overrides applied.
    pub fn from_config(config: &CatalogConfig) -> Self {
        let excluded: Vec<EnchantmentId> = config
            .excluded
            .iter()
            .map(|raw| EnchantmentId::new(raw))
            .collect();
        let overrides: HashMap<EnchantmentId, u32> = config
            .max_level_overrides
            .iter()
            .map(|(raw, level)| (EnchantmentId::new(raw), *level))
            .collect();

        let max_levels = VANILLA_ENCHANTMENTS
            .iter()
            .filter(|entry| !entry.curse && entry.villager_tradeable)
            .map(|entry| {
                let id = EnchantmentId::new(entry.id);
                let level = overrides.get(&id).copied().unwrap_or(entry.max_level);
                (id, level)
            })
            .filter(|(id, level)| *level >= 1 && !excluded.contains(id))
            .collect();
        Self { max_levels }
    }

    /// Build from explicit `(id, max level)` pairs.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let mut max_levels: Vec<(EnchantmentId, u32)> = Vec::new();
        for (raw, level) in entries {
            let id = EnchantmentId::new(raw.as_ref());
            match max_levels.iter_mut().find(|(existing, _)| *existing == id) {
                Some(slot) => slot.1 = level,
                None => max_levels.push((id, level)),
            }
        }
        Self { max_levels }
    }

    /// The catalog snapshot: one unpriced entry per enchantment at max level.
    pub fn max_level_snapshot(&self) -> Vec<EnchantmentInfo> {
        self.max_levels
            .iter()
            .map(|(id, level)| EnchantmentInfo::unpriced(id.clone(), *level))
            .collect()
    }

    pub fn max_level(&self, id: &EnchantmentId) -> Option<u32> {
        self.max_levels
            .iter()
            .find(|(known, _)| known == id)
            .map(|(_, level)| *level)
    }

    /// `1 <= level <= max level` for a catalog enchantment.
    pub fn is_valid_level(&self, id: &EnchantmentId, level: u32) -> bool {
        self.max_level(id).is_some_and(|max| level >= 1 && level <= max)
    }

    pub fn contains(&self, id: &EnchantmentId) -> bool {
        self.max_level(id).is_some()
    }

    /// Sorted catalog ids.
    pub fn enchant_ids(&self) -> Vec<EnchantmentId> {
        let mut ids: Vec<_> = self.max_levels.iter().map(|(id, _)| id.clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.max_levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.max_levels.is_empty()
    }
}

/// Result of a coverage diff.
#[derive(Debug, Clone, Default)]
pub struct Coverage {
    /// Catalog entries no discovered offer reaches.
    pub new: Vec<EnchantmentInfo>,
    /// Every discovered offer, unfiltered.
    pub existing: Vec<EnchantmentInfo>,
}

impl Coverage {
    pub fn is_complete(&self) -> bool {
        self.new.is_empty()
    }
}

/// Split `catalog` into entries still missing from `discovered`.
///
/// Catalog entries are de-duplicated by identity. Both output lists are
/// sorted by `(id, level)`.
pub fn compute_coverage<'a, I>(catalog: I, discovered: &OfferSet) -> Coverage
where
    I: IntoIterator<Item = &'a EnchantmentInfo>,
{
    let mut best: HashMap<&EnchantmentId, &EnchantmentInfo> = HashMap::new();
    for offer in discovered.iter() {
        let slot = best.entry(offer.id()).or_insert(offer);
        if offer.level() > slot.level() {
            *slot = offer;
        }
    }

    let mut targets = OfferSet::new();
    targets.extend(catalog.into_iter().cloned());

    let new: Vec<EnchantmentInfo> = targets
        .into_sorted_vec()
        .into_iter()
        .filter(|target| !is_covered(&best, target.identity()))
        .collect();

    Coverage {
        new,
        existing: discovered.clone().into_sorted_vec(),
    }
}

fn is_covered(best: &HashMap<&EnchantmentId, &EnchantmentInfo>, target: &EnchantmentKey) -> bool {
    best.get(&target.id)
        .is_some_and(|offer| offer.can_replace(target))
}

/// Union of the live offers of `agents`, first price seen wins.
pub fn aggregate_discovered<'a, G, I>(gateway: &G, agents: I) -> OfferSet
where
    G: AgentGateway + ?Sized,
    I: IntoIterator<Item = &'a AgentRef>,
{
    let mut discovered = OfferSet::new();
    for agent in agents {
        let offers = gateway.agent_offers(agent);
        let added = discovered.extend(offers);
        log::debug!("agent {} contributed {} new offers", agent, added);
    }
    discovered
}
