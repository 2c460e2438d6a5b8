//! The tracker context handed to command handlers.
//!
//! [`Tracker`] owns the store and the trade catalog; the live world is passed
//! in per call. Every storage fault is logged here and turned into `false`,
//! `None` or an empty list, so a command handler always gets a usable answer.
//! Only request-level problems (duplicate or empty region names, corners in
//! two worlds) come back as [`RequestError`].

use std::collections::HashSet;
use std::path::Path;

use log::{debug, error, info, warn};

use crate::config::Config;
use crate::logutil::escape_log;
use crate::tracker::catalog::{aggregate_discovered, compute_coverage, Coverage, TradeCatalog};
use crate::tracker::enchant::{EnchantmentId, OfferSet};
use crate::tracker::errors::{RequestError, TrackerError};
use crate::tracker::gateway::{AgentGateway, AgentSighting};
use crate::tracker::resolver;
use crate::tracker::storage::{TrackerStore, TrackerStoreBuilder};
use crate::tracker::types::{
    AgentLocation, AgentRef, NewTrade, Position, RegionRecord, Trade, WorldId,
};

/// Sub-directory of `storage.data_dir` holding the sled database.
pub const STORE_DIR_NAME: &str = "tracker";

/// Coverage diff plus how many villagers fed it.
#[derive(Debug, Clone, Default)]
pub struct CoverageReport {
    pub coverage: Coverage,
    pub agents_scanned: usize,
}

/// Which regions a region-scoped coverage query reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSelector {
    All,
    Named(String),
}

impl RegionSelector {
    /// `all` (any case) or `*` select every region; anything else is an exact name.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == "*" || trimmed.eq_ignore_ascii_case("all") {
            RegionSelector::All
        } else {
            RegionSelector::Named(trimmed.to_string())
        }
    }
}

pub struct Tracker {
    store: TrackerStore,
    catalog: TradeCatalog,
}

impl Tracker {
    pub fn new(store: TrackerStore, catalog: TradeCatalog) -> Self {
        Self { store, catalog }
    }

    /// Open the store under `config.storage.data_dir` with the configured catalog.
    pub fn open(config: &Config) -> Result<Self, TrackerError> {
        let path = Path::new(&config.storage.data_dir).join(STORE_DIR_NAME);
        let store = TrackerStoreBuilder::new(path).open()?;
        Ok(Self::new(store, TradeCatalog::from_config(&config.catalog)))
    }

    pub fn catalog(&self) -> &TradeCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &TrackerStore {
        &self.store
    }

    fn absorb<T: Default>(operation: &str, result: Result<T, TrackerError>) -> T {
        result.unwrap_or_else(|e| {
            error!("{} failed: {}", operation, e);
            T::default()
        })
    }

    // ------------------------------------------------------------------
    // Regions
    // ------------------------------------------------------------------

    pub fn create_region(
        &self,
        name: &str,
        min: &AgentLocation,
        max: &AgentLocation,
    ) -> Result<u64, RequestError> {
        if min.world != max.world {
            return Err(RequestError::WorldMismatch);
        }
        let id = self
            .store
            .create_region(name, &min.world, min.position, max.position)?;
        info!(
            "created region #{} '{}' in {} {} -> {}",
            id,
            escape_log(name),
            min.world,
            min.position,
            max.position
        );
        Ok(id)
    }

    pub fn delete_region(&self, id: u64) -> bool {
        let removed = Self::absorb("delete_region", self.store.delete_region(id));
        if removed {
            info!("deleted region #{}", id);
        } else {
            warn!("delete_region: no region #{}", id);
        }
        removed
    }

    pub fn list_regions(&self) -> Vec<RegionRecord> {
        Self::absorb("list_regions", self.store.list_regions())
    }

    pub fn get_region(&self, id: u64) -> Option<RegionRecord> {
        Self::absorb("get_region", self.store.get_region(id))
    }

    pub fn get_region_by_name(&self, name: &str) -> Option<RegionRecord> {
        Self::absorb("get_region_by_name", self.store.get_region_by_name(name))
    }

    /// `Ok(false)` when the id is unknown.
    pub fn update_region_name(&self, id: u64, new_name: &str) -> Result<bool, RequestError> {
        let renamed = self.store.update_region_name(id, new_name)?;
        if renamed {
            info!("renamed region #{} to '{}'", id, escape_log(new_name));
        }
        Ok(renamed)
    }

    /// Region currently containing `point` in `world`.
    pub fn resolve_region(&self, world: &WorldId, point: &Position) -> Option<RegionRecord> {
        let regions = self.list_regions();
        resolver::resolve_region(&regions, world, point).cloned()
    }

    // ------------------------------------------------------------------
    // Trades
    // ------------------------------------------------------------------

    /// Store a trade. Level 0 and blank enchantment ids are refused; levels
    /// outside the catalog are stored but logged.
    pub fn upsert_trade(&self, trade: NewTrade) -> bool {
        if trade.level > 0 && !self.catalog.is_valid_level(&trade.enchant, trade.level) {
            warn!(
                "upsert_trade: {} {} is not a catalog level",
                trade.enchant, trade.level
            );
        }
        let description = escape_log(&trade.description);
        match self.store.upsert_trade(trade) {
            Ok(record) => {
                info!(
                    "stored trade #{}: {} {} for {} emeralds from {} ({})",
                    record.id, record.enchant, record.level, record.price, record.agent, description
                );
                true
            }
            Err(TrackerError::InvalidTrade(reason)) => {
                warn!("upsert_trade rejected: {}", reason);
                false
            }
            Err(e) => {
                error!("upsert_trade failed: {}", e);
                false
            }
        }
    }

    pub fn search_trades<G: AgentGateway + ?Sized>(&self, enchant: &str, gateway: &G) -> Vec<Trade> {
        let wanted = EnchantmentId::new(enchant);
        let records = Self::absorb("search_trades", self.store.search_trades(wanted.as_str()));
        debug!("search {}: {} stored trades", wanted, records.len());
        resolver::annotate_trades(records, &self.list_regions(), gateway)
    }

    pub fn list_trades<G: AgentGateway + ?Sized>(&self, gateway: &G) -> Vec<Trade> {
        let records = Self::absorb("list_trades", self.store.list_trades());
        resolver::annotate_trades(records, &self.list_regions(), gateway)
    }

    pub fn trades_by_agent<G: AgentGateway + ?Sized>(&self, agent: &AgentRef, gateway: &G) -> Vec<Trade> {
        let records = Self::absorb("trades_by_agent", self.store.trades_by_agent(agent));
        resolver::annotate_trades(records, &self.list_regions(), gateway)
    }

    /// Trades whose villager is inside region `region_id` right now.
    pub fn trades_in_region<G: AgentGateway + ?Sized>(&self, region_id: u64, gateway: &G) -> Vec<Trade> {
        let Some(region) = self.get_region(region_id) else {
            debug!("trades_in_region: no region #{}", region_id);
            return Vec::new();
        };
        let records = Self::absorb("trades_in_region", self.store.list_trades());
        resolver::trades_in_region(records, &region, gateway)
    }

    pub fn delete_trade(&self, id: u64) -> bool {
        let removed = Self::absorb("delete_trade", self.store.delete_trade(id));
        if removed {
            info!("deleted trade #{}", id);
        } else {
            warn!("delete_trade: no trade #{}", id);
        }
        removed
    }

    pub fn update_trade_description(&self, id: u64, description: &str) -> bool {
        let updated = Self::absorb(
            "update_trade_description",
            self.store.update_trade_description(id, description),
        );
        if updated {
            info!("trade #{} description set to '{}'", id, escape_log(description));
        }
        updated
    }

    /// Store one trade per live offer of `agent`. Returns how many were stored;
    /// offers refused by [`Tracker::upsert_trade`] are skipped.
    pub fn register_agent_offers<G: AgentGateway + ?Sized>(
        &self,
        agent: &AgentRef,
        description: &str,
        gateway: &G,
    ) -> usize {
        if gateway.resolve_agent(agent).is_none() {
            warn!("register_agent_offers: agent {} is not loaded", agent);
            return 0;
        }
        let mut stored = 0;
        for offer in gateway.agent_offers(agent) {
            if self.upsert_trade(NewTrade::from_offer(*agent, &offer, description)) {
                stored += 1;
            }
        }
        stored
    }

    // ------------------------------------------------------------------
    // Coverage
    // ------------------------------------------------------------------

    /// Diff the catalog against an already assembled discovered set.
    pub fn compute_coverage(&self, discovered: &OfferSet) -> Coverage {
        let snapshot = self.catalog.max_level_snapshot();
        let coverage = compute_coverage(&snapshot, discovered);
        debug!(
            "coverage: catalog {}, existing {}, new {}",
            snapshot.len(),
            coverage.existing.len(),
            coverage.new.len()
        );
        coverage
    }

    fn report<G: AgentGateway + ?Sized>(&self, sightings: &[AgentSighting], gateway: &G) -> CoverageReport {
        let discovered = aggregate_discovered(gateway, sightings.iter().map(|s| &s.agent));
        CoverageReport {
            coverage: self.compute_coverage(&discovered),
            agents_scanned: sightings.len(),
        }
    }

    /// Coverage from every trading villager within `radius` of `center`.
    pub fn coverage_nearby<G: AgentGateway + ?Sized>(
        &self,
        gateway: &G,
        world: &WorldId,
        center: &Position,
        radius: f64,
    ) -> CoverageReport {
        let sightings = gateway.trading_agents_near(world, center, radius);
        debug!(
            "nearby scan {} r={}: {} villagers",
            center,
            radius,
            sightings.len()
        );
        self.report(&sightings, gateway)
    }

    /// Coverage from villagers currently inside the selected regions.
    ///
    /// `None` when the selector names a region that does not exist, or there
    /// are no regions at all. A villager inside two selected regions counts once.
    pub fn coverage_in_regions<G: AgentGateway + ?Sized>(
        &self,
        gateway: &G,
        selector: &RegionSelector,
    ) -> Option<CoverageReport> {
        let regions = match selector {
            RegionSelector::All => self.list_regions(),
            RegionSelector::Named(name) => self.get_region_by_name(name).into_iter().collect(),
        };
        if regions.is_empty() {
            warn!("coverage_in_regions: no region matches {:?}", selector);
            return None;
        }

        let mut seen: HashSet<AgentRef> = HashSet::new();
        let mut sightings = Vec::new();
        for region in &regions {
            let inside: Vec<AgentSighting> = gateway
                .trading_agents(&region.world)
                .into_iter()
                .filter(|s| region.contains_location(&s.location))
                .collect();
            debug!("region '{}': {} villagers", escape_log(&region.name), inside.len());
            sightings.extend(inside.into_iter().filter(|s| seen.insert(s.agent)));
        }
        Some(self.report(&sightings, gateway))
    }
}
