//! Trade and region catalog engine.
//!
//! Villager enchantment trades and named regions are persisted in sled;
//! region membership and coverage are computed on each read from the live
//! world behind [`AgentGateway`].

pub mod catalog;
pub mod enchant;
pub mod errors;
pub mod gateway;
pub mod resolver;
pub mod service;
pub mod storage;
pub mod types;

pub use catalog::{
    aggregate_discovered, compute_coverage, CatalogEntry, Coverage, TradeCatalog,
    VANILLA_ENCHANTMENTS,
};
pub use enchant::{
    normalize_enchant_id, EnchantmentId, EnchantmentInfo, EnchantmentKey, OfferSet,
    CANONICAL_NAMESPACE, LOOKUP_KEY_PREFIX,
};
pub use errors::{RequestError, TrackerError};
pub use gateway::{AgentGateway, AgentSighting, SnapshotAgent, WorldSnapshot};
pub use resolver::{annotate_trade, annotate_trades, resolve_location, resolve_region};
pub use service::{CoverageReport, RegionSelector, Tracker, STORE_DIR_NAME};
pub use storage::{TrackerStore, TrackerStoreBuilder};
pub use types::*;
