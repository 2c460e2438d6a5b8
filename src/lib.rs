//! # vetrack - Villager Enchantment Trade Tracker
//!
//! Keeps a durable catalog of enchanted-book trades offered by villagers,
//! groups them into named regions, and reports which enchantments are still
//! missing from the trades players have found.
//!
//! ## Features
//!
//! - **Trade Store**: one row per `(villager, enchantment)`; re-discovering an offer replaces it.
//! - **Regions**: named, world-scoped boxes with unique names.
//! - **Live Region Lookup**: a trade's region comes from where its villager stands *now*.
//! - **Coverage Diff**: catalog entries not yet reached by any discovered offer.
//! - **Identifier Normalization**: `Fortune`, `minecraft:minecraft:fortune` and
//!   `enchantments.fortune` all become `minecraft:fortune`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vetrack::config::Config;
//! use vetrack::tracker::{RegionSelector, Tracker, WorldSnapshot};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml")?;
//!     let tracker = Tracker::open(&config)?;
//!     let world = WorldSnapshot::load("world.json")?;
//!
//!     for trade in tracker.search_trades("mending", &world) {
//!         println!("#{} {:?}", trade.id, trade.region_name);
//!     }
//!     if let Some(report) = tracker.coverage_in_regions(&world, &RegionSelector::All) {
//!         println!("{} enchantments still missing", report.coverage.new.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`tracker`] - store, spatial resolver, catalog and the [`tracker::Tracker`] context
//! - [`config`] - configuration loading and defaults
//! - [`logutil`] - single-line escaping for user text in logs
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Command / UI   │ ← external (chat, menus, particles)
//! └─────────────────┘
//!          │
//! ┌─────────────────┐      ┌─────────────────┐
//! │    Tracker      │ ───→ │  AgentGateway   │ ← live villager positions/offers
//! └─────────────────┘      └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  TrackerStore   │ ← sled persistence
//! └─────────────────┘
//! ```

pub mod config;
pub mod logutil;
pub mod tracker;
