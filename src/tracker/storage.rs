use std::path::{Path, PathBuf};

use chrono::Utc;
use sled::transaction::{ConflictableTransactionError, Transactional};
use sled::IVec;

use crate::tracker::enchant::EnchantmentId;
use crate::tracker::errors::TrackerError;
use crate::tracker::types::{
    AgentRef, NewTrade, Position, RegionRecord, TradeRecord, WorldId, REGION_SCHEMA_VERSION,
    TRADE_SCHEMA_VERSION,
};

const TREE_REGIONS: &str = "regions";
const TREE_REGION_NAMES: &str = "region_names";
const TREE_TRADES: &str = "trades";
const TREE_TRADE_KEYS: &str = "trade_keys";

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct TrackerStoreBuilder {
    path: PathBuf,
    flush_every_write: bool,
}

impl TrackerStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flush_every_write: true,
        }
    }

    /// Skip the fsync after each write (bulk imports, tests).
    pub fn without_flush(mut self) -> Self {
        self.flush_every_write = false;
        self
    }

    pub fn open(self) -> Result<TrackerStore, TrackerError> {
        TrackerStore::open_with_options(self.path, self.flush_every_write)
    }
}

/// Sled-backed tables for regions and trades.
///
/// Records are keyed by big-endian id so iteration follows creation order.
/// Two index trees enforce the unique keys: region name, and
/// `(agent, enchantment)` for trades.
pub struct TrackerStore {
    db: sled::Db,
    regions: sled::Tree,
    region_names: sled::Tree,
    trades: sled::Tree,
    trade_keys: sled::Tree,
    flush_every_write: bool,
}

impl TrackerStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TrackerError> {
        Self::open_with_options(path, true)
    }

    fn open_with_options<P: AsRef<Path>>(
        path: P,
        flush_every_write: bool,
    ) -> Result<Self, TrackerError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let regions = db.open_tree(TREE_REGIONS)?;
        let region_names = db.open_tree(TREE_REGION_NAMES)?;
        let trades = db.open_tree(TREE_TRADES)?;
        let trade_keys = db.open_tree(TREE_TRADE_KEYS)?;
        Ok(Self {
            db,
            regions,
            region_names,
            trades,
            trade_keys,
            flush_every_write,
        })
    }

    fn id_key(id: u64) -> [u8; 8] {
        id.to_be_bytes()
    }

    fn decode_id(bytes: &[u8], tree: &'static str) -> Result<u64, TrackerError> {
        let raw: [u8; 8] = bytes
            .try_into()
            .map_err(|_| TrackerError::CorruptIndex(tree))?;
        Ok(u64::from_be_bytes(raw))
    }

    fn trade_key(agent: &AgentRef, enchant: &EnchantmentId) -> Vec<u8> {
        format!("{}|{}", agent, enchant).into_bytes()
    }

    fn agent_prefix(agent: &AgentRef) -> Vec<u8> {
        format!("{}|", agent).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, TrackerError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, TrackerError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    fn next_id(&self) -> Result<u64, TrackerError> {
        // generate_id starts at 0; ids handed out to callers start at 1
        Ok(self.db.generate_id()? + 1)
    }

    fn flush(&self) -> Result<(), TrackerError> {
        if self.flush_every_write {
            self.db.flush()?;
        }
        Ok(())
    }

    fn decode_region(bytes: IVec) -> Result<RegionRecord, TrackerError> {
        let record: RegionRecord = Self::deserialize(bytes)?;
        if record.schema_version != REGION_SCHEMA_VERSION {
            return Err(TrackerError::SchemaMismatch {
                entity: "region",
                expected: REGION_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    fn decode_trade(bytes: IVec) -> Result<TradeRecord, TrackerError> {
        let record: TradeRecord = Self::deserialize(bytes)?;
        if record.schema_version != TRADE_SCHEMA_VERSION {
            return Err(TrackerError::SchemaMismatch {
                entity: "trade",
                expected: TRADE_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Regions
    // ------------------------------------------------------------------

    /// Create a region from two corners given in any order. Returns the new id.
    pub fn create_region(
        &self,
        name: &str,
        world: &WorldId,
        corner_a: Position,
        corner_b: Position,
    ) -> Result<u64, TrackerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrackerError::InvalidRegion("name must not be empty".into()));
        }
        let coords = [
            corner_a.x, corner_a.y, corner_a.z, corner_b.x, corner_b.y, corner_b.z,
        ];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(TrackerError::InvalidRegion(
                "corner coordinates must be finite".into(),
            ));
        }

        let mut record = RegionRecord::new(name, world.clone(), corner_a, corner_b);
        record.id = self.next_id()?;
        let key = Self::id_key(record.id);
        let bytes = Self::serialize(&record)?;

        (&self.regions, &self.region_names).transaction(|(regions, names)| {
            if names.get(name.as_bytes())?.is_some() {
                return Err(ConflictableTransactionError::Abort(
                    TrackerError::DuplicateName(name.to_string()),
                ));
            }
            regions.insert(&key[..], bytes.clone())?;
            names.insert(name.as_bytes(), &key[..])?;
            Ok(())
        })?;
        self.flush()?;
        Ok(record.id)
    }

    /// Remove a region. Returns false when no region has this id.
    pub fn delete_region(&self, id: u64) -> Result<bool, TrackerError> {
        let key = Self::id_key(id);
        let removed = (&self.regions, &self.region_names).transaction(|(regions, names)| {
            let Some(bytes) = regions.remove(&key[..])? else {
                return Ok(false);
            };
            let record = Self::decode_region(bytes).map_err(ConflictableTransactionError::Abort)?;
            names.remove(record.name.as_bytes())?;
            Ok(true)
        })?;
        if removed {
            self.flush()?;
        }
        Ok(removed)
    }

    /// All regions in creation order.
    pub fn list_regions(&self) -> Result<Vec<RegionRecord>, TrackerError> {
        self.regions
            .iter()
            .map(|entry| {
                entry
                    .map_err(TrackerError::from)
                    .and_then(|(_key, value)| Self::decode_region(value))
            })
            .collect()
    }

    pub fn get_region(&self, id: u64) -> Result<Option<RegionRecord>, TrackerError> {
        match self.regions.get(Self::id_key(id))? {
            Some(bytes) => Ok(Some(Self::decode_region(bytes)?)),
            None => Ok(None),
        }
    }

    /// Exact, case-sensitive name lookup.
    pub fn get_region_by_name(&self, name: &str) -> Result<Option<RegionRecord>, TrackerError> {
        let Some(id_bytes) = self.region_names.get(name.as_bytes())? else {
            return Ok(None);
        };
        let id = Self::decode_id(&id_bytes, TREE_REGION_NAMES)?;
        self.get_region(id)
    }

    /// Rename a region. `Ok(false)` when the id is unknown, `DuplicateName`
    /// when another region already uses `new_name`.
    pub fn update_region_name(&self, id: u64, new_name: &str) -> Result<bool, TrackerError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(TrackerError::InvalidRegion("name must not be empty".into()));
        }
        let key = Self::id_key(id);
        let renamed = (&self.regions, &self.region_names).transaction(|(regions, names)| {
            let Some(bytes) = regions.get(&key[..])? else {
                return Ok(false);
            };
            let mut record =
                Self::decode_region(bytes).map_err(ConflictableTransactionError::Abort)?;
            if record.name == new_name {
                return Ok(true);
            }
            if names.get(new_name.as_bytes())?.is_some() {
                return Err(ConflictableTransactionError::Abort(
                    TrackerError::DuplicateName(new_name.to_string()),
                ));
            }
            names.remove(record.name.as_bytes())?;
            names.insert(new_name.as_bytes(), &key[..])?;
            record.name = new_name.to_string();
            let bytes = Self::serialize(&record).map_err(ConflictableTransactionError::Abort)?;
            regions.insert(&key[..], bytes)?;
            Ok(true)
        })?;
        if renamed {
            self.flush()?;
        }
        Ok(renamed)
    }

    // ------------------------------------------------------------------
    // Trades
    // ------------------------------------------------------------------

    /// Insert or replace the trade for `(agent, enchant)`.
    ///
    /// A replaced row keeps its id; level, price and description take the
    /// new values. Returns the stored record. A blank enchantment or level 0
    /// is rejected with `InvalidTrade`.
    pub fn upsert_trade(&self, trade: NewTrade) -> Result<TradeRecord, TrackerError> {
        let enchant = EnchantmentId::new(trade.enchant.as_str());
        if enchant.path().is_empty() {
            return Err(TrackerError::InvalidTrade(
                "enchantment id must not be empty".into(),
            ));
        }
        if trade.level == 0 {
            return Err(TrackerError::InvalidTrade(format!(
                "{} level must be at least 1",
                enchant
            )));
        }
        let index_key = Self::trade_key(&trade.agent, &enchant);
        let fresh_id = self.next_id()?;

        let stored = (&self.trades, &self.trade_keys).transaction(|(trades, keys)| {
            let id = match keys.get(&index_key)? {
                Some(existing) => Self::decode_id(&existing, TREE_TRADE_KEYS)
                    .map_err(ConflictableTransactionError::Abort)?,
                None => fresh_id,
            };
            let record = TradeRecord {
                id,
                agent: trade.agent,
                enchant: enchant.clone(),
                level: trade.level,
                price: trade.price,
                description: trade.description.clone(),
                updated_at: Utc::now(),
                schema_version: TRADE_SCHEMA_VERSION,
            };
            let key = Self::id_key(id);
            let bytes = Self::serialize(&record).map_err(ConflictableTransactionError::Abort)?;
            trades.insert(&key[..], bytes)?;
            keys.insert(index_key.clone(), &key[..])?;
            Ok(record)
        })?;
        self.flush()?;
        Ok(stored)
    }

    pub fn get_trade(&self, id: u64) -> Result<Option<TradeRecord>, TrackerError> {
        match self.trades.get(Self::id_key(id))? {
            Some(bytes) => Ok(Some(Self::decode_trade(bytes)?)),
            None => Ok(None),
        }
    }

    /// All trades in creation order.
    pub fn list_trades(&self) -> Result<Vec<TradeRecord>, TrackerError> {
        self.trades
            .iter()
            .map(|entry| {
                entry
                    .map_err(TrackerError::from)
                    .and_then(|(_key, value)| Self::decode_trade(value))
            })
            .collect()
    }

    /// Trades for one enchantment, matched on the normalized id.
    pub fn search_trades(&self, enchant: &str) -> Result<Vec<TradeRecord>, TrackerError> {
        let wanted = EnchantmentId::new(enchant);
        Ok(self
            .list_trades()?
            .into_iter()
            .filter(|record| record.enchant == wanted)
            .collect())
    }

    /// Trades recorded for one villager, in creation order.
    pub fn trades_by_agent(&self, agent: &AgentRef) -> Result<Vec<TradeRecord>, TrackerError> {
        let mut records = Vec::new();
        for entry in self.trade_keys.scan_prefix(Self::agent_prefix(agent)) {
            let (_, id_bytes) = entry?;
            let id = Self::decode_id(&id_bytes, TREE_TRADE_KEYS)?;
            if let Some(record) = self.get_trade(id)? {
                records.push(record);
            }
        }
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    /// Remove a trade. Returns false when no trade has this id.
    pub fn delete_trade(&self, id: u64) -> Result<bool, TrackerError> {
        let key = Self::id_key(id);
        let removed = (&self.trades, &self.trade_keys).transaction(|(trades, keys)| {
            let Some(bytes) = trades.remove(&key[..])? else {
                return Ok(false);
            };
            let record = Self::decode_trade(bytes).map_err(ConflictableTransactionError::Abort)?;
            keys.remove(Self::trade_key(&record.agent, &record.enchant))?;
            Ok(true)
        })?;
        if removed {
            self.flush()?;
        }
        Ok(removed)
    }

    /// Replace a trade's description. Returns false when no trade has this id.
    pub fn update_trade_description(&self, id: u64, description: &str) -> Result<bool, TrackerError> {
        let key = Self::id_key(id);
        let Some(bytes) = self.trades.get(key)? else {
            return Ok(false);
        };
        let mut record = Self::decode_trade(bytes)?;
        record.description = description.to_string();
        record.updated_at = Utc::now();
        self.trades.insert(key, Self::serialize(&record)?)?;
        self.flush()?;
        Ok(true)
    }

    pub fn count_trades(&self) -> usize {
        self.trades.len()
    }
}
