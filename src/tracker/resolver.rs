//! Region membership from live positions.
//!
//! A trade's region is never stored. Each read asks the gateway where the
//! villager is now and finds the containing region, so villagers that wandered
//! off (or regions created after the trade) are always reflected.
//!
//! When regions overlap the first one in store listing order wins. That order
//! is creation order; it is stable but carries no meaning.

use std::collections::HashSet;

use log::debug;

use crate::tracker::gateway::AgentGateway;
use crate::tracker::types::{AgentLocation, Position, RegionRecord, Trade, TradeRecord, WorldId};

/// First region (in `regions` order) in `world` that contains `point`.
pub fn resolve_region<'a>(
    regions: &'a [RegionRecord],
    world: &WorldId,
    point: &Position,
) -> Option<&'a RegionRecord> {
    regions.iter().find(|region| region.contains(world, point))
}

/// Region for an agent location, see [`resolve_region`].
pub fn resolve_location<'a>(
    regions: &'a [RegionRecord],
    location: &AgentLocation,
) -> Option<&'a RegionRecord> {
    resolve_region(regions, &location.world, &location.position)
}

/// Attach the agent's current location and region to a stored trade.
///
/// Unresolvable agents still produce a trade, with no location or region.
pub fn annotate_trade<G>(record: TradeRecord, regions: &[RegionRecord], gateway: &G) -> Trade
where
    G: AgentGateway + ?Sized,
{
    let location = gateway.resolve_agent(&record.agent);
    let mut trade = Trade::unresolved(record);
    match location {
        Some(location) => {
            trade.region_name = resolve_location(regions, &location).map(|r| r.name.clone());
            trade.location = Some(location);
        }
        None => debug!("agent {} for trade #{} is not loaded", trade.agent, trade.id),
    }
    trade
}

/// Annotate a batch of stored trades, emitting each trade id at most once.
pub fn annotate_trades<G, I>(records: I, regions: &[RegionRecord], gateway: &G) -> Vec<Trade>
where
    G: AgentGateway + ?Sized,
    I: IntoIterator<Item = TradeRecord>,
{
    let mut seen: HashSet<u64> = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.id))
        .map(|record| annotate_trade(record, regions, gateway))
        .collect()
}

/// Stored trades whose agent is currently inside `region`.
///
/// The region name is set to `region` even if an earlier overlapping region
/// would win the normal tie-break.
pub fn trades_in_region<G, I>(records: I, region: &RegionRecord, gateway: &G) -> Vec<Trade>
where
    G: AgentGateway + ?Sized,
    I: IntoIterator<Item = TradeRecord>,
{
    let mut seen: HashSet<u64> = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.id))
        .filter_map(|record| {
            let location = gateway.resolve_agent(&record.agent)?;
            if !region.contains_location(&location) {
                return None;
            }
            let mut trade = Trade::unresolved(record);
            trade.region_name = Some(region.name.clone());
            trade.location = Some(location);
            Some(trade)
        })
        .collect()
}
