//! Binary entrypoint for the vetrack admin CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml`
//! - `regions` / `region-add` / `region-rename` / `region-rm` - manage regions
//! - `trades [--world <snapshot>] [--enchant <id>] [--region <id>]` - list stored trades with live region names
//! - `search <enchant> [--world <snapshot>]` - trades for one enchantment
//! - `register --world <snapshot> --agent <uuid>` - store a villager's current offers
//! - `describe <id> <text>` / `delete <id>` - edit stored trades
//! - `coverage --world <snapshot> [--region <name|all>] [--near x,y,z --radius r --in <world>]`
//!
//! Live villager positions come from a JSON world snapshot (see
//! `vetrack::tracker::WorldSnapshot`); without one every villager is treated as unloaded.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::info;

use vetrack::config::Config;
use vetrack::tracker::{
    AgentLocation, AgentRef, CoverageReport, EnchantmentId, Position, RegionSelector, Trade,
    Tracker, WorldId, WorldSnapshot,
};

#[derive(Parser)]
#[command(name = "vetrack")]
#[command(about = "Villager enchantment trade and region tracker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// List regions
    Regions,
    /// Create a region from two corners
    RegionAdd {
        name: String,
        /// World the region lives in
        #[arg(short, long, default_value = "world")]
        world: String,
        /// First corner as x,y,z
        #[arg(value_parser = parse_position, allow_hyphen_values = true)]
        corner_a: Position,
        /// Opposite corner as x,y,z
        #[arg(value_parser = parse_position, allow_hyphen_values = true)]
        corner_b: Position,
    },
    /// Rename a region
    RegionRename { id: u64, name: String },
    /// Delete a region
    RegionRm { id: u64 },
    /// List stored trades
    Trades {
        #[arg(short, long)]
        world: Option<String>,
        /// Only trades for this enchantment
        #[arg(short, long)]
        enchant: Option<String>,
        /// Only trades whose villager is inside this region id
        #[arg(short, long)]
        region: Option<u64>,
    },
    /// Search stored trades for one enchantment
    Search {
        enchant: String,
        #[arg(short, long)]
        world: Option<String>,
    },
    /// Store every enchanted-book offer a villager currently has
    Register {
        #[arg(short, long)]
        world: String,
        #[arg(short, long)]
        agent: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Replace a trade's description
    Describe { id: u64, text: Vec<String> },
    /// Delete a trade
    Delete { id: u64 },
    /// Report enchantments not yet offered by any scanned villager
    Coverage {
        #[arg(short, long)]
        world: String,
        /// Region name, or `all` / `*`
        #[arg(short, long, conflicts_with = "near")]
        region: Option<String>,
        /// Scan around this point (x,y,z) instead of regions
        #[arg(long, value_parser = parse_position, allow_hyphen_values = true, requires = "radius")]
        near: Option<Position>,
        #[arg(long)]
        radius: Option<f64>,
        /// World of the --near point
        #[arg(long = "in", default_value = "world")]
        in_world: String,
    },
}

fn parse_position(raw: &str) -> std::result::Result<Position, String> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| format!("invalid coordinate in '{}': {}", raw, e))?;
    match parts.as_slice() {
        [x, y, z] => Ok(Position::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z but got '{}'", raw)),
    }
}

fn load_world(path: Option<&str>) -> Result<WorldSnapshot> {
    match path {
        Some(path) => WorldSnapshot::load(path)
            .map_err(|e| anyhow!("Failed to load world snapshot {}: {}", path, e)),
        None => Ok(WorldSnapshot::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            Config::create_default(&cli.config)?;
            info!("Configuration file created at {}", cli.config);
            return Ok(());
        }
        command => command,
    };

    let config = Config::load_or_default(&cli.config)?;
    init_logging(&Some(config.clone()), cli.verbose);
    let tracker = Tracker::open(&config)?;

    match command {
        Commands::Init => {}
        Commands::Regions => {
            let regions = tracker.list_regions();
            if regions.is_empty() {
                println!("No regions defined.");
            }
            for region in regions {
                println!(
                    "#{} {} [{}] {} -> {}",
                    region.id, region.name, region.world, region.min, region.max
                );
            }
        }
        Commands::RegionAdd {
            name,
            world,
            corner_a,
            corner_b,
        } => {
            let world = WorldId::new(world);
            let id = tracker.create_region(
                &name,
                &AgentLocation::new(world.clone(), corner_a),
                &AgentLocation::new(world, corner_b),
            )?;
            println!("Created region #{} '{}'", id, name);
        }
        Commands::RegionRename { id, name } => {
            if tracker.update_region_name(id, &name)? {
                println!("Region #{} renamed to '{}'", id, name);
            } else {
                println!("No region #{}", id);
            }
        }
        Commands::RegionRm { id } => {
            if tracker.delete_region(id) {
                println!("Region #{} deleted", id);
            } else {
                println!("No region #{}", id);
            }
        }
        Commands::Trades {
            world,
            enchant,
            region,
        } => {
            let world = load_world(world.as_deref())?;
            let mut trades = match region {
                Some(region_id) => tracker.trades_in_region(region_id, &world),
                None => tracker.list_trades(&world),
            };
            if let Some(wanted) = EnchantmentId::from_optional(enchant.as_deref()) {
                trades.retain(|trade| trade.enchant == wanted);
            }
            print_trades(&trades);
        }
        Commands::Search { enchant, world } => {
            let world = load_world(world.as_deref())?;
            print_trades(&tracker.search_trades(&enchant, &world));
        }
        Commands::Register {
            world,
            agent,
            description,
        } => {
            let world = load_world(Some(&world))?;
            let agent: AgentRef = agent
                .parse()
                .map_err(|e| anyhow!("Invalid villager uuid {}: {}", agent, e))?;
            let stored = tracker.register_agent_offers(&agent, &description, &world);
            println!("Stored {} trades for {}", stored, agent);
        }
        Commands::Describe { id, text } => {
            if tracker.update_trade_description(id, &text.join(" ")) {
                println!("Trade #{} updated", id);
            } else {
                println!("No trade #{}", id);
            }
        }
        Commands::Delete { id } => {
            if tracker.delete_trade(id) {
                println!("Trade #{} deleted", id);
            } else {
                println!("No trade #{}", id);
            }
        }
        Commands::Coverage {
            world,
            region,
            near,
            radius,
            in_world,
        } => {
            let world = load_world(Some(&world))?;
            let report = match (near, radius) {
                (Some(center), Some(radius)) => Some(tracker.coverage_nearby(
                    &world,
                    &WorldId::new(in_world),
                    &center,
                    radius,
                )),
                _ => {
                    let selector = RegionSelector::parse(region.as_deref().unwrap_or("all"));
                    tracker.coverage_in_regions(&world, &selector)
                }
            };
            match report {
                Some(report) => print_coverage(&report),
                None => println!("No matching regions."),
            }
        }
    }
    Ok(())
}

fn print_trades(trades: &[Trade]) {
    if trades.is_empty() {
        println!("No trades found.");
        return;
    }
    for trade in trades {
        let place = match &trade.location {
            Some(loc) => {
                let (x, y, z) = loc.position.block();
                format!("{} {},{},{}", loc.world, x, y, z)
            }
            None => "not loaded".to_string(),
        };
        println!(
            "#{} {} {} - {} emeralds @ {} [{}] {}",
            trade.id,
            trade.enchant,
            trade.level,
            trade.price,
            place,
            trade.region_name.as_deref().unwrap_or("-"),
            trade.description
        );
    }
}

fn print_coverage(report: &CoverageReport) {
    println!("Villagers scanned: {}", report.agents_scanned);
    println!("Missing ({}):", report.coverage.new.len());
    for entry in &report.coverage.new {
        println!("  {}", entry);
    }
    println!("Available ({}):", report.coverage.existing.len());
    for entry in &report.coverage.existing {
        println!("  {}", entry);
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    let configured = config
        .as_ref()
        .map(|cfg| cfg.logging.level_filter())
        .unwrap_or(log::LevelFilter::Info);
    // CLI verbosity can only raise the configured level
    let base_level = match verbosity {
        0 => configured,
        1 => configured.max(log::LevelFilter::Debug),
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    match log_file {
        Some(f) => {
            let file = std::sync::Mutex::new(f);
            let is_tty = atty::is(atty::Stream::Stderr);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = file.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
