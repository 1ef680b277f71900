//! Command-line driver: load room snapshots, run ticks, report outcomes

use std::path::PathBuf;

use clap::Parser;

use deepwarren::core::config::EngineConfig;
use deepwarren::core::error::Result;
use deepwarren::engine::process_rooms;
use deepwarren::simulation::tick::apply_outcome;
use deepwarren::state::room::RoomSnapshot;

#[derive(Parser, Debug)]
#[command(name = "deepwarren", about = "Deterministic room-tick simulation driver")]
struct Args {
    /// Room snapshot JSON files, one room each
    #[arg(required = true)]
    snapshots: Vec<PathBuf>,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 1)]
    ticks: u64,

    /// Engine configuration TOML; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print per-tick outcome summaries as JSON lines
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Args::parse()) {
        tracing::error!(error = %e, "simulation aborted");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::load_from_toml(path)?,
        None => EngineConfig::default(),
    };

    let mut rooms: Vec<RoomSnapshot> = Vec::with_capacity(args.snapshots.len());
    for path in &args.snapshots {
        let text = std::fs::read_to_string(path)?;
        rooms.push(RoomSnapshot::from_json(&text)?);
    }

    for _ in 0..args.ticks {
        let outcome = process_rooms(&rooms, &config);
        for (name, tick) in &outcome.rooms {
            if args.json {
                let summary = serde_json::json!({
                    "room": name.to_string(),
                    "patches": tick.patches.len(),
                    "removals": tick.removals.len(),
                    "inserts": tick.inserts.len(),
                    "events": tick.events,
                    "stats": tick.stats,
                });
                println!("{}", summary);
            } else {
                tracing::info!(
                    room = %name,
                    patches = tick.patches.len(),
                    removals = tick.removals.len(),
                    inserts = tick.inserts.len(),
                    "tick outcome"
                );
            }
        }
        rooms = rooms
            .iter()
            .map(|snapshot| {
                let tick = outcome
                    .rooms
                    .iter()
                    .find(|(name, _)| *name == snapshot.name)
                    .map(|(_, t)| t);
                match tick {
                    Some(t) => apply_outcome(snapshot, t),
                    None => snapshot.clone(),
                }
            })
            .collect();
    }
    Ok(())
}
