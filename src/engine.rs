//! Multi-room driver
//!
//! Rooms are independent within a tick, so the driver fans them out with
//! rayon once enough rooms are in play and merges the global side effects
//! sequentially afterwards. Cross-room writes (nuke launches) are id-keyed
//! upserts, so the merge order between rooms does not matter.

use rayon::prelude::*;

use crate::core::config::EngineConfig;
use crate::core::types::RoomName;
use crate::mutation::writer::GlobalEffects;
use crate::simulation::tick::{process_room_tick, TickOutcome};
use crate::state::room::RoomSnapshot;
use crate::stats::StatsSink;

/// One multi-room tick: per-room outcomes plus the merged cross-room
/// effects and per-user stats.
#[derive(Debug, Default)]
pub struct EngineOutcome {
    pub rooms: Vec<(RoomName, TickOutcome)>,
    pub global: GlobalEffects,
    pub stats: StatsSink,
}

/// Process one tick for every given room. Below the configured threshold
/// the rooms run sequentially; at or above it they run on the rayon pool.
pub fn process_rooms(snapshots: &[RoomSnapshot], config: &EngineConfig) -> EngineOutcome {
    let mut rooms: Vec<(RoomName, TickOutcome)> =
        if snapshots.len() >= config.parallel_room_threshold {
            snapshots
                .par_iter()
                .map(|snapshot| (snapshot.name, process_room_tick(snapshot, config)))
                .collect()
        } else {
            snapshots
                .iter()
                .map(|snapshot| (snapshot.name, process_room_tick(snapshot, config)))
                .collect()
        };
    // Deterministic merge order regardless of scheduling
    rooms.sort_by_key(|(name, _)| *name);

    let mut global = GlobalEffects::default();
    let mut stats = StatsSink::new();
    for (_, outcome) in &rooms {
        global.merge(outcome.global.clone());
        stats.merge(outcome.stats.clone());
    }
    tracing::info!(rooms = rooms.len(), "tick processed");
    EngineOutcome { rooms, global, stats }
}
