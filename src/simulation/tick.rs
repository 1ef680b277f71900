//! Tick orchestrator
//!
//! Composes the processing steps into the fixed pipeline and runs them
//! sequentially against one room snapshot. A room tick is strictly
//! single-threaded and CPU-bound; any parallelism lives in the multi-room
//! driver (`engine.rs`), never inside a tick.

use crate::core::config::EngineConfig;
use crate::core::types::ObjectId;
use crate::intents::validate;
use crate::mutation::patch::ObjectPatch;
use crate::mutation::writer::GlobalEffects;
use crate::simulation::StepCtx;
use crate::state::events::TickEvent;
use crate::state::object::RoomObject;
use crate::state::room::RoomSnapshot;
use crate::stats::StatsSink;

/// Everything one room-tick produced. The commit unit: persistence applies
/// all of it atomically or none of it.
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    pub patches: Vec<(ObjectId, ObjectPatch)>,
    pub removals: Vec<ObjectId>,
    pub inserts: Vec<RoomObject>,
    pub stats: StatsSink,
    pub global: GlobalEffects,
    pub events: Vec<TickEvent>,
}

/// The fixed step order. Validation has already run when these execute;
/// each entry owns one mechanic family.
const STEPS: &[(&str, fn(&mut StepCtx))] = &[
    ("movement", crate::simulation::movement::run),
    ("transfer", crate::simulation::transfer::run),
    ("harvest", crate::simulation::harvest::run),
    ("construction", crate::simulation::construction::run),
    ("controller", crate::simulation::controller::run),
    ("combat", crate::simulation::combat::run),
    ("spawning", crate::simulation::spawning::run),
    ("labs", crate::simulation::labs::run),
    ("links", crate::simulation::links::run),
    ("factory", crate::simulation::factory::run),
    ("towers", crate::simulation::towers::run),
    ("power", crate::simulation::power::run),
    ("nukes", crate::simulation::nukes::run),
    ("observer", crate::simulation::observer::run),
    ("npc", crate::simulation::npc::run),
    ("decay", crate::simulation::decay::run),
];

/// Advance one room by one tick: validate the intent batch, run every
/// processing step in order, and hand back the staged mutations.
pub fn process_room_tick(snapshot: &RoomSnapshot, config: &EngineConfig) -> TickOutcome {
    tracing::info!(room = %snapshot.name, tick = snapshot.game_time, "processing room tick");
    let batch = validate::validate(snapshot);
    let mut ctx = StepCtx::new(snapshot, config, &batch);
    for (name, step) in STEPS {
        tracing::debug!(step = name, "running step");
        step(&mut ctx);
    }
    let StepCtx { writer, global, stats, events, .. } = ctx;
    let (patches, removals, inserts) = writer.into_parts();
    TickOutcome {
        patches,
        removals,
        inserts,
        stats,
        global: global.into_effects(),
        events,
    }
}

/// Roll a snapshot forward by applying a tick outcome, producing the next
/// tick's snapshot with an empty intent batch. Used by the CLI driver and
/// integration tests; the production loader rebuilds snapshots from
/// persisted state instead.
pub fn apply_outcome(snapshot: &RoomSnapshot, outcome: &TickOutcome) -> RoomSnapshot {
    let mut objects: Vec<RoomObject> = Vec::with_capacity(snapshot.objects.len());
    for obj in snapshot.iter() {
        if outcome.removals.contains(&obj.id) {
            continue;
        }
        let mut next = obj.clone();
        if let Some((_, patch)) = outcome.patches.iter().find(|(id, _)| *id == obj.id) {
            patch.apply_to(&mut next);
        }
        objects.push(next);
    }
    for insert in &outcome.inserts {
        objects.push(insert.clone());
    }
    RoomSnapshot::new(
        snapshot.name,
        snapshot.game_time + 1,
        objects,
        snapshot.terrain.clone(),
        snapshot.users.values().cloned().collect(),
        Default::default(),
    )
}
