//! Per-tick processing steps
//!
//! Each module owns one mechanic family. Steps run in the fixed order
//! `tick.rs` defines, all against the same read-only snapshot, writing only
//! through the mutation writers in the step context. The only cross-step
//! state a later step may observe is the writer's removal markers; staged
//! patches stay invisible and merge field-wise, later write winning.

pub mod combat;
pub mod construction;
pub mod controller;
pub mod decay;
pub mod factory;
pub mod harvest;
pub mod labs;
pub mod links;
pub mod movement;
pub mod npc;
pub mod nukes;
pub mod observer;
pub mod power;
pub mod spawning;
pub mod tick;
pub mod towers;
pub mod transfer;

use crate::core::config::EngineConfig;
use crate::core::types::{ObjectId, Position, UserId};
use crate::intents::validate::ValidBatch;
use crate::mutation::ledger::Ledger;
use crate::mutation::writer::{GlobalWriter, RoomWriter};
use crate::state::events::TickEvent;
use crate::state::object::{ObjectKind, ResourceType, RoomObject};
use crate::state::room::RoomSnapshot;
use crate::stats::StatsSink;

/// Everything a processing step may touch. The snapshot and validated
/// batch are read-only; all mutation goes through the writers.
pub struct StepCtx<'a> {
    pub snapshot: &'a RoomSnapshot,
    pub config: &'a EngineConfig,
    pub batch: &'a ValidBatch,
    pub writer: RoomWriter,
    pub global: GlobalWriter,
    pub stats: StatsSink,
    pub events: Vec<TickEvent>,
}

impl<'a> StepCtx<'a> {
    pub fn new(snapshot: &'a RoomSnapshot, config: &'a EngineConfig, batch: &'a ValidBatch) -> Self {
        Self {
            snapshot,
            config,
            batch,
            writer: RoomWriter::new(),
            global: GlobalWriter::new(),
            stats: StatsSink::new(),
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: TickEvent) {
        if self.config.event_log {
            self.events.push(event);
        }
    }
}

/// Drop a resource onto a tile, merging into an existing pile of the same
/// resource — including one another step created earlier this tick.
pub(crate) fn drop_resource(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    pos: Position,
    resource: ResourceType,
    amount: u32,
) {
    if amount == 0 {
        return;
    }
    // Pre-existing pile at the tile
    let existing = ctx
        .snapshot
        .at(pos)
        .find(|o| o.kind == ObjectKind::Resource && o.resource_type == Some(resource))
        .map(|o| o.id);
    if let Some(id) = existing {
        if let Some(pile) = ledger.get_mut(id, &ctx.writer) {
            pile.amount = Some(pile.amount.unwrap_or(0) + amount);
            return;
        }
    }
    // Pile inserted earlier this tick
    let inserted = ctx
        .writer
        .inserts()
        .iter()
        .find(|o| {
            o.kind == ObjectKind::Resource && o.pos == pos && o.resource_type == Some(resource)
        })
        .map(|o| o.id);
    if let Some(id) = inserted {
        if let Some(pile) = ctx.writer.get_insert_mut(id) {
            pile.amount = Some(pile.amount.unwrap_or(0) + amount);
            return;
        }
    }
    // Fresh pile with a deterministic id
    let salt = ((pos.x as u64) << 32) | ((pos.y as u64) << 16) | resource as u64;
    let id = ObjectId::derive(ctx.snapshot.game_time, "pile", salt);
    let mut pile = RoomObject::new(id, ObjectKind::Resource, pos, ctx.snapshot.name);
    pile.resource_type = Some(resource);
    pile.amount = Some(amount);
    ctx.writer.upsert(pile);
}

/// Move any store content above capacity onto the ground at the creep's
/// tile. Resources are shed in sorted-type order for determinism.
pub(crate) fn shed_overflow(ctx: &mut StepCtx, ledger: &mut Ledger, id: ObjectId) {
    let Some(creep) = ledger.get(id) else { return };
    let capacity = creep.store_capacity.unwrap_or(0);
    let total = creep.store.total();
    if total <= capacity {
        return;
    }
    let mut excess = total - capacity;
    let pos = creep.pos;
    let resources = creep.store.resources();
    for resource in resources {
        if excess == 0 {
            break;
        }
        let removed = match ledger.get_mut(id, &ctx.writer) {
            Some(creep) => creep.store.remove(resource, excess),
            None => return,
        };
        excess -= removed;
        drop_resource(ctx, ledger, pos, resource, removed);
    }
}

/// Whether terrain and structures block a creep of `owner` from standing on
/// a tile. Does not consider other creeps; movers handle those separately.
pub(crate) fn tile_blocked(snapshot: &RoomSnapshot, pos: Position, owner: Option<&UserId>) -> bool {
    let has_road = snapshot.at(pos).any(|o| o.kind == ObjectKind::Road);
    if snapshot.terrain.is_wall(pos) && !has_road {
        return true;
    }
    snapshot.at(pos).any(|o| match o.kind {
        ObjectKind::Rampart => !o.is_public && o.owner.as_ref() != owner,
        ObjectKind::Creep | ObjectKind::PowerCreep | ObjectKind::ConstructionSite => false,
        kind => kind.is_obstacle(),
    })
}
