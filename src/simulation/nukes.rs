//! Nuker launches and nuke impacts
//!
//! A launch consumes the nuker's full cargo and parks a nuke object in the
//! target room through the global writer; it lands 50 000 ticks later.
//! Landing wipes every creep in the room without tombstones, knocks power
//! creeps down to zero hits, clears the loose debris, and hammers a 5x5
//! grid of structure damage with ramparts absorbing first.

use crate::constants::{
    NUKER_COOLDOWN, NUKER_ENERGY_CAPACITY, NUKER_GHODIUM_CAPACITY, NUKE_DAMAGE_CENTER,
    NUKE_DAMAGE_RING, NUKE_LAND_TIME, NUKE_UPGRADE_BLOCK,
};
use crate::core::types::{ObjectId, Position, RoomName};
use crate::intents::record::Intent;
use crate::mutation::ledger::Ledger;
use crate::simulation::{combat, StepCtx};
use crate::state::events::TickEvent;
use crate::state::object::{ObjectKind, ResourceType, RoomObject};

pub fn run(ctx: &mut StepCtx) {
    let mut ledger = Ledger::new(ctx.snapshot);

    let launches: Vec<(ObjectId, RoomName, Position)> = ctx
        .batch
        .select(|i| matches!(i, Intent::LaunchNuke { .. }))
        .filter_map(|v| match v.intent {
            Intent::LaunchNuke { room, pos } => Some((v.actor, room, pos)),
            _ => None,
        })
        .collect();

    for (nuker_id, room, pos) in launches {
        launch(ctx, &mut ledger, nuker_id, room, pos);
    }

    land_nukes(ctx, &mut ledger);

    ledger.flush(&mut ctx.writer);
}

fn launch(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    nuker_id: ObjectId,
    room: RoomName,
    pos: Position,
) {
    if ctx.writer.is_removed(nuker_id) {
        return;
    }
    let game_time = ctx.snapshot.game_time;
    let owner = {
        let Some(nuker) = ledger.get_mut(nuker_id, &ctx.writer) else { return };
        if nuker.kind != ObjectKind::Nuker {
            return;
        }
        if nuker.store.get(ResourceType::Energy) < NUKER_ENERGY_CAPACITY
            || nuker.store.get(ResourceType::Ghodium) < NUKER_GHODIUM_CAPACITY
        {
            return;
        }
        nuker.store.remove(ResourceType::Energy, NUKER_ENERGY_CAPACITY);
        nuker.store.remove(ResourceType::Ghodium, NUKER_GHODIUM_CAPACITY);
        nuker.cooldown_time = Some(game_time + NUKER_COOLDOWN);
        nuker.owner.clone()
    };
    let mut nuke = RoomObject::new(
        ObjectId::derive(game_time, "nuke", nuker_id.hash64()),
        ObjectKind::Nuke,
        pos,
        room,
    );
    nuke.owner = owner;
    nuke.land_time = Some(game_time + NUKE_LAND_TIME);
    // The nuke may target another room; the global writer routes it
    ctx.global.upsert(room, nuke);
}

fn land_nukes(ctx: &mut StepCtx, ledger: &mut Ledger) {
    let game_time = ctx.snapshot.game_time;
    let landing: Vec<(ObjectId, Position)> = ctx
        .snapshot
        .of_kind(ObjectKind::Nuke)
        .filter(|n| n.land_time.map(|t| t <= game_time).unwrap_or(false))
        .map(|n| (n.id, n.pos))
        .collect();
    if landing.is_empty() {
        return;
    }

    // Room-wide: creeps die without tombstones, power creeps drop to zero
    // hits but persist, debris disappears, spawns abandon whatever they
    // were producing
    for obj in ctx.snapshot.iter() {
        match obj.kind {
            ObjectKind::Creep => {
                ledger.discard(obj.id);
                ctx.writer.remove(obj.id);
            }
            ObjectKind::PowerCreep => {
                if let Some(pc) = ledger.get_mut(obj.id, &ctx.writer) {
                    pc.hits = Some(0);
                }
            }
            ObjectKind::Resource
            | ObjectKind::ConstructionSite
            | ObjectKind::Tombstone
            | ObjectKind::Ruin => {
                ledger.discard(obj.id);
                ctx.writer.remove(obj.id);
            }
            ObjectKind::Spawn => {
                if obj.spawning.is_some() {
                    if let Some(spawn) = ledger.get_mut(obj.id, &ctx.writer) {
                        spawn.spawning = None;
                    }
                }
            }
            _ => {}
        }
    }

    for (nuke_id, center) in landing {
        ledger.discard(nuke_id);
        ctx.writer.remove(nuke_id);
        for dx in -2i32..=2 {
            for dy in -2i32..=2 {
                let Some(pos) = center.offset(dx, dy) else { continue };
                let damage = if dx == 0 && dy == 0 { NUKE_DAMAGE_CENTER } else { NUKE_DAMAGE_RING };
                blast_tile(ctx, ledger, pos, damage);
            }
        }
        ctx.emit(TickEvent::NukeLanded { pos: center });
    }

    // Controller fallout: upgrades blocked, safe mode cancelled
    if let Some(controller_id) = ctx.snapshot.controller().map(|c| c.id) {
        if let Some(controller) = ledger.get_mut(controller_id, &ctx.writer) {
            controller.upgrade_blocked = Some(game_time + NUKE_UPGRADE_BLOCK);
            controller.safe_mode = None;
        }
    }
}

/// Structure damage on one tile. A rampart soaks for everything beneath
/// it; when the rampart is the only structure it takes the hit itself.
fn blast_tile(ctx: &mut StepCtx, ledger: &mut Ledger, pos: Position, damage: u32) {
    let targets: Vec<ObjectId> = ctx
        .snapshot
        .at(pos)
        .filter(|o| o.kind.is_structure() && o.kind != ObjectKind::Rampart && o.hits.is_some())
        .map(|o| o.id)
        .collect();
    if targets.is_empty() {
        let rampart = ctx
            .snapshot
            .at(pos)
            .find(|o| o.kind == ObjectKind::Rampart)
            .map(|o| o.id);
        if let Some(id) = rampart {
            combat::apply_damage(ctx, ledger, id, damage);
        }
        return;
    }
    for id in targets {
        combat::apply_damage(ctx, ledger, id, damage);
    }
}
