//! Build, repair, dismantle
//!
//! Building spends energy 1:1 into site progress; a completed site is
//! replaced in place by its blueprint structure. Road hit points scale
//! with the terrain the site sits on. Repair restores hits at 100 per
//! energy spent; dismantle tears hits out at 50 per WORK and refunds a
//! sliver of energy.

use crate::constants::{
    self, BoostAction, BUILD_POWER, DISMANTLE_COST, DISMANTLE_POWER, REPAIR_COST, REPAIR_POWER,
    ROAD_HITS_SWAMP_RATIO, ROAD_HITS_WALL_RATIO,
};
use crate::core::types::ObjectId;
use crate::intents::record::Intent;
use crate::mutation::ledger::Ledger;
use crate::mutation::patch::{ActionLog, ObjectPatch};
use crate::simulation::{combat, shed_overflow, StepCtx};
use crate::state::events::TickEvent;
use crate::state::object::{ObjectKind, PartType, ResourceType, RoomObject};

pub fn run(ctx: &mut StepCtx) {
    let mut ledger = Ledger::new(ctx.snapshot);

    let actions: Vec<(ObjectId, Intent)> = ctx
        .batch
        .select(|i| {
            matches!(
                i,
                Intent::Build { .. } | Intent::Repair { .. } | Intent::Dismantle { .. }
            )
        })
        .map(|v| (v.actor, v.intent.clone()))
        .collect();

    for (actor_id, intent) in actions {
        if ctx.writer.is_removed(actor_id) {
            continue;
        }
        match intent {
            Intent::Build { target } => build(ctx, &mut ledger, actor_id, target),
            Intent::Repair { target } => repair(ctx, &mut ledger, actor_id, target),
            Intent::Dismantle { target } => dismantle(ctx, &mut ledger, actor_id, target),
            _ => unreachable!("construction step selected a foreign intent"),
        }
    }

    ledger.flush(&mut ctx.writer);
}

fn build(ctx: &mut StepCtx, ledger: &mut Ledger, actor_id: ObjectId, site_id: ObjectId) {
    if ctx.writer.is_removed(site_id) {
        return;
    }
    let (power, energy, owner) = match ledger.get(actor_id) {
        Some(creep) => (
            creep.body_power(PartType::Work, BoostAction::Build, BUILD_POWER),
            creep.store.get(ResourceType::Energy),
            creep.owner.clone(),
        ),
        None => return,
    };
    let (progress, total) = match ledger.get(site_id) {
        Some(site) if site.kind == ObjectKind::ConstructionSite => {
            (site.progress.unwrap_or(0), site.progress_total.unwrap_or(0))
        }
        _ => return,
    };
    let spent = power.min(energy).min(total.saturating_sub(progress));
    if spent == 0 {
        return;
    }
    if let Some(creep) = ledger.get_mut(actor_id, &ctx.writer) {
        creep.store.remove(ResourceType::Energy, spent);
    }
    let finished = {
        let Some(site) = ledger.get_mut(site_id, &ctx.writer) else { return };
        site.progress = Some(progress + spent);
        progress + spent >= total
    };
    if let Some(owner) = &owner {
        ctx.stats.energy_construction(owner, spent as u64);
    }
    ctx.writer.patch(
        actor_id,
        ObjectPatch::log(ActionLog { built: Some(spent), ..Default::default() }),
    );
    ctx.emit(TickEvent::Build { creep: actor_id, site: site_id, amount: spent });
    if finished {
        complete_site(ctx, ledger, site_id);
    }
}

/// Replace a finished site with the structure it describes. Roads get
/// terrain-scaled hit points (x5 on swamp, x150 across walls).
fn complete_site(ctx: &mut StepCtx, ledger: &mut Ledger, site_id: ObjectId) {
    let Some(site) = ledger.get(site_id).cloned() else { return };
    let Some(kind) = site.structure_type else { return };
    ledger.discard(site_id);
    ctx.writer.remove(site_id);

    let game_time = ctx.snapshot.game_time;
    let mut built = RoomObject::new(
        ObjectId::derive(game_time, "structure", site_id.hash64()),
        kind,
        site.pos,
        ctx.snapshot.name,
    );
    let mut hits = constants::structure_hits(kind);
    if kind == ObjectKind::Road {
        if ctx.snapshot.terrain.is_wall(site.pos) {
            hits *= ROAD_HITS_WALL_RATIO;
        } else if ctx.snapshot.terrain.is_swamp(site.pos) {
            hits *= ROAD_HITS_SWAMP_RATIO;
        }
    }
    if hits > 0 {
        built.hits = Some(hits);
        built.hits_max = Some(hits);
    }
    built.store_capacity = constants::structure_capacity(kind);
    // Neutral structures carry no owner even when a player built them
    if !matches!(kind, ObjectKind::Road | ObjectKind::Container | ObjectKind::ConstructedWall) {
        built.owner = site.owner.clone();
    }
    match kind {
        ObjectKind::Rampart => {
            built.next_decay_time = Some(game_time + constants::RAMPART_DECAY_TIME);
        }
        ObjectKind::Road => {
            built.next_decay_time = Some(game_time + constants::ROAD_DECAY_TIME);
        }
        ObjectKind::Container => {
            built.next_decay_time = Some(game_time + constants::CONTAINER_DECAY_TIME);
        }
        _ => {}
    }
    ctx.writer.upsert(built);
}

fn repair(ctx: &mut StepCtx, ledger: &mut Ledger, actor_id: ObjectId, target_id: ObjectId) {
    if ctx.writer.is_removed(target_id) {
        return;
    }
    let (power, energy, owner) = match ledger.get(actor_id) {
        Some(creep) => (
            creep.body_power(PartType::Work, BoostAction::Repair, REPAIR_POWER),
            creep.store.get(ResourceType::Energy),
            creep.owner.clone(),
        ),
        None => return,
    };
    let missing = match ledger.get(target_id) {
        Some(t) => match (t.hits, t.hits_max) {
            (Some(h), Some(m)) => m.saturating_sub(h),
            _ => return,
        },
        None => return,
    };
    // Energy gates the repair: REPAIR_COST energy per hit restored
    let energy_cap = (energy as f64 / REPAIR_COST).floor() as u32;
    let restored = power.min(missing).min(energy_cap);
    if restored == 0 {
        return;
    }
    let cost = (restored as f64 * REPAIR_COST).ceil() as u32;
    if let Some(creep) = ledger.get_mut(actor_id, &ctx.writer) {
        creep.store.remove(ResourceType::Energy, cost);
    }
    if let Some(target) = ledger.get_mut(target_id, &ctx.writer) {
        target.hits = Some(target.hits.unwrap_or(0) + restored);
    }
    if let Some(owner) = &owner {
        ctx.stats.energy_repair(owner, cost as u64);
    }
    ctx.writer.patch(
        actor_id,
        ObjectPatch::log(ActionLog { repaired: Some(restored), ..Default::default() }),
    );
    ctx.emit(TickEvent::Repair { creep: actor_id, target: target_id, amount: restored });
}

fn dismantle(ctx: &mut StepCtx, ledger: &mut Ledger, actor_id: ObjectId, target_id: ObjectId) {
    if ctx.writer.is_removed(target_id) {
        return;
    }
    let power = match ledger.get(actor_id) {
        Some(creep) => creep.body_power(PartType::Work, BoostAction::Dismantle, DISMANTLE_POWER),
        None => return,
    };
    let hits = match ledger.get(target_id) {
        Some(t) if t.kind.is_structure() => match t.hits {
            Some(h) => h,
            None => return,
        },
        _ => return,
    };
    let torn = power.min(hits);
    if torn == 0 {
        return;
    }
    let destroyed = {
        let Some(target) = ledger.get_mut(target_id, &ctx.writer) else { return };
        target.hits = Some(hits - torn);
        hits - torn == 0
    };
    let refund = (torn as f64 * DISMANTLE_COST).floor() as u32;
    if refund > 0 {
        if let Some(creep) = ledger.get_mut(actor_id, &ctx.writer) {
            creep.store.add(ResourceType::Energy, refund);
        }
        shed_overflow(ctx, ledger, actor_id);
    }
    if destroyed {
        combat::destroy_structure(ctx, ledger, target_id);
    }
    ctx.emit(TickEvent::Attack { attacker: actor_id, target: target_id, damage: torn });
}
