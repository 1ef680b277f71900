//! Passive processes: aging, regeneration, decay, expiry
//!
//! Runs last and unconditionally, intents or not. Everything here works
//! off absolute tick timestamps: a timer field holds the tick the event
//! happens at, never a countdown.

use rand::Rng;

use crate::constants::{
    self, CONTAINER_DECAY_AMOUNT, CONTAINER_DECAY_TIME, CONTAINER_DECAY_TIME_OWNED,
    ENERGY_DECAY_DIVISOR, ENERGY_REGEN_TIME, MINERAL_DENSITY_CHANGE, MINERAL_REGEN_TIME,
    RAMPART_DECAY_AMOUNT, RAMPART_DECAY_TIME, ROAD_DECAY_AMOUNT, ROAD_DECAY_TIME,
    SOURCE_ENERGY_CAPACITY, SOURCE_ENERGY_KEEPER_CAPACITY, SOURCE_ENERGY_NEUTRAL_CAPACITY,
};
use crate::core::rng::tick_rng;
use crate::core::types::ObjectId;
use crate::mutation::ledger::Ledger;
use crate::simulation::{combat, drop_resource, StepCtx};
use crate::state::object::{ObjectKind, ResourceType};

pub fn run(ctx: &mut StepCtx) {
    let mut ledger = Ledger::new(ctx.snapshot);

    age_creeps(ctx, &mut ledger);
    regenerate_sources(ctx, &mut ledger);
    regenerate_minerals(ctx, &mut ledger);
    decay_structures(ctx, &mut ledger);
    decay_piles(ctx, &mut ledger);
    expire_corpses(ctx, &mut ledger);
    prune_timers(ctx, &mut ledger);

    ledger.flush(&mut ctx.writer);
}

fn age_creeps(ctx: &mut StepCtx, ledger: &mut Ledger) {
    let game_time = ctx.snapshot.game_time;
    let expired: Vec<ObjectId> = ctx
        .snapshot
        .of_kind(ObjectKind::Creep)
        .filter(|c| !c.is_spawning && c.age_time.map(|t| t <= game_time).unwrap_or(false))
        .map(|c| c.id)
        .collect();
    for creep_id in expired {
        if !ctx.writer.is_removed(creep_id) {
            combat::kill_creep(ctx, ledger, creep_id, combat::DeathCause::Age);
        }
    }
}

/// An emptied source arms its regeneration timer; a due timer refills it.
/// Capacity depends on the room: owned or reserved rooms get the full
/// 3000, keeper rooms 4000, unclaimed rooms 1500.
fn regenerate_sources(ctx: &mut StepCtx, ledger: &mut Ledger) {
    let game_time = ctx.snapshot.game_time;
    let capacity = source_capacity(ctx);
    let sources: Vec<ObjectId> = ctx.snapshot.of_kind(ObjectKind::Source).map(|s| s.id).collect();
    for source_id in sources {
        let Some(source) = ledger.get_mut(source_id, &ctx.writer) else { continue };
        match source.next_regeneration_time {
            Some(t) if t <= game_time => {
                source.store = crate::state::object::Store::of(ResourceType::Energy, capacity);
                source.next_regeneration_time = None;
            }
            None if source.store.get(ResourceType::Energy) < capacity => {
                source.next_regeneration_time = Some(game_time + ENERGY_REGEN_TIME);
            }
            _ => {}
        }
    }
}

fn source_capacity(ctx: &StepCtx) -> u32 {
    let keeper_room = ctx.snapshot.of_kind(ObjectKind::KeeperLair).next().is_some();
    if keeper_room {
        return SOURCE_ENERGY_KEEPER_CAPACITY;
    }
    let claimed = ctx
        .snapshot
        .controller()
        .map(|c| c.owner.is_some() || c.reservation.is_some())
        .unwrap_or(false);
    if claimed {
        SOURCE_ENERGY_CAPACITY
    } else {
        SOURCE_ENERGY_NEUTRAL_CAPACITY
    }
}

/// Mineral regeneration rerolls the density from the seeded per-object
/// stream: always at the density extremes, otherwise with 5 % probability.
fn regenerate_minerals(ctx: &mut StepCtx, ledger: &mut Ledger) {
    let game_time = ctx.snapshot.game_time;
    let minerals: Vec<ObjectId> = ctx.snapshot.of_kind(ObjectKind::Mineral).map(|m| m.id).collect();
    for mineral_id in minerals {
        let Some(mineral) = ledger.get_mut(mineral_id, &ctx.writer) else { continue };
        match mineral.next_regeneration_time {
            Some(t) if t <= game_time => {
                let mut rng = tick_rng(game_time, mineral_id);
                let density = mineral.density.unwrap_or(3);
                let reroll = density == 1
                    || density == 4
                    || rng.gen::<f64>() < MINERAL_DENSITY_CHANGE;
                let density = if reroll {
                    constants::mineral_density_roll(rng.gen::<f64>())
                } else {
                    density
                };
                mineral.density = Some(density);
                mineral.amount = Some(constants::mineral_density_amount(density));
                mineral.next_regeneration_time = None;
            }
            None if mineral.amount.unwrap_or(0) == 0 => {
                mineral.next_regeneration_time = Some(game_time + MINERAL_REGEN_TIME);
            }
            _ => {}
        }
    }
}

fn decay_structures(ctx: &mut StepCtx, ledger: &mut Ledger) {
    let game_time = ctx.snapshot.game_time;
    let owned_room = ctx
        .snapshot
        .controller()
        .map(|c| c.owner.is_some())
        .unwrap_or(false);
    let due: Vec<(ObjectId, ObjectKind)> = ctx
        .snapshot
        .iter()
        .filter(|o| {
            matches!(o.kind, ObjectKind::Rampart | ObjectKind::Road | ObjectKind::Container)
                && o.next_decay_time.map(|t| t <= game_time).unwrap_or(false)
        })
        .map(|o| (o.id, o.kind))
        .collect();
    for (id, kind) in due {
        if ctx.writer.is_removed(id) {
            continue;
        }
        let (amount, period) = match kind {
            ObjectKind::Rampart => (RAMPART_DECAY_AMOUNT, RAMPART_DECAY_TIME),
            ObjectKind::Road => (ROAD_DECAY_AMOUNT, ROAD_DECAY_TIME),
            ObjectKind::Container => (
                CONTAINER_DECAY_AMOUNT,
                if owned_room { CONTAINER_DECAY_TIME_OWNED } else { CONTAINER_DECAY_TIME },
            ),
            _ => continue,
        };
        let destroyed = {
            let Some(obj) = ledger.get_mut(id, &ctx.writer) else { continue };
            let hits = obj.hits.unwrap_or(0).saturating_sub(amount);
            obj.hits = Some(hits);
            obj.next_decay_time = Some(game_time + period);
            hits == 0
        };
        if destroyed {
            combat::destroy_structure(ctx, ledger, id);
        }
    }
}

/// Ground piles lose ceil(amount/1000) per tick. Piles a pickup emptied
/// this tick are already marked removed and skipped.
fn decay_piles(ctx: &mut StepCtx, ledger: &mut Ledger) {
    let piles: Vec<ObjectId> = ctx.snapshot.of_kind(ObjectKind::Resource).map(|p| p.id).collect();
    for pile_id in piles {
        if ctx.writer.is_removed(pile_id) {
            continue;
        }
        let gone = {
            let Some(pile) = ledger.get_mut(pile_id, &ctx.writer) else { continue };
            let amount = pile.amount.unwrap_or(0);
            let lost = amount.div_ceil(ENERGY_DECAY_DIVISOR);
            pile.amount = Some(amount.saturating_sub(lost));
            amount <= lost
        };
        if gone {
            ledger.discard(pile_id);
            ctx.writer.remove(pile_id);
        }
    }
}

/// Expired tombstones and ruins spill their stores onto the ground
fn expire_corpses(ctx: &mut StepCtx, ledger: &mut Ledger) {
    let game_time = ctx.snapshot.game_time;
    let expired: Vec<ObjectId> = ctx
        .snapshot
        .iter()
        .filter(|o| {
            matches!(o.kind, ObjectKind::Tombstone | ObjectKind::Ruin)
                && o.decay_time.map(|t| t <= game_time).unwrap_or(false)
        })
        .map(|o| o.id)
        .collect();
    for id in expired {
        if ctx.writer.is_removed(id) {
            continue;
        }
        let (pos, store) = match ledger.get(id) {
            Some(o) => (o.pos, o.store.clone()),
            None => continue,
        };
        for resource in store.resources() {
            drop_resource(ctx, ledger, pos, resource, store.get(resource));
        }
        ledger.discard(id);
        ctx.writer.remove(id);
    }
}

/// Expired effects and reservations fall off their objects
fn prune_timers(ctx: &mut StepCtx, ledger: &mut Ledger) {
    let game_time = ctx.snapshot.game_time;
    let carriers: Vec<ObjectId> = ctx
        .snapshot
        .iter()
        .filter(|o| {
            o.effects.iter().any(|e| e.until <= game_time)
                || o.reservation.as_ref().map(|r| r.end_time <= game_time).unwrap_or(false)
                || o.safe_mode.map(|t| t <= game_time).unwrap_or(false)
        })
        .map(|o| o.id)
        .collect();
    for id in carriers {
        if ctx.writer.is_removed(id) {
            continue;
        }
        let Some(obj) = ledger.get_mut(id, &ctx.writer) else { continue };
        obj.effects.retain(|e| e.until > game_time);
        if obj.reservation.as_ref().map(|r| r.end_time <= game_time).unwrap_or(false) {
            obj.reservation = None;
        }
        if obj.safe_mode.map(|t| t <= game_time).unwrap_or(false) {
            obj.safe_mode = None;
        }
    }
}
