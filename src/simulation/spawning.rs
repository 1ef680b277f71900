//! Spawn lifecycle: create, place, renew, recycle, cancel, suicide
//!
//! Creating a creep charges the listed energy structures up front and
//! parks a placeholder on the spawn tile until `need_time`. Placement
//! scans the requested directions in order; the owner's own creeps never
//! block a tile (they get stomped). With no opening in any direction and
//! exactly one preferred tile held only by a single hostile creep, the
//! hostile is stomped too; anything else defers placement to a later
//! tick.

use crate::constants::{
    self, CLAIM_LIFE_TIME, CREEP_LIFE_TIME, CREEP_SPAWN_TIME, SPAWN_RENEW_RATIO,
};
use crate::core::types::{Direction, ObjectId, Position};
use crate::intents::record::{Intent, SpawnCreateIntent};
use crate::intents::validate;
use crate::mutation::ledger::Ledger;
use crate::simulation::{combat, shed_overflow, tile_blocked, StepCtx};
use crate::state::events::TickEvent;
use crate::state::object::{
    BodyPart, ObjectKind, PartType, ResourceType, RoomObject, SpawningState,
};

pub fn run(ctx: &mut StepCtx) {
    let mut ledger = Ledger::new(ctx.snapshot);

    let creates: Vec<(crate::core::types::UserId, SpawnCreateIntent)> =
        ctx.batch.spawn_creates.clone();
    for (index, (user, create)) in creates.into_iter().enumerate() {
        start_spawning(ctx, &mut ledger, &user, &create, index as u64);
    }

    let actions: Vec<(ObjectId, Intent)> = ctx
        .batch
        .select(|i| {
            matches!(
                i,
                Intent::RenewCreep { .. }
                    | Intent::RecycleCreep { .. }
                    | Intent::CancelSpawning
                    | Intent::Suicide
            )
        })
        .map(|v| (v.actor, v.intent.clone()))
        .collect();

    for (actor_id, intent) in actions {
        if ctx.writer.is_removed(actor_id) {
            continue;
        }
        match intent {
            Intent::RenewCreep { target } => renew(ctx, &mut ledger, actor_id, target),
            Intent::RecycleCreep { target } => {
                if !ctx.writer.is_removed(target) {
                    combat::kill_creep(ctx, &mut ledger, target, combat::DeathCause::Recycle);
                }
            }
            Intent::CancelSpawning => cancel_spawning(ctx, &mut ledger, actor_id),
            Intent::Suicide => {
                combat::kill_creep(ctx, &mut ledger, actor_id, combat::DeathCause::Suicide);
            }
            _ => unreachable!("spawning step selected a foreign intent"),
        }
    }

    complete_spawns(ctx, &mut ledger);

    ledger.flush(&mut ctx.writer);
}

/// Charge the energy structures in their listed order and insert the
/// spawning placeholder. The spawn stays busy until `need_time`.
fn start_spawning(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    user: &crate::core::types::UserId,
    create: &SpawnCreateIntent,
    index: u64,
) {
    let game_time = ctx.snapshot.game_time;
    let Some(spawn) = ctx.snapshot.get(create.spawn) else { return };
    if spawn.spawning.is_some() || ctx.writer.is_removed(create.spawn) {
        return;
    }
    let cost: u32 = create.body.iter().map(|p| constants::body_part_cost(*p)).sum();

    // Drain the chain in order; validation guaranteed it covers the cost
    let mut remaining = cost;
    for structure_id in validate::energy_structures(ctx.snapshot, user, create) {
        if remaining == 0 {
            break;
        }
        if let Some(structure) = ledger.get_mut(structure_id, &ctx.writer) {
            remaining -= structure.store.remove(ResourceType::Energy, remaining);
        }
    }
    if remaining > 0 {
        return;
    }
    ctx.stats.energy_spawn(user, cost as u64);

    let creep_id = ObjectId::derive(game_time, "creep", create.spawn.hash64() ^ index);
    let mut creep = RoomObject::new(creep_id, ObjectKind::Creep, spawn.pos, ctx.snapshot.name);
    creep.owner = Some(user.clone());
    creep.body = create.body.iter().map(|p| BodyPart::new(*p)).collect();
    let hits = creep.body.len() as u32 * crate::state::object::BODY_PART_HITS as u32;
    creep.hits = Some(hits);
    creep.hits_max = Some(hits);
    creep.store_capacity = Some(creep.body_carry_capacity());
    creep.is_spawning = true;
    ctx.writer.upsert(creep);

    let need_time = game_time + create.body.len() as u64 * CREEP_SPAWN_TIME;
    if let Some(spawn) = ledger.get_mut(create.spawn, &ctx.writer) {
        spawn.spawning = Some(SpawningState {
            creep: creep_id,
            need_time,
            directions: create.directions.clone(),
        });
    }
}

/// Place finished creeps. Directions are scanned in the caller's order
/// (default all eight); the first tile not blocked by terrain, structures
/// or hostile creeps wins. The owner's own creeps on that tile die to the
/// stomp, and a lone hostile holding the only candidate tile dies with
/// them. No placeable tile means the spawn stays busy another tick.
fn complete_spawns(ctx: &mut StepCtx, ledger: &mut Ledger) {
    let game_time = ctx.snapshot.game_time;
    let due: Vec<ObjectId> = ctx
        .snapshot
        .of_kind(ObjectKind::Spawn)
        .filter(|s| {
            s.spawning
                .as_ref()
                .map(|sp| sp.need_time <= game_time)
                .unwrap_or(false)
        })
        .map(|s| s.id)
        .collect();

    for spawn_id in due {
        if ctx.writer.is_removed(spawn_id) {
            continue;
        }
        let (state, spawn_pos, owner) = match ledger.get(spawn_id) {
            Some(spawn) => match (&spawn.spawning, &spawn.owner) {
                (Some(state), Some(owner)) => (state.clone(), spawn.pos, owner.clone()),
                _ => continue,
            },
            None => continue,
        };
        if ctx.writer.is_removed(state.creep) {
            // Placeholder died mid-spawn; free the spawn
            if let Some(spawn) = ledger.get_mut(spawn_id, &ctx.writer) {
                spawn.spawning = None;
            }
            continue;
        }
        let directions = state.directions.clone().unwrap_or_else(|| Direction::ALL.to_vec());
        let Some((tile, blocking_hostile)) = find_exit_tile(ctx, spawn_pos, &owner, &directions)
        else {
            continue;
        };
        if let Some(hostile) = blocking_hostile {
            if !ctx.writer.is_removed(hostile) {
                combat::kill_creep(ctx, ledger, hostile, combat::DeathCause::Combat);
            }
        }
        // Stomp: the owner's creeps on the chosen tile die
        let stomped: Vec<ObjectId> = ctx
            .snapshot
            .at(tile)
            .filter(|o| o.kind == ObjectKind::Creep && o.owner.as_ref() == Some(&owner))
            .map(|o| o.id)
            .collect();
        for victim in stomped {
            if !ctx.writer.is_removed(victim) {
                combat::kill_creep(ctx, ledger, victim, combat::DeathCause::Combat);
            }
        }
        let lifetime = match ledger.get(state.creep) {
            Some(creep) if creep.has_active_part(PartType::Claim) => CLAIM_LIFE_TIME,
            Some(_) => CREEP_LIFE_TIME,
            None => continue,
        };
        if let Some(creep) = ledger.get_mut(state.creep, &ctx.writer) {
            creep.pos = tile;
            creep.is_spawning = false;
            creep.age_time = Some(game_time + lifetime);
        }
        if let Some(spawn) = ledger.get_mut(spawn_id, &ctx.writer) {
            spawn.spawning = None;
        }
        ctx.stats.creep_produced(&owner);
        ctx.emit(TickEvent::SpawnCompleted { spawn: spawn_id, creep: state.creep });
    }
}

/// Pick the placement tile: the first open tile in the requested scan
/// order. When no direction at all offers an opening and exactly one of
/// the preferred tiles is held by nothing but a single hostile creep,
/// that hostile gets stomped and its tile is used.
fn find_exit_tile(
    ctx: &StepCtx,
    spawn_pos: Position,
    owner: &crate::core::types::UserId,
    directions: &[Direction],
) -> Option<(Position, Option<ObjectId>)> {
    let hostiles_on = |tile: Position| -> Vec<ObjectId> {
        ctx.snapshot
            .at(tile)
            .filter(|o| {
                matches!(o.kind, ObjectKind::Creep | ObjectKind::PowerCreep)
                    && o.owner.as_ref() != Some(owner)
            })
            .map(|o| o.id)
            .collect()
    };
    let open = |dir: Direction| -> Option<Position> {
        let tile = spawn_pos.step(dir)?;
        if tile_blocked(ctx.snapshot, tile, Some(owner)) {
            return None;
        }
        hostiles_on(tile).is_empty().then_some(tile)
    };
    if let Some(tile) = directions.iter().copied().find_map(|dir| open(dir)) {
        return Some((tile, None));
    }
    // A non-preferred opening still defers the completion instead of
    // forcing a stomp
    if Direction::ALL.iter().copied().any(|dir| open(dir).is_some()) {
        return None;
    }
    let mut stompable: Vec<(Position, ObjectId)> = Vec::new();
    for dir in directions {
        let Some(tile) = spawn_pos.step(*dir) else { continue };
        if tile_blocked(ctx.snapshot, tile, Some(owner)) {
            continue;
        }
        if let [hostile] = hostiles_on(tile).as_slice() {
            stompable.push((tile, *hostile));
        }
    }
    match stompable.as_slice() {
        [(tile, hostile)] => Some((*tile, Some(*hostile))),
        _ => None,
    }
}

/// Top up a creep's lifetime from spawn energy. Renewal strips every boost,
/// so the store capacity is recomputed and any overflow hits the ground.
fn renew(ctx: &mut StepCtx, ledger: &mut Ledger, spawn_id: ObjectId, creep_id: ObjectId) {
    if ctx.writer.is_removed(creep_id) {
        return;
    }
    let game_time = ctx.snapshot.game_time;
    let (body_len, body_cost) = match ledger.get(creep_id) {
        Some(creep) if !creep.body.is_empty() => (
            creep.body.len() as u64,
            creep.body.iter().map(|p| constants::body_part_cost(p.part)).sum::<u32>(),
        ),
        _ => return,
    };
    let gained = (CREEP_LIFE_TIME as f64 * SPAWN_RENEW_RATIO
        / CREEP_SPAWN_TIME as f64
        / body_len as f64)
        .floor() as u64;
    let cost = (SPAWN_RENEW_RATIO * body_cost as f64
        / CREEP_SPAWN_TIME as f64
        / body_len as f64)
        .ceil() as u32;
    {
        let Some(spawn) = ledger.get_mut(spawn_id, &ctx.writer) else { return };
        if spawn.store.get(ResourceType::Energy) < cost {
            return;
        }
        spawn.store.remove(ResourceType::Energy, cost);
    }
    {
        let Some(creep) = ledger.get_mut(creep_id, &ctx.writer) else { return };
        for part in creep.body.iter_mut() {
            part.boost = None;
        }
        creep.store_capacity = Some(creep.body_carry_capacity());
        let base = creep.age_time.unwrap_or(game_time).max(game_time);
        creep.age_time = Some((base + gained).min(game_time + CREEP_LIFE_TIME));
    }
    shed_overflow(ctx, ledger, creep_id);
}

/// Abort an in-progress spawn. The charged energy is lost and the
/// placeholder disappears without a tombstone.
fn cancel_spawning(ctx: &mut StepCtx, ledger: &mut Ledger, spawn_id: ObjectId) {
    let state = match ledger.get(spawn_id) {
        Some(spawn) => match &spawn.spawning {
            Some(state) => state.clone(),
            None => return,
        },
        None => return,
    };
    ctx.writer.remove(state.creep);
    ledger.discard(state.creep);
    if let Some(spawn) = ledger.get_mut(spawn_id, &ctx.writer) {
        spawn.spawning = None;
    }
}
