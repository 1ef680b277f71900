//! Movement and pull
//!
//! Fatigue sheds every tick, move intent or not, proportional to active
//! MOVE parts; a creep still carrying fatigue cannot move and stands
//! instead. Pulled creeps displace onto their puller's origin
//! tile and win position conflicts against ordinary movers; remaining ties
//! go to the lowest object id. Pull graphs are checked for cycles up front
//! and a detected cycle is rejected whole — no partial application.

use ahash::{AHashMap, AHashSet};

use crate::constants::{BoostAction, FATIGUE_COST_ROAD, MOVE_FATIGUE_POWER};
use crate::core::types::{ObjectId, Position};
use crate::intents::record::Intent;
use crate::mutation::ledger::Ledger;
use crate::mutation::patch::{ActionLog, ObjectPatch};
use crate::simulation::{tile_blocked, StepCtx};
use crate::state::object::{ObjectKind, PartType, RoomObject};

#[derive(Debug, Clone, Copy)]
struct MoveCandidate {
    creep: ObjectId,
    from: Position,
    to: Position,
    pulled: bool,
}

pub fn run(ctx: &mut StepCtx) {
    let mut ledger = Ledger::new(ctx.snapshot);

    // Say is purely cosmetic and rides the action log
    for v in ctx.batch.select(|i| matches!(i, Intent::Say { .. })) {
        if let Intent::Say { message } = &v.intent {
            ctx.writer.patch(
                v.actor,
                ObjectPatch::log(ActionLog { say: Some(message.clone()), ..Default::default() }),
            );
        }
    }

    let mut moves: AHashMap<ObjectId, crate::core::types::Direction> = AHashMap::new();
    for v in ctx.batch.select(|i| matches!(i, Intent::Move { .. })) {
        if let Intent::Move { direction } = v.intent {
            moves.entry(v.actor).or_insert(direction);
        }
    }

    // Pull graph: pulled -> puller, first submission wins per pulled creep
    let mut pulled_by: AHashMap<ObjectId, ObjectId> = AHashMap::new();
    for v in ctx.batch.select(|i| matches!(i, Intent::Pull { .. })) {
        if let Intent::Pull { target } = v.intent {
            pulled_by.entry(target).or_insert(v.actor);
        }
    }
    reject_pull_cycles(&mut pulled_by, &mut moves);

    // Fatigue decays every tick, move intent or not
    let tired: Vec<(ObjectId, u32)> = ctx
        .snapshot
        .of_kind(ObjectKind::Creep)
        .filter(|c| c.fatigue > 0)
        .map(|c| (c.id, move_power(c)))
        .collect();
    for (creep_id, decay) in tired {
        if let Some(c) = ledger.get_mut(creep_id, &ctx.writer) {
            c.fatigue = c.fatigue.saturating_sub(decay);
        }
    }

    let mut candidates: Vec<MoveCandidate> = Vec::new();
    let mut move_ids: Vec<ObjectId> = moves.keys().copied().collect();
    move_ids.sort();
    for creep_id in move_ids {
        let Some(creep) = ctx.snapshot.get(creep_id) else { continue };
        let is_pulled = pulled_by.contains_key(&creep_id);
        // Standing fatigued: the decay above is all that happens
        if creep.fatigue > 0 && !is_pulled {
            continue;
        }
        let to = if is_pulled {
            // Displaced onto the puller's origin tile instead of its own
            // requested direction
            let puller = pulled_by[&creep_id];
            match ctx.snapshot.get(puller) {
                Some(p) if p.pos.is_adjacent(&creep.pos) => p.pos,
                _ => continue,
            }
        } else {
            match creep.pos.step(moves[&creep_id]) {
                Some(pos) => pos,
                None => continue,
            }
        };
        // Terrain/structure re-check: validation only guarantees intent
        // shape, not walkability
        if tile_blocked(ctx.snapshot, to, creep.owner.as_ref()) {
            continue;
        }
        candidates.push(MoveCandidate { creep: creep_id, from: creep.pos, to, pulled: is_pulled });
    }

    // Position conflicts: pulled creeps first, then lowest id
    let mut by_target: AHashMap<Position, MoveCandidate> = AHashMap::new();
    candidates.sort_by_key(|c| (c.to, !c.pulled, c.creep));
    for cand in candidates {
        by_target.entry(cand.to).or_insert(cand);
    }
    let mut pending: Vec<MoveCandidate> = by_target.into_values().collect();
    pending.sort_by_key(|c| (!c.pulled, c.creep));

    // Iterative grant: a mover may enter a tile once every creep on it has
    // itself been granted a move. Mutual swaps resolve in the second phase.
    let mut granted: AHashMap<ObjectId, MoveCandidate> = AHashMap::new();
    loop {
        let mut progress = false;
        pending.retain(|cand| {
            let blockers = standing_creeps(ctx.snapshot, cand.to, &granted, cand.creep);
            if blockers.is_empty() {
                granted.insert(cand.creep, *cand);
                progress = true;
                false
            } else {
                true
            }
        });
        if !progress {
            // Swap resolution: A -> B's tile while B -> A's tile
            let mut swapped: Vec<MoveCandidate> = Vec::new();
            for a in &pending {
                if swapped.iter().any(|s: &MoveCandidate| s.creep == a.creep) {
                    continue;
                }
                let partner = pending.iter().find(|b| {
                    b.creep != a.creep && b.to == a.from && a.to == b.from
                });
                if let Some(b) = partner {
                    swapped.push(*a);
                    swapped.push(*b);
                }
            }
            if swapped.is_empty() {
                break;
            }
            for cand in &swapped {
                granted.insert(cand.creep, *cand);
            }
            let ids: AHashSet<ObjectId> = swapped.iter().map(|c| c.creep).collect();
            pending.retain(|c| !ids.contains(&c.creep));
        }
    }

    // Apply grants: position change plus terrain fatigue
    let mut grant_list: Vec<MoveCandidate> = granted.into_values().collect();
    grant_list.sort_by_key(|c| c.creep);
    for cand in grant_list {
        let cost = terrain_cost(ctx, cand.to);
        let Some(creep) = ledger.get_mut(cand.creep, &ctx.writer) else { continue };
        creep.pos = cand.to;
        if !cand.pulled {
            let weight = loaded_parts(creep);
            let power = move_power(creep);
            creep.fatigue = (weight * cost).saturating_sub(power);
        }
    }

    ledger.flush(&mut ctx.writer);
}

/// Fatigue removed per tick by active MOVE parts, honoring move boosts
fn move_power(creep: &RoomObject) -> u32 {
    creep.body_power(PartType::Move, BoostAction::Fatigue, MOVE_FATIGUE_POWER)
}

/// Body weight for fatigue: every non-MOVE part counts, except CARRY parts
/// while the store is empty
fn loaded_parts(creep: &RoomObject) -> u32 {
    let carrying = !creep.store.is_empty();
    creep
        .body
        .iter()
        .filter(|p| match p.part {
            PartType::Move => false,
            PartType::Carry => carrying,
            _ => true,
        })
        .count() as u32
}

fn terrain_cost(ctx: &StepCtx, pos: Position) -> u32 {
    if ctx.snapshot.at(pos).any(|o| o.kind == ObjectKind::Road) {
        FATIGUE_COST_ROAD
    } else {
        ctx.snapshot.terrain.movement_cost(pos).unwrap_or(0)
    }
}

/// Creeps standing on a tile that have not been granted a move away
fn standing_creeps(
    snapshot: &crate::state::room::RoomSnapshot,
    pos: Position,
    granted: &AHashMap<ObjectId, MoveCandidate>,
    mover: ObjectId,
) -> Vec<ObjectId> {
    snapshot
        .at(pos)
        .filter(|o| {
            matches!(o.kind, ObjectKind::Creep | ObjectKind::PowerCreep)
                && o.id != mover
                && o.hits.map(|h| h > 0).unwrap_or(false)
                && !granted.contains_key(&o.id)
        })
        .map(|o| o.id)
        .collect()
}

/// Detect cycles in the pull graph (A pulls B, B pulls A, possibly through
/// a longer chain) and reject every pull and move on the cycle. The
/// reference implementation's behaviour here is undefined; deterministic
/// rejection replaces it.
fn reject_pull_cycles(
    pulled_by: &mut AHashMap<ObjectId, ObjectId>,
    moves: &mut AHashMap<ObjectId, crate::core::types::Direction>,
) {
    let mut on_cycle: AHashSet<ObjectId> = AHashSet::new();
    let mut keys: Vec<ObjectId> = pulled_by.keys().copied().collect();
    keys.sort();
    for start in keys {
        let mut visited: Vec<ObjectId> = vec![start];
        let mut current = start;
        while let Some(&puller) = pulled_by.get(&current) {
            if let Some(idx) = visited.iter().position(|v| *v == puller) {
                on_cycle.extend(visited[idx..].iter().copied());
                break;
            }
            visited.push(puller);
            current = puller;
        }
    }
    for id in &on_cycle {
        pulled_by.remove(id);
        moves.remove(id);
    }
    pulled_by.retain(|_, puller| !on_cycle.contains(puller));
}
