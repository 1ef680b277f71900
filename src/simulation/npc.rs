//! NPC behaviour: keeper lairs and hostile NPC creeps
//!
//! NPC creeps carry no scripts; their behaviour is re-derived every tick
//! from positions plus the single `npc_memory` slot (chosen target and a
//! cached path with its timestamp). A cached path is reused while it is
//! fresh and the target unchanged, otherwise a new straight-line step is
//! computed.

use crate::constants::{
    BoostAction, ATTACK_POWER, HEAL_POWER, KEEPER_SPAWN_TIME, NPC_MASS_ATTACK_THRESHOLD,
    RANGED_ATTACK_FALLOFF, RANGED_ATTACK_POWER,
};
use crate::core::types::{ObjectId, Position};
use crate::mutation::ledger::Ledger;
use crate::simulation::{combat, tile_blocked, StepCtx};
use crate::state::events::TickEvent;
use crate::state::object::{
    BodyPart, NpcMemory, ObjectKind, PartType, RoomObject,
};

pub fn run(ctx: &mut StepCtx) {
    let mut ledger = Ledger::new(ctx.snapshot);

    respawn_keepers(ctx, &mut ledger);

    let npcs: Vec<ObjectId> = ctx
        .snapshot
        .of_kind(ObjectKind::Creep)
        .filter(|c| c.is_npc(&ctx.snapshot.users) && !c.is_spawning)
        .map(|c| c.id)
        .collect();

    for npc_id in npcs {
        if ctx.writer.is_removed(npc_id) {
            continue;
        }
        act(ctx, &mut ledger, npc_id);
    }

    ledger.flush(&mut ctx.writer);
}

/// A lair with no live keeper arms its timer; when the timer runs out a
/// fresh keeper appears on the lair tile.
fn respawn_keepers(ctx: &mut StepCtx, ledger: &mut Ledger) {
    let game_time = ctx.snapshot.game_time;
    let lairs: Vec<ObjectId> = ctx
        .snapshot
        .of_kind(ObjectKind::KeeperLair)
        .map(|l| l.id)
        .collect();
    for lair_id in lairs {
        let (pos, owner, cooldown) = match ledger.get(lair_id) {
            Some(lair) => (lair.pos, lair.owner.clone(), lair.cooldown_time),
            None => continue,
        };
        let Some(owner) = owner else { continue };
        let keeper_alive = ctx
            .snapshot
            .of_kind(ObjectKind::Creep)
            .any(|c| c.owner.as_ref() == Some(&owner) && c.pos.range_to(&pos) <= 5);
        match cooldown {
            _ if keeper_alive => {
                if let Some(lair) = ledger.get_mut(lair_id, &ctx.writer) {
                    lair.cooldown_time = None;
                }
            }
            None => {
                if let Some(lair) = ledger.get_mut(lair_id, &ctx.writer) {
                    lair.cooldown_time = Some(game_time + KEEPER_SPAWN_TIME);
                }
            }
            Some(t) if t <= game_time => {
                let keeper = keeper_body(
                    ObjectId::derive(game_time, "keeper", lair_id.hash64()),
                    pos,
                    ctx.snapshot.name,
                    owner,
                );
                ctx.writer.upsert(keeper);
                if let Some(lair) = ledger.get_mut(lair_id, &ctx.writer) {
                    lair.cooldown_time = None;
                }
            }
            Some(_) => {}
        }
    }
}

fn keeper_body(
    id: ObjectId,
    pos: Position,
    room: crate::core::types::RoomName,
    owner: crate::core::types::UserId,
) -> RoomObject {
    let mut parts: Vec<BodyPart> = Vec::with_capacity(50);
    parts.extend(std::iter::repeat_with(|| BodyPart::new(PartType::Tough)).take(17));
    parts.extend(std::iter::repeat_with(|| BodyPart::new(PartType::Move)).take(13));
    parts.extend(std::iter::repeat_with(|| BodyPart::new(PartType::Attack)).take(10));
    parts.extend(std::iter::repeat_with(|| BodyPart::new(PartType::RangedAttack)).take(10));
    let hits = parts.len() as u32 * crate::state::object::BODY_PART_HITS as u32;
    let mut keeper = RoomObject::new(id, ObjectKind::Creep, pos, room);
    keeper.owner = Some(owner);
    keeper.body = parts;
    keeper.hits = Some(hits);
    keeper.hits_max = Some(hits);
    keeper.npc_memory = Some(NpcMemory::default());
    keeper
}

fn act(ctx: &mut StepCtx, ledger: &mut Ledger, npc_id: ObjectId) {
    let Some(npc) = ledger.get(npc_id).cloned() else { return };

    // Hostiles, nearest first with id as tiebreak
    let mut hostiles: Vec<(u32, ObjectId, u32, Position)> = ctx
        .snapshot
        .of_kind(ObjectKind::Creep)
        .filter(|c| {
            c.owner != npc.owner
                && !c.is_spawning
                && c.owner
                    .as_ref()
                    .map(|o| !ctx.snapshot.is_npc_user(o))
                    .unwrap_or(false)
        })
        .map(|c| (npc.pos.range_to(&c.pos), c.id, c.hits.unwrap_or(0), c.pos))
        .collect();
    hostiles.sort_by_key(|(range, id, _, _)| (*range, *id));

    let Some(&(nearest_range, nearest_id, _, nearest_pos)) = hostiles.first() else {
        heal_self(ctx, ledger, npc_id, &npc);
        return;
    };

    let ranged_power =
        npc.body_power(PartType::RangedAttack, BoostAction::RangedAttack, RANGED_ATTACK_POWER);
    if ranged_power > 0 {
        // Mass attack once enough summed damage is in range
        let summed: u32 = hostiles
            .iter()
            .filter(|(range, ..)| (*range as usize) < RANGED_ATTACK_FALLOFF.len())
            .map(|(range, ..)| {
                ranged_power * RANGED_ATTACK_FALLOFF[*range as usize] / RANGED_ATTACK_POWER
            })
            .sum();
        if summed >= NPC_MASS_ATTACK_THRESHOLD {
            let in_range: Vec<(ObjectId, u32)> = hostiles
                .iter()
                .filter(|(range, ..)| (*range as usize) < RANGED_ATTACK_FALLOFF.len())
                .map(|(range, id, ..)| (*id, *range))
                .collect();
            for (target, range) in in_range {
                let damage =
                    ranged_power * RANGED_ATTACK_FALLOFF[range as usize] / RANGED_ATTACK_POWER;
                let dealt = combat::apply_damage(ctx, ledger, target, damage);
                if dealt > 0 {
                    ctx.emit(TickEvent::Attack { attacker: npc_id, target, damage: dealt });
                }
            }
        } else if let Some((range, target, ..)) = hostiles
            .iter()
            .copied()
            .filter(|(range, ..)| (*range as usize) < RANGED_ATTACK_FALLOFF.len())
            .min_by_key(|(_, id, hits, _)| (*hits, *id))
        {
            let damage = ranged_power * RANGED_ATTACK_FALLOFF[range as usize] / RANGED_ATTACK_POWER;
            let dealt = combat::apply_damage(ctx, ledger, target, damage);
            if dealt > 0 {
                ctx.emit(TickEvent::Attack { attacker: npc_id, target, damage: dealt });
            }
        }
    }

    // Melee the weakest adjacent hostile
    let melee_power = npc.body_power(PartType::Attack, BoostAction::Attack, ATTACK_POWER);
    if melee_power > 0 {
        let adjacent = hostiles
            .iter()
            .filter(|(range, ..)| *range <= 1)
            .min_by_key(|(_, id, hits, _)| (*hits, *id))
            .map(|(_, id, ..)| *id);
        if let Some(target) = adjacent {
            let dealt = combat::apply_damage(ctx, ledger, target, melee_power);
            if dealt > 0 {
                ctx.emit(TickEvent::Attack { attacker: npc_id, target, damage: dealt });
            }
        }
    }

    heal_self(ctx, ledger, npc_id, &npc);

    if nearest_range > 1 && npc.fatigue == 0 {
        approach(ctx, ledger, npc_id, &npc, nearest_id, nearest_pos);
    }
}

/// Keepers (and any healing-capable NPC) patch themselves up when hurt
fn heal_self(ctx: &mut StepCtx, ledger: &mut Ledger, npc_id: ObjectId, npc: &RoomObject) {
    let heal = npc.body_power(PartType::Heal, BoostAction::Heal, HEAL_POWER);
    if heal == 0 || npc.hits >= npc.hits_max {
        return;
    }
    let healed = combat::heal_target(ctx, ledger, npc_id, heal);
    if healed > 0 {
        ctx.emit(TickEvent::Heal { healer: npc_id, target: npc_id, amount: healed });
    }
}

/// One step toward the target. The cached path is reused while fresh;
/// otherwise a straight-line step is computed and cached.
fn approach(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    npc_id: ObjectId,
    npc: &RoomObject,
    target_id: ObjectId,
    target_pos: Position,
) {
    let game_time = ctx.snapshot.game_time;
    let cache_ticks = ctx.config.npc_path_cache_ticks;

    // Cache hit needs the same target and a fresh enough path
    let cached_step = npc.npc_memory.as_ref().and_then(|memory| {
        let fresh = memory.target == Some(target_id)
            && game_time.saturating_sub(memory.path_time) <= cache_ticks;
        if fresh {
            memory.path.first().copied()
        } else {
            None
        }
    });
    let (dir, fresh_path) = match cached_step {
        Some(d) => (d, None),
        None => {
            let path = straight_path(npc.pos, target_pos, cache_ticks as usize + 1);
            match path.first().copied() {
                Some(d) => (d, Some(path)),
                None => return,
            }
        }
    };
    let Some(next) = npc.pos.step(dir) else { return };
    // Single-mover collision rules: terrain, structures, standing creeps
    let occupied = ctx.snapshot.at(next).any(|o| {
        matches!(o.kind, ObjectKind::Creep | ObjectKind::PowerCreep)
            && o.hits.map(|h| h > 0).unwrap_or(false)
    });
    if occupied || tile_blocked(ctx.snapshot, next, npc.owner.as_ref()) {
        if let Some(creep) = ledger.get_mut(npc_id, &ctx.writer) {
            if let Some(memory) = creep.npc_memory.as_mut() {
                memory.path.clear();
            }
        }
        return;
    }
    if let Some(creep) = ledger.get_mut(npc_id, &ctx.writer) {
        creep.pos = next;
        let memory = creep.npc_memory.get_or_insert_with(NpcMemory::default);
        memory.target = Some(target_id);
        if let Some(path) = fresh_path {
            memory.path = path;
            memory.path_time = game_time;
        }
        if !memory.path.is_empty() {
            memory.path.remove(0);
        }
    }
}

/// Greedy straight-line path of at most `limit` steps toward the target,
/// ignoring obstacles; collisions invalidate the cache when walked.
fn straight_path(from: Position, to: Position, limit: usize) -> Vec<crate::core::types::Direction> {
    let mut path = Vec::with_capacity(limit);
    let mut cursor = from;
    while path.len() < limit {
        let Some(dir) = cursor.direction_to(&to) else { break };
        let Some(next) = cursor.step(dir) else { break };
        if next.range_to(&to) == 0 {
            break;
        }
        path.push(dir);
        cursor = next;
    }
    path
}
