//! Combat resolution: melee, ranged, mass attack, heals, death processing
//!
//! Damage helpers here are shared with towers, nukes and NPC AI. A rampart
//! on the target's tile absorbs damage first; only the remainder reaches
//! the underlying object. Body parts lose hits front-to-back, and boosted
//! TOUGH parts absorb more damage per hit point.

use crate::constants::{
    self, BoostAction, ATTACK_POWER, HEAL_POWER, RANGED_ATTACK_FALLOFF, RANGED_ATTACK_POWER,
    RANGED_HEAL_POWER,
};
use crate::core::types::ObjectId;
use crate::intents::record::Intent;
use crate::mutation::ledger::Ledger;
use crate::mutation::patch::{ActionLog, ObjectPatch};
use crate::simulation::StepCtx;
use crate::state::events::TickEvent;
use crate::state::object::{ObjectKind, PartType, ResourceType, RoomObject};

/// Why a creep died; recycle refunds the full body cost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeathCause {
    Combat,
    Age,
    Suicide,
    Recycle,
}

pub fn run(ctx: &mut StepCtx) {
    let mut ledger = Ledger::new(ctx.snapshot);

    let actions: Vec<(ObjectId, Intent)> = ctx
        .batch
        .select(|i| {
            matches!(
                i,
                Intent::Attack { .. }
                    | Intent::RangedAttack { .. }
                    | Intent::RangedMassAttack
                    | Intent::Heal { .. }
                    | Intent::RangedHeal { .. }
            )
        })
        .map(|v| (v.actor, v.intent.clone()))
        .collect();

    for (actor_id, intent) in actions {
        // Attacker state comes from the ledger: parts destroyed earlier in
        // this step no longer contribute power.
        let Some(actor) = ledger.get(actor_id).cloned() else { continue };
        if ctx.writer.is_removed(actor_id) || actor.hits == Some(0) {
            continue;
        }
        match intent {
            Intent::Attack { target } => {
                let damage = actor.body_power(PartType::Attack, BoostAction::Attack, ATTACK_POWER);
                let dealt = apply_damage(ctx, &mut ledger, target, damage);
                if dealt > 0 {
                    ctx.writer.patch(
                        actor_id,
                        ObjectPatch::log(ActionLog { attacked: Some(target), ..Default::default() }),
                    );
                    ctx.emit(TickEvent::Attack { attacker: actor_id, target, damage: dealt });
                }
            }
            Intent::RangedAttack { target } => {
                // Stricter per-target falloff re-check on top of the
                // pipeline's range <= 3 guarantee
                let Some(target_obj) = ledger.get(target) else { continue };
                let range = actor.pos.range_to(&target_obj.pos) as usize;
                if range >= RANGED_ATTACK_FALLOFF.len() {
                    continue;
                }
                let power = actor.body_power(
                    PartType::RangedAttack,
                    BoostAction::RangedAttack,
                    RANGED_ATTACK_POWER,
                );
                let damage = power * RANGED_ATTACK_FALLOFF[range] / RANGED_ATTACK_POWER;
                let dealt = apply_damage(ctx, &mut ledger, target, damage);
                if dealt > 0 {
                    ctx.writer.patch(
                        actor_id,
                        ObjectPatch::log(ActionLog { attacked: Some(target), ..Default::default() }),
                    );
                    ctx.emit(TickEvent::Attack { attacker: actor_id, target, damage: dealt });
                }
            }
            Intent::RangedMassAttack => {
                let power = actor.body_power(
                    PartType::RangedAttack,
                    BoostAction::RangedAttack,
                    RANGED_ATTACK_POWER,
                );
                let targets: Vec<(ObjectId, usize)> = ctx
                    .snapshot
                    .iter()
                    .filter(|o| is_mass_attack_target(o, &actor))
                    .filter_map(|o| {
                        let range = actor.pos.range_to(&o.pos) as usize;
                        (range < RANGED_ATTACK_FALLOFF.len()).then_some((o.id, range))
                    })
                    .collect();
                for (target, range) in targets {
                    let damage = power * RANGED_ATTACK_FALLOFF[range] / RANGED_ATTACK_POWER;
                    let dealt = apply_damage(ctx, &mut ledger, target, damage);
                    if dealt > 0 {
                        ctx.emit(TickEvent::Attack { attacker: actor_id, target, damage: dealt });
                    }
                }
            }
            Intent::Heal { target } => {
                let amount = actor.body_power(PartType::Heal, BoostAction::Heal, HEAL_POWER);
                let healed = heal_target(ctx, &mut ledger, target, amount);
                if healed > 0 {
                    ctx.writer.patch(
                        actor_id,
                        ObjectPatch::log(ActionLog { healed: Some(target), ..Default::default() }),
                    );
                    ctx.emit(TickEvent::Heal { healer: actor_id, target, amount: healed });
                }
            }
            Intent::RangedHeal { target } => {
                let Some(target_obj) = ledger.get(target) else { continue };
                // Adjacent targets get the melee heal rate
                let amount = if actor.pos.is_adjacent(&target_obj.pos) {
                    actor.body_power(PartType::Heal, BoostAction::Heal, HEAL_POWER)
                } else {
                    actor.body_power(PartType::Heal, BoostAction::Heal, RANGED_HEAL_POWER)
                };
                let healed = heal_target(ctx, &mut ledger, target, amount);
                if healed > 0 {
                    ctx.emit(TickEvent::Heal { healer: actor_id, target, amount: healed });
                }
            }
            _ => unreachable!("combat step selected a non-combat intent"),
        }
    }

    ledger.flush(&mut ctx.writer);
}

fn is_mass_attack_target(obj: &RoomObject, actor: &RoomObject) -> bool {
    let hostile = obj.owner.is_some() && obj.owner != actor.owner;
    match obj.kind {
        ObjectKind::Creep | ObjectKind::PowerCreep => hostile,
        ObjectKind::Rampart | ObjectKind::Controller => false,
        kind => kind.is_structure() && hostile && obj.hits.is_some(),
    }
}

/// Deal damage to a target with rampart-first absorption. Returns the
/// damage that actually landed (absorption included). No-op for removed
/// targets and targets without hit points.
pub(crate) fn apply_damage(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    target_id: ObjectId,
    damage: u32,
) -> u32 {
    if damage == 0 || ctx.writer.is_removed(target_id) {
        return 0;
    }
    let Some(target) = ledger.get(target_id) else { return 0 };
    let target_pos = target.pos;
    let target_kind = target.kind;
    let mut remaining = damage;

    // Rampart on the tile soaks first, unless the rampart is the target
    if target_kind != ObjectKind::Rampart {
        let rampart = ctx
            .snapshot
            .at(target_pos)
            .find(|o| o.kind == ObjectKind::Rampart)
            .map(|o| o.id);
        if let Some(rampart_id) = rampart {
            if let Some(rampart) = ledger.get_mut(rampart_id, &ctx.writer) {
                let hits = rampart.hits.unwrap_or(0);
                let absorbed = remaining.min(hits);
                rampart.hits = Some(hits - absorbed);
                remaining -= absorbed;
                if hits - absorbed == 0 {
                    destroy_structure(ctx, ledger, rampart_id);
                }
            }
        }
    }
    if remaining == 0 {
        return damage;
    }

    match target_kind {
        ObjectKind::Creep | ObjectKind::PowerCreep => {
            let dead = {
                let Some(creep) = ledger.get_mut(target_id, &ctx.writer) else {
                    return damage - remaining;
                };
                apply_body_damage(creep, remaining);
                creep.hits == Some(0)
            };
            if dead {
                kill_creep(ctx, ledger, target_id, DeathCause::Combat);
            }
        }
        _ => {
            let Some(hits) = ledger.get(target_id).and_then(|t| t.hits) else {
                return damage - remaining;
            };
            let new_hits = hits.saturating_sub(remaining);
            if let Some(obj) = ledger.get_mut(target_id, &ctx.writer) {
                obj.hits = Some(new_hits);
            }
            if new_hits == 0 {
                destroy_structure(ctx, ledger, target_id);
            }
        }
    }
    damage
}

/// Damage eats body parts front-to-back. A boosted TOUGH part absorbs
/// `1/multiplier` damage per hit point, so a 0.3 boost triples effective
/// toughness. Creep hits are recomputed from the body afterwards.
fn apply_body_damage(creep: &mut RoomObject, mut damage: u32) {
    for part in creep.body.iter_mut() {
        if damage == 0 {
            break;
        }
        if part.hits == 0 {
            continue;
        }
        let mult = if part.part == PartType::Tough {
            part.boost
                .and_then(|b| constants::boost_multiplier(PartType::Tough, BoostAction::Damage, b))
                .unwrap_or(1.0)
        } else {
            1.0
        };
        let to_destroy = (part.hits as f64 / mult).ceil() as u32;
        if damage >= to_destroy {
            damage -= to_destroy;
            part.hits = 0;
        } else {
            let lost = ((damage as f64 * mult).ceil() as u32).min(part.hits as u32);
            part.hits -= lost as u16;
            damage = 0;
        }
    }
    let total: u32 = creep.body.iter().map(|p| p.hits as u32).sum();
    creep.hits = Some(total);
}

/// Restore a creep's body parts front-to-back. Returns hits restored.
pub(crate) fn heal_target(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    target_id: ObjectId,
    amount: u32,
) -> u32 {
    if amount == 0 || ctx.writer.is_removed(target_id) {
        return 0;
    }
    let Some(creep) = ledger.get_mut(target_id, &ctx.writer) else { return 0 };
    if !matches!(creep.kind, ObjectKind::Creep | ObjectKind::PowerCreep) {
        return 0;
    }
    let mut pool = amount;
    for part in creep.body.iter_mut() {
        if pool == 0 {
            break;
        }
        let missing = (crate::state::object::BODY_PART_HITS - part.hits) as u32;
        let restored = pool.min(missing);
        part.hits += restored as u16;
        pool -= restored;
    }
    let total: u32 = creep.body.iter().map(|p| p.hits as u32).sum();
    let healed = total - creep.hits.unwrap_or(total);
    creep.hits = Some(total);
    healed
}

/// Death processing: remove the creep, insert a tombstone carrying its
/// store plus a cause-dependent energy refund. NPC-faction creeps drop no
/// body refund; recycle refunds the full body cost.
pub(crate) fn kill_creep(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    creep_id: ObjectId,
    cause: DeathCause,
) {
    let Some(creep) = ledger.get(creep_id).cloned() else { return };
    let npc = creep
        .owner
        .as_ref()
        .map(|o| ctx.snapshot.is_npc_user(o))
        .unwrap_or(true);
    let body_cost: u32 = creep.body.iter().map(|p| constants::body_part_cost(p.part)).sum();
    let refund = match cause {
        DeathCause::Recycle => body_cost,
        _ if npc => 0,
        _ => (body_cost as f64 * constants::CREEP_CORPSE_RATE).floor() as u32,
    };

    let game_time = ctx.snapshot.game_time;
    let mut tombstone = RoomObject::new(
        ObjectId::derive(game_time, "tombstone", creep_id.hash64()),
        ObjectKind::Tombstone,
        creep.pos,
        ctx.snapshot.name,
    );
    tombstone.owner = creep.owner.clone();
    tombstone.store = creep.store.clone();
    tombstone.store.add(ResourceType::Energy, refund);
    tombstone.decay_time =
        Some(game_time + creep.body.len() as u64 * constants::TOMBSTONE_DECAY_PER_PART);

    ctx.writer.remove(creep_id);
    ledger.discard(creep_id);
    if !tombstone.store.is_empty() || !npc {
        ctx.writer.upsert(tombstone);
    }
    if let Some(owner) = &creep.owner {
        if !npc {
            ctx.stats.creep_lost(owner);
        }
    }
    ctx.emit(TickEvent::ObjectDestroyed { id: creep_id, kind_tag: "creep".into() });
}

/// Structure death: remove it and leave a ruin holding whatever it stored
pub(crate) fn destroy_structure(ctx: &mut StepCtx, ledger: &mut Ledger, id: ObjectId) {
    let Some(structure) = ledger.get(id).cloned() else { return };
    let game_time = ctx.snapshot.game_time;
    ctx.writer.remove(id);
    ledger.discard(id);
    if structure.kind.is_structure() {
        let mut ruin = RoomObject::new(
            ObjectId::derive(game_time, "ruin", id.hash64()),
            ObjectKind::Ruin,
            structure.pos,
            ctx.snapshot.name,
        );
        ruin.owner = structure.owner.clone();
        ruin.store = structure.store.clone();
        ruin.structure_type = Some(structure.kind);
        ruin.decay_time = Some(game_time + constants::RUIN_DECAY);
        if !ruin.store.is_empty() {
            ctx.writer.upsert(ruin);
        }
    }
    ctx.emit(TickEvent::ObjectDestroyed { id, kind_tag: format!("{:?}", structure.kind) });
}
