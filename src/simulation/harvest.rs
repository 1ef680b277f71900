//! Harvesting sources and minerals
//!
//! Source yield is `min(sourceEnergy, boosted(workParts × HARVEST_POWER))`:
//! the boost multiplies before the source cap applies. Whatever exceeds the
//! creep's free capacity drops to the ground at its tile. Mineral harvest
//! additionally puts the aligned extractor on cooldown.

use crate::constants::{
    BoostAction, EXTRACTOR_COOLDOWN, HARVEST_MINERAL_POWER, HARVEST_POWER,
};
use crate::core::types::ObjectId;
use crate::intents::record::Intent;
use crate::mutation::ledger::Ledger;
use crate::mutation::patch::{ActionLog, ObjectPatch};
use crate::simulation::{drop_resource, shed_overflow, StepCtx};
use crate::state::events::TickEvent;
use crate::state::object::{ObjectKind, PartType, ResourceType};

pub fn run(ctx: &mut StepCtx) {
    let mut ledger = Ledger::new(ctx.snapshot);

    let actions: Vec<(ObjectId, crate::core::types::UserId, ObjectId)> = ctx
        .batch
        .select(|i| matches!(i, Intent::Harvest { .. }))
        .filter_map(|v| match v.intent {
            Intent::Harvest { target } => Some((v.actor, v.user.clone(), target)),
            _ => None,
        })
        .collect();

    for (actor_id, user, target_id) in actions {
        if ctx.writer.is_removed(actor_id) || ctx.writer.is_removed(target_id) {
            continue;
        }
        let target_kind = match ledger.get(target_id) {
            Some(t) => t.kind,
            None => continue,
        };
        match target_kind {
            ObjectKind::Source => harvest_source(ctx, &mut ledger, actor_id, &user, target_id),
            ObjectKind::Mineral => harvest_mineral(ctx, &mut ledger, actor_id, target_id),
            _ => {}
        }
    }

    ledger.flush(&mut ctx.writer);
}

fn harvest_source(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    actor_id: ObjectId,
    user: &crate::core::types::UserId,
    source_id: ObjectId,
) {
    let power = match ledger.get(actor_id) {
        Some(creep) => creep.body_power(PartType::Work, BoostAction::Harvest, HARVEST_POWER),
        None => return,
    };
    let amount = {
        let Some(source) = ledger.get_mut(source_id, &ctx.writer) else { return };
        let available = source.store.get(ResourceType::Energy);
        let amount = power.min(available);
        source.store.remove(ResourceType::Energy, amount);
        amount
    };
    if amount == 0 {
        return;
    }
    if let Some(creep) = ledger.get_mut(actor_id, &ctx.writer) {
        creep.store.add(ResourceType::Energy, amount);
    }
    // Anything beyond capacity falls to the ground as a pile
    shed_overflow(ctx, ledger, actor_id);
    ctx.stats.energy_harvested(user, amount as u64);
    ctx.writer.patch(
        actor_id,
        ObjectPatch::log(ActionLog { harvested: Some(amount), ..Default::default() }),
    );
    ctx.emit(TickEvent::Harvest { creep: actor_id, target: source_id, amount });
}

fn harvest_mineral(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    actor_id: ObjectId,
    mineral_id: ObjectId,
) {
    let power = match ledger.get(actor_id) {
        Some(creep) => {
            creep.body_power(PartType::Work, BoostAction::Harvest, HARVEST_MINERAL_POWER)
        }
        None => return,
    };
    let (resource, amount, mineral_pos) = {
        let Some(mineral) = ledger.get_mut(mineral_id, &ctx.writer) else { return };
        let Some(resource) = mineral.mineral_type else { return };
        let remaining = mineral.amount.unwrap_or(0);
        let amount = power.min(remaining);
        mineral.amount = Some(remaining - amount);
        (resource, amount, mineral.pos)
    };
    if amount == 0 {
        return;
    }
    // Direct gains first; overflow spills to ground
    if let Some(creep) = ledger.get_mut(actor_id, &ctx.writer) {
        creep.store.add(resource, amount);
    }
    shed_overflow(ctx, ledger, actor_id);

    // The aligned extractor cools down; validation guaranteed it exists
    let extractor = ctx
        .snapshot
        .of_kind(ObjectKind::Extractor)
        .find(|e| e.pos == mineral_pos)
        .map(|e| e.id);
    if let Some(extractor_id) = extractor {
        if let Some(extractor) = ledger.get_mut(extractor_id, &ctx.writer) {
            extractor.cooldown_time = Some(ctx.snapshot.game_time + EXTRACTOR_COOLDOWN);
        }
    }
    ctx.writer.patch(
        actor_id,
        ObjectPatch::log(ActionLog { harvested: Some(amount), ..Default::default() }),
    );
    ctx.emit(TickEvent::Harvest { creep: actor_id, target: mineral_id, amount });
}
