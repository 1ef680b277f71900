//! Power spawn processing
//!
//! Processing burns 50 energy per unit of power and credits the processed
//! power to the owner's account through the global writer.

use crate::constants::POWER_SPAWN_ENERGY_RATIO;
use crate::core::types::ObjectId;
use crate::intents::record::Intent;
use crate::mutation::ledger::Ledger;
use crate::simulation::StepCtx;
use crate::state::object::{ObjectKind, ResourceType};

pub fn run(ctx: &mut StepCtx) {
    let mut ledger = Ledger::new(ctx.snapshot);

    let actions: Vec<(ObjectId, crate::core::types::UserId)> = ctx
        .batch
        .select(|i| matches!(i, Intent::ProcessPower))
        .map(|v| (v.actor, v.user.clone()))
        .collect();

    for (spawn_id, user) in actions {
        if ctx.writer.is_removed(spawn_id) {
            continue;
        }
        let Some(power_spawn) = ledger.get_mut(spawn_id, &ctx.writer) else { continue };
        if power_spawn.kind != ObjectKind::PowerSpawn {
            continue;
        }
        if power_spawn.store.get(ResourceType::Power) < 1
            || power_spawn.store.get(ResourceType::Energy) < POWER_SPAWN_ENERGY_RATIO
        {
            continue;
        }
        power_spawn.store.remove(ResourceType::Power, 1);
        power_spawn.store.remove(ResourceType::Energy, POWER_SPAWN_ENERGY_RATIO);
        ctx.global.add_power(&user, 1);
        ctx.stats.power_processed(&user, 1);
    }

    ledger.flush(&mut ctx.writer);
}
