//! Factory production
//!
//! A production consumes every recipe component atomically: if any input
//! is short, nothing is taken. Level-gated recipes need a factory of at
//! least that level. Cooldown accumulates when several productions land in
//! the same tick.

use crate::constants;
use crate::core::types::ObjectId;
use crate::intents::record::Intent;
use crate::mutation::ledger::Ledger;
use crate::simulation::StepCtx;
use crate::state::object::{ObjectKind, ResourceType};

pub fn run(ctx: &mut StepCtx) {
    let mut ledger = Ledger::new(ctx.snapshot);

    let actions: Vec<(ObjectId, ResourceType)> = ctx
        .batch
        .select(|i| matches!(i, Intent::FactoryProduce { .. }))
        .filter_map(|v| match v.intent {
            Intent::FactoryProduce { product } => Some((v.actor, product)),
            _ => None,
        })
        .collect();

    for (factory_id, product) in actions {
        if ctx.writer.is_removed(factory_id) {
            continue;
        }
        let Some(recipe) = constants::factory_recipe(product) else { continue };
        let game_time = ctx.snapshot.game_time;
        let Some(factory) = ledger.get_mut(factory_id, &ctx.writer) else { continue };
        if factory.kind != ObjectKind::Factory {
            continue;
        }
        if recipe.level > 0 && factory.level.unwrap_or(0) < recipe.level {
            continue;
        }
        // All-or-nothing component check
        let short = recipe
            .components
            .iter()
            .any(|(resource, amount)| factory.store.get(*resource) < *amount);
        if short {
            continue;
        }
        if factory.free_capacity(product) < recipe.output_amount {
            continue;
        }
        for (resource, amount) in recipe.components {
            factory.store.remove(*resource, *amount);
        }
        factory.store.add(product, recipe.output_amount);
        let base = factory.cooldown_time.unwrap_or(game_time).max(game_time);
        factory.cooldown_time = Some(base + recipe.cooldown);
    }

    ledger.flush(&mut ctx.writer);
}
