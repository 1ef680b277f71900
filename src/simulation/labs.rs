//! Lab reactions and creep boosting
//!
//! A reaction pulls 5 units out of each reagent lab, deposits the compound
//! into the output lab and puts the output lab on the product's cooldown.
//! Boosting walks the creep's body front-to-back and boosts the first N
//! unboosted parts of the compound's part type, 30 mineral and 20 energy
//! per part.

use crate::constants::{self, LAB_BOOST_ENERGY, LAB_BOOST_MINERAL, LAB_REACT_AMOUNT};
use crate::core::types::ObjectId;
use crate::intents::record::Intent;
use crate::mutation::ledger::Ledger;
use crate::simulation::StepCtx;
use crate::state::object::{ObjectKind, ResourceType};

pub fn run(ctx: &mut StepCtx) {
    let mut ledger = Ledger::new(ctx.snapshot);

    let actions: Vec<(ObjectId, Intent)> = ctx
        .batch
        .select(|i| matches!(i, Intent::RunReaction { .. } | Intent::BoostCreep { .. }))
        .map(|v| (v.actor, v.intent.clone()))
        .collect();

    for (actor_id, intent) in actions {
        if ctx.writer.is_removed(actor_id) {
            continue;
        }
        match intent {
            Intent::RunReaction { lab1, lab2 } => {
                run_reaction(ctx, &mut ledger, actor_id, lab1, lab2);
            }
            Intent::BoostCreep { target, parts_count } => {
                boost_creep(ctx, &mut ledger, actor_id, target, parts_count);
            }
            _ => unreachable!("labs step selected a foreign intent"),
        }
    }

    ledger.flush(&mut ctx.writer);
}

fn run_reaction(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    output_id: ObjectId,
    lab1_id: ObjectId,
    lab2_id: ObjectId,
) {
    if ctx.writer.is_removed(lab1_id) || ctx.writer.is_removed(lab2_id) {
        return;
    }
    let reagent = |ledger: &Ledger, id: ObjectId| -> Option<ResourceType> {
        let lab = ledger.get(id)?;
        if lab.kind != ObjectKind::Lab {
            return None;
        }
        let mineral = lab.lab_mineral()?;
        (lab.store.get(mineral) >= LAB_REACT_AMOUNT).then_some(mineral)
    };
    let Some(r1) = reagent(ledger, lab1_id) else { return };
    let Some(r2) = reagent(ledger, lab2_id) else { return };
    let Some(product) = constants::reaction_product(r1, r2) else { return };
    let free = match ledger.get(output_id) {
        Some(lab) if lab.kind == ObjectKind::Lab => lab.free_capacity(product),
        _ => return,
    };
    if free < LAB_REACT_AMOUNT {
        return;
    }
    if let Some(lab) = ledger.get_mut(lab1_id, &ctx.writer) {
        lab.store.remove(r1, LAB_REACT_AMOUNT);
    }
    if let Some(lab) = ledger.get_mut(lab2_id, &ctx.writer) {
        lab.store.remove(r2, LAB_REACT_AMOUNT);
    }
    if let Some(lab) = ledger.get_mut(output_id, &ctx.writer) {
        lab.store.add(product, LAB_REACT_AMOUNT);
        lab.cooldown_time = Some(ctx.snapshot.game_time + constants::reaction_time(product));
    }
}

fn boost_creep(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    lab_id: ObjectId,
    creep_id: ObjectId,
    parts_count: Option<u32>,
) {
    if ctx.writer.is_removed(creep_id) {
        return;
    }
    let compound = match ledger.get(lab_id) {
        Some(lab) if lab.kind == ObjectKind::Lab => match lab.lab_mineral() {
            Some(c) => c,
            None => return,
        },
        _ => return,
    };
    let Some(part_type) = constants::boost_part(compound) else { return };
    let (mineral, energy) = match ledger.get(lab_id) {
        Some(lab) => (lab.store.get(compound), lab.store.get(ResourceType::Energy)),
        None => return,
    };
    let affordable = (mineral / LAB_BOOST_MINERAL).min(energy / LAB_BOOST_ENERGY);
    let requested = parts_count.unwrap_or(u32::MAX);

    // First N unboosted parts of the type, in body order
    let boosted = {
        let Some(creep) = ledger.get_mut(creep_id, &ctx.writer) else { return };
        let mut done = 0u32;
        for part in creep.body.iter_mut() {
            if done >= affordable.min(requested) {
                break;
            }
            if part.part == part_type && part.boost.is_none() {
                part.boost = Some(compound);
                done += 1;
            }
        }
        done
    };
    if boosted == 0 {
        return;
    }
    if let Some(creep) = ledger.get_mut(creep_id, &ctx.writer) {
        // Capacity boosts change how much the body can carry
        creep.store_capacity = Some(creep.body_carry_capacity());
    }
    if let Some(lab) = ledger.get_mut(lab_id, &ctx.writer) {
        lab.store.remove(compound, boosted * LAB_BOOST_MINERAL);
        lab.store.remove(ResourceType::Energy, boosted * LAB_BOOST_ENERGY);
    }
}
