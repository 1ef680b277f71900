//! Resource transfer: transfer, withdraw, pickup, drop
//!
//! All amounts are min-capped against what the giver holds and the free
//! space of the receiver; a capped transfer still happens at the reduced
//! amount rather than failing. Gains that push a creep past capacity shed
//! onto the ground at its tile.

use crate::core::types::ObjectId;
use crate::intents::record::Intent;
use crate::mutation::ledger::Ledger;
use crate::simulation::{drop_resource, StepCtx};
use crate::state::events::TickEvent;
use crate::state::object::{EffectKind, ObjectKind, ResourceType};

pub fn run(ctx: &mut StepCtx) {
    let mut ledger = Ledger::new(ctx.snapshot);

    let actions: Vec<(ObjectId, Intent)> = ctx
        .batch
        .select(|i| {
            matches!(
                i,
                Intent::Transfer { .. }
                    | Intent::Withdraw { .. }
                    | Intent::Pickup { .. }
                    | Intent::Drop { .. }
            )
        })
        .map(|v| (v.actor, v.intent.clone()))
        .collect();

    for (actor_id, intent) in actions {
        if ctx.writer.is_removed(actor_id) {
            continue;
        }
        match intent {
            Intent::Transfer { target, resource, amount } => {
                transfer(ctx, &mut ledger, actor_id, target, resource, amount);
            }
            Intent::Withdraw { target, resource, amount } => {
                if withdraw_gated(ctx, &mut ledger, target) {
                    continue;
                }
                transfer(ctx, &mut ledger, target, actor_id, resource, amount);
            }
            Intent::Pickup { target } => pickup(ctx, &mut ledger, actor_id, target),
            Intent::Drop { resource, amount } => {
                let (pos, dropped) = match ledger.get_mut(actor_id, &ctx.writer) {
                    Some(creep) => (creep.pos, creep.store.remove(resource, amount)),
                    None => continue,
                };
                drop_resource(ctx, &mut ledger, pos, resource, dropped);
            }
            _ => unreachable!("transfer step selected a non-transfer intent"),
        }
    }

    ledger.flush(&mut ctx.writer);
}

/// Move up to `amount` of `resource` from one store to another, capped by
/// availability and the recipient's free capacity.
fn transfer(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    from_id: ObjectId,
    to_id: ObjectId,
    resource: ResourceType,
    amount: u32,
) {
    if from_id == to_id {
        return;
    }
    let available = match ledger.get(from_id) {
        Some(from) => from.store.get(resource),
        None => return,
    };
    let free = match ledger.get(to_id) {
        Some(to) => to.free_capacity(resource),
        None => return,
    };
    let moved = amount.min(available).min(free);
    if moved == 0 {
        return;
    }
    if let Some(from) = ledger.get_mut(from_id, &ctx.writer) {
        from.store.remove(resource, moved);
    } else {
        return;
    }
    if let Some(to) = ledger.get_mut(to_id, &ctx.writer) {
        to.store.add(resource, moved);
    }
    ctx.emit(TickEvent::Transfer { from: from_id, to: to_id, resource, amount: moved });
}

/// Withdraw gating beyond the validation pipeline: a hostile rampart over
/// the target blocks it, and a disrupted terminal gives out nothing.
fn withdraw_gated(ctx: &StepCtx, ledger: &mut Ledger, target_id: ObjectId) -> bool {
    let Some(target) = ledger.get(target_id) else { return true };
    if target.kind == ObjectKind::Terminal {
        let disrupted = target
            .effects
            .iter()
            .any(|e| e.kind == EffectKind::DisruptTerminal && e.until > ctx.snapshot.game_time);
        if disrupted {
            return true;
        }
    }
    let target_owner = target.owner.clone();
    ctx.snapshot.at(target.pos).any(|o| {
        o.kind == ObjectKind::Rampart
            && !o.is_public
            && o.owner.is_some()
            && o.owner != target_owner
    })
}

/// Pick a pile up into the creep's free capacity; the leftover stays on
/// the ground. An emptied pile is removed so the decay step skips it.
fn pickup(ctx: &mut StepCtx, ledger: &mut Ledger, actor_id: ObjectId, target_id: ObjectId) {
    let (resource, pile_amount) = match ledger.get(target_id) {
        Some(pile) if pile.kind == ObjectKind::Resource => {
            match (pile.resource_type, pile.amount) {
                (Some(r), Some(a)) => (r, a),
                _ => return,
            }
        }
        _ => return,
    };
    let free = match ledger.get(actor_id) {
        Some(creep) => creep.free_capacity(resource),
        None => return,
    };
    let taken = pile_amount.min(free);
    if taken == 0 {
        return;
    }
    if let Some(creep) = ledger.get_mut(actor_id, &ctx.writer) {
        creep.store.add(resource, taken);
    } else {
        return;
    }
    if taken == pile_amount {
        ledger.discard(target_id);
        ctx.writer.remove(target_id);
    } else if let Some(pile) = ledger.get_mut(target_id, &ctx.writer) {
        pile.amount = Some(pile_amount - taken);
    }
    ctx.emit(TickEvent::Transfer {
        from: target_id,
        to: actor_id,
        resource,
        amount: taken,
    });
}
