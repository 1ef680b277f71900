//! Link energy transfer
//!
//! A link sends energy to another link in the room, losing 3 % in transit
//! (rounded up against the sender). The sending link cools down for one
//! tick per tile of Chebyshev distance.

use crate::constants::{LINK_COOLDOWN, LINK_LOSS_RATIO};
use crate::core::types::ObjectId;
use crate::intents::record::Intent;
use crate::mutation::ledger::Ledger;
use crate::simulation::StepCtx;
use crate::state::events::TickEvent;
use crate::state::object::{ObjectKind, ResourceType};

pub fn run(ctx: &mut StepCtx) {
    let mut ledger = Ledger::new(ctx.snapshot);

    let actions: Vec<(ObjectId, ObjectId, u32)> = ctx
        .batch
        .select(|i| matches!(i, Intent::LinkTransferEnergy { .. }))
        .filter_map(|v| match v.intent {
            Intent::LinkTransferEnergy { target, amount } => Some((v.actor, target, amount)),
            _ => None,
        })
        .collect();

    for (from_id, to_id, amount) in actions {
        if ctx.writer.is_removed(from_id) || ctx.writer.is_removed(to_id) || from_id == to_id {
            continue;
        }
        let (available, from_pos) = match ledger.get(from_id) {
            Some(link) if link.kind == ObjectKind::Link => {
                (link.store.get(ResourceType::Energy), link.pos)
            }
            _ => continue,
        };
        let (free, to_pos) = match ledger.get(to_id) {
            Some(link) if link.kind == ObjectKind::Link => {
                (link.free_capacity(ResourceType::Energy), link.pos)
            }
            _ => continue,
        };
        let sent = amount.min(available);
        if sent == 0 {
            continue;
        }
        // The loss comes off the top; the receiver caps what remains
        let loss = (sent as f64 * LINK_LOSS_RATIO).ceil() as u32;
        let delivered = (sent - loss).min(free);
        if delivered == 0 {
            continue;
        }
        let range = from_pos.range_to(&to_pos) as u64;
        if let Some(link) = ledger.get_mut(from_id, &ctx.writer) {
            link.store.remove(ResourceType::Energy, delivered + loss);
            link.cooldown_time = Some(ctx.snapshot.game_time + range * LINK_COOLDOWN);
        }
        if let Some(link) = ledger.get_mut(to_id, &ctx.writer) {
            link.store.add(ResourceType::Energy, delivered);
        }
        ctx.emit(TickEvent::Transfer {
            from: from_id,
            to: to_id,
            resource: ResourceType::Energy,
            amount: delivered,
        });
    }

    ledger.flush(&mut ctx.writer);
}
