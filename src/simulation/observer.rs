//! Observer vision requests
//!
//! Observing is pure bookkeeping: the request is forwarded through the
//! global writer for the multi-room driver to honor next tick. Range was
//! already checked by the validation pipeline.

use crate::intents::record::Intent;
use crate::simulation::StepCtx;
use crate::state::events::TickEvent;

pub fn run(ctx: &mut StepCtx) {
    let requests: Vec<(crate::core::types::UserId, crate::core::types::RoomName)> = ctx
        .batch
        .select(|i| matches!(i, Intent::ObserveRoom { .. }))
        .filter_map(|v| match v.intent {
            Intent::ObserveRoom { room } => Some((v.user.clone(), room)),
            _ => None,
        })
        .collect();

    for (user, room) in requests {
        ctx.global.request_vision(&user, room);
        ctx.emit(TickEvent::ObserveRoom { user, room });
    }
}
