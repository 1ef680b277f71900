//! Controller mechanics: upgrade, reserve, claim, attack, safe mode
//!
//! Upgrading converts creep energy 1:1 into controller progress, capped at
//! 15 per creep per tick, and nudges the downgrade clock forward. Level-up
//! carries surplus progress over. The passive downgrade check runs here as
//! well so an untouched controller still loses levels on schedule.

use crate::constants::{
    self, BoostAction, ATTACK_CONTROLLER_RESERVE, ATTACK_CONTROLLER_UPGRADE_BLOCK,
    DOWNGRADE_RESTORE, MAX_UPGRADE_PER_TICK, RESERVE_MAX, RESERVE_POWER, SAFE_MODE_COOLDOWN,
    SAFE_MODE_COST, SAFE_MODE_DURATION, UPGRADE_POWER,
};
use crate::core::types::ObjectId;
use crate::intents::record::Intent;
use crate::mutation::ledger::Ledger;
use crate::simulation::StepCtx;
use crate::state::events::TickEvent;
use crate::state::object::{ObjectKind, PartType, Reservation, ResourceType};

pub fn run(ctx: &mut StepCtx) {
    let mut ledger = Ledger::new(ctx.snapshot);

    let actions: Vec<(ObjectId, crate::core::types::UserId, Intent)> = ctx
        .batch
        .select(|i| {
            matches!(
                i,
                Intent::UpgradeController { .. }
                    | Intent::ReserveController { .. }
                    | Intent::ClaimController { .. }
                    | Intent::AttackController { .. }
                    | Intent::ActivateSafeMode
                    | Intent::GenerateSafeMode { .. }
            )
        })
        .map(|v| (v.actor, v.user.clone(), v.intent.clone()))
        .collect();

    for (actor_id, user, intent) in actions {
        if ctx.writer.is_removed(actor_id) {
            continue;
        }
        match intent {
            Intent::UpgradeController { target } => {
                upgrade(ctx, &mut ledger, actor_id, &user, target);
            }
            Intent::ReserveController { target } => {
                reserve(ctx, &mut ledger, actor_id, &user, target);
            }
            Intent::ClaimController { target } => claim(ctx, &mut ledger, &user, target),
            Intent::AttackController { target } => {
                attack_controller(ctx, &mut ledger, actor_id, target);
            }
            Intent::ActivateSafeMode => activate_safe_mode(ctx, &mut ledger),
            Intent::GenerateSafeMode { target } => {
                generate_safe_mode(ctx, &mut ledger, actor_id, target);
            }
            _ => unreachable!("controller step selected a foreign intent"),
        }
    }

    passive_downgrade(ctx, &mut ledger);

    ledger.flush(&mut ctx.writer);
}

fn upgrade(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    actor_id: ObjectId,
    user: &crate::core::types::UserId,
    controller_id: ObjectId,
) {
    let (power, energy) = match ledger.get(actor_id) {
        Some(creep) => (
            creep.body_power(PartType::Work, BoostAction::UpgradeController, UPGRADE_POWER),
            creep.store.get(ResourceType::Energy),
        ),
        None => return,
    };
    let spent = power.min(energy).min(MAX_UPGRADE_PER_TICK);
    if spent == 0 {
        return;
    }
    let game_time = ctx.snapshot.game_time;
    {
        let Some(controller) = ledger.get_mut(controller_id, &ctx.writer) else { return };
        if controller.kind != ObjectKind::Controller {
            return;
        }
        let mut level = controller.level.unwrap_or(0);
        let mut progress = controller.progress.unwrap_or(0) + spent;
        // Carry surplus progress into the next level
        while let Some(threshold) = constants::controller_level_progress(level) {
            if progress < threshold {
                break;
            }
            progress -= threshold;
            level += 1;
        }
        controller.level = Some(level);
        controller.progress = Some(progress);
        // Each upgrade buys back downgrade time, never past the level cap
        let cap = game_time + constants::controller_downgrade_time(level);
        let pushed = controller
            .downgrade_time
            .map(|t| (t + DOWNGRADE_RESTORE).min(cap))
            .unwrap_or(cap);
        controller.downgrade_time = Some(pushed);
    }
    if let Some(creep) = ledger.get_mut(actor_id, &ctx.writer) {
        creep.store.remove(ResourceType::Energy, spent);
    }
    ctx.stats.energy_upgrade(user, spent as u64);
    ctx.global.add_gcl(user, spent as u64);
    ctx.emit(TickEvent::UpgradeController { creep: actor_id, amount: spent });
}

fn reserve(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    actor_id: ObjectId,
    user: &crate::core::types::UserId,
    controller_id: ObjectId,
) {
    let claim_parts = match ledger.get(actor_id) {
        Some(creep) => creep.active_parts(PartType::Claim) as u64,
        None => return,
    };
    if claim_parts == 0 {
        return;
    }
    let game_time = ctx.snapshot.game_time;
    let Some(controller) = ledger.get_mut(controller_id, &ctx.writer) else { return };
    if controller.owner.is_some() {
        return;
    }
    let base = match &controller.reservation {
        Some(r) if r.user == *user => r.end_time.max(game_time),
        Some(_) => return,
        None => game_time,
    };
    let end_time = (base + claim_parts * RESERVE_POWER).min(game_time + RESERVE_MAX);
    controller.reservation = Some(Reservation { user: user.clone(), end_time });
}

fn claim(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    user: &crate::core::types::UserId,
    controller_id: ObjectId,
) {
    let game_time = ctx.snapshot.game_time;
    let Some(controller) = ledger.get_mut(controller_id, &ctx.writer) else { return };
    if controller.kind != ObjectKind::Controller || controller.owner.is_some() {
        return;
    }
    controller.owner = Some(user.clone());
    controller.level = Some(1);
    controller.progress = Some(0);
    controller.reservation = None;
    controller.downgrade_time = Some(game_time + constants::controller_downgrade_time(1));
}

fn attack_controller(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    actor_id: ObjectId,
    controller_id: ObjectId,
) {
    let claim_parts = match ledger.get(actor_id) {
        Some(creep) => creep.active_parts(PartType::Claim) as u64,
        None => return,
    };
    if claim_parts == 0 {
        return;
    }
    let game_time = ctx.snapshot.game_time;
    let Some(controller) = ledger.get_mut(controller_id, &ctx.writer) else { return };
    let bite = claim_parts * ATTACK_CONTROLLER_RESERVE;
    if let Some(reservation) = &controller.reservation {
        let remaining = reservation.end_time.saturating_sub(game_time);
        if remaining <= bite {
            controller.reservation = None;
        } else {
            let user = reservation.user.clone();
            controller.reservation = Some(Reservation { user, end_time: reservation.end_time - bite });
        }
    } else if controller.owner.is_some() {
        if let Some(t) = controller.downgrade_time {
            controller.downgrade_time = Some(t.saturating_sub(bite).max(game_time));
        }
    }
    controller.upgrade_blocked = Some(game_time + ATTACK_CONTROLLER_UPGRADE_BLOCK);
}

fn activate_safe_mode(ctx: &mut StepCtx, ledger: &mut Ledger) {
    let controller_id = match ctx.snapshot.controller() {
        Some(c) => c.id,
        None => return,
    };
    let game_time = ctx.snapshot.game_time;
    let Some(controller) = ledger.get_mut(controller_id, &ctx.writer) else { return };
    if controller.safe_mode_available == 0 {
        return;
    }
    if controller.safe_mode_cooldown.map(|t| t > game_time).unwrap_or(false) {
        return;
    }
    controller.safe_mode_available -= 1;
    controller.safe_mode = Some(game_time + SAFE_MODE_DURATION);
    controller.safe_mode_cooldown = Some(game_time + SAFE_MODE_COOLDOWN);
}

/// Burn 1000 ghodium out of the creep for one stored safe-mode activation
fn generate_safe_mode(
    ctx: &mut StepCtx,
    ledger: &mut Ledger,
    actor_id: ObjectId,
    controller_id: ObjectId,
) {
    let held = match ledger.get(actor_id) {
        Some(creep) => creep.store.get(ResourceType::Ghodium),
        None => return,
    };
    if held < SAFE_MODE_COST {
        return;
    }
    {
        let Some(controller) = ledger.get_mut(controller_id, &ctx.writer) else { return };
        if controller.kind != ObjectKind::Controller {
            return;
        }
        controller.safe_mode_available += 1;
    }
    if let Some(creep) = ledger.get_mut(actor_id, &ctx.writer) {
        creep.store.remove(ResourceType::Ghodium, SAFE_MODE_COST);
    }
}

/// An owned controller whose downgrade clock ran out loses a level; a level
/// 1 controller reverts to unowned. Progress resets on the way down.
fn passive_downgrade(ctx: &mut StepCtx, ledger: &mut Ledger) {
    let game_time = ctx.snapshot.game_time;
    let controller_id = match ctx.snapshot.controller() {
        Some(c) if c.owner.is_some() => c.id,
        _ => return,
    };
    let Some(controller) = ledger.get_mut(controller_id, &ctx.writer) else { return };
    let Some(downgrade_time) = controller.downgrade_time else { return };
    if downgrade_time > game_time {
        return;
    }
    let level = controller.level.unwrap_or(0);
    if level <= 1 {
        controller.owner = None;
        controller.level = Some(0);
        controller.progress = Some(0);
        controller.downgrade_time = None;
        controller.safe_mode = None;
        controller.safe_mode_available = 0;
    } else {
        let new_level = level - 1;
        controller.level = Some(new_level);
        controller.progress = Some(0);
        controller.downgrade_time =
            Some(game_time + constants::controller_downgrade_time(new_level) / 2);
    }
}
