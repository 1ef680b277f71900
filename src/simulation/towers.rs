//! Tower actions
//!
//! Every tower action costs 10 energy. Effect is full strength within
//! range 5 and falls off linearly to a quarter at range 20. Damage and
//! death processing reuse the combat helpers, so rampart absorption and
//! tombstones behave identically to creep combat.

use crate::constants::{
    TOWER_ENERGY_COST, TOWER_FALLOFF, TOWER_FALLOFF_RANGE, TOWER_OPTIMAL_RANGE,
    TOWER_POWER_ATTACK, TOWER_POWER_HEAL, TOWER_POWER_REPAIR,
};
use crate::core::types::ObjectId;
use crate::intents::record::Intent;
use crate::mutation::ledger::Ledger;
use crate::simulation::{combat, StepCtx};
use crate::state::events::TickEvent;
use crate::state::object::{ObjectKind, ResourceType};

pub fn run(ctx: &mut StepCtx) {
    let mut ledger = Ledger::new(ctx.snapshot);

    let actions: Vec<(ObjectId, Intent)> = ctx
        .batch
        .select(|i| {
            matches!(
                i,
                Intent::TowerAttack { .. } | Intent::TowerHeal { .. } | Intent::TowerRepair { .. }
            )
        })
        .map(|v| (v.actor, v.intent.clone()))
        .collect();

    for (tower_id, intent) in actions {
        if ctx.writer.is_removed(tower_id) {
            continue;
        }
        let target_id = match intent.target() {
            Some(t) => t,
            None => continue,
        };
        if ctx.writer.is_removed(target_id) {
            continue;
        }
        let (tower_pos, energy) = match ledger.get(tower_id) {
            Some(tower) if tower.kind == ObjectKind::Tower => {
                (tower.pos, tower.store.get(ResourceType::Energy))
            }
            _ => continue,
        };
        if energy < TOWER_ENERGY_COST {
            continue;
        }
        let range = match ledger.get(target_id) {
            Some(target) => tower_pos.range_to(&target.pos),
            None => continue,
        };
        match intent {
            Intent::TowerAttack { .. } => {
                let damage = falloff(TOWER_POWER_ATTACK, range);
                let dealt = combat::apply_damage(ctx, &mut ledger, target_id, damage);
                if dealt == 0 {
                    continue;
                }
                ctx.emit(TickEvent::Attack { attacker: tower_id, target: target_id, damage: dealt });
            }
            Intent::TowerHeal { .. } => {
                let amount = falloff(TOWER_POWER_HEAL, range);
                let healed = combat::heal_target(ctx, &mut ledger, target_id, amount);
                if healed == 0 {
                    continue;
                }
                ctx.emit(TickEvent::Heal { healer: tower_id, target: target_id, amount: healed });
            }
            Intent::TowerRepair { .. } => {
                let amount = falloff(TOWER_POWER_REPAIR, range);
                let restored = {
                    let Some(target) = ledger.get_mut(target_id, &ctx.writer) else { continue };
                    let (Some(hits), Some(max)) = (target.hits, target.hits_max) else { continue };
                    let restored = amount.min(max - hits);
                    target.hits = Some(hits + restored);
                    restored
                };
                if restored == 0 {
                    continue;
                }
                ctx.emit(TickEvent::Repair { creep: tower_id, target: target_id, amount: restored });
            }
            _ => unreachable!("towers step selected a foreign intent"),
        }
        if let Some(tower) = ledger.get_mut(tower_id, &ctx.writer) {
            tower.store.remove(ResourceType::Energy, TOWER_ENERGY_COST);
        }
    }

    ledger.flush(&mut ctx.writer);
}

/// Linear falloff from full power at range 5 to 25 % at range 20
fn falloff(power: u32, range: u32) -> u32 {
    if range <= TOWER_OPTIMAL_RANGE {
        return power;
    }
    let range = range.min(TOWER_FALLOFF_RANGE);
    let span = (TOWER_FALLOFF_RANGE - TOWER_OPTIMAL_RANGE) as f64;
    let over = (range - TOWER_OPTIMAL_RANGE) as f64;
    (power as f64 * (1.0 - TOWER_FALLOFF * over / span)).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falloff_is_flat_inside_optimal_range() {
        assert_eq!(falloff(600, 1), 600);
        assert_eq!(falloff(600, 5), 600);
    }

    #[test]
    fn test_falloff_reaches_quarter_power_at_max_range() {
        assert_eq!(falloff(600, 20), 150);
        assert_eq!(falloff(600, 25), 150);
    }

    #[test]
    fn test_falloff_is_linear_between() {
        // halfway through the falloff band
        let mid = falloff(600, 12);
        assert!(mid < 600 && mid > 150);
    }
}
