//! Game balance constants - all tunable values in one place
//!
//! These values must match the reference simulation field-by-field; rounding
//! and capacity arithmetic downstream depend on them being exact.

use crate::state::object::{ObjectKind, PartType, ResourceType};

// Creep mechanics
pub const HARVEST_POWER: u32 = 2;
pub const HARVEST_MINERAL_POWER: u32 = 1;
pub const BUILD_POWER: u32 = 5;
pub const REPAIR_POWER: u32 = 100;
pub const REPAIR_COST: f64 = 0.01;
pub const DISMANTLE_POWER: u32 = 50;
pub const DISMANTLE_COST: f64 = 0.005;
pub const ATTACK_POWER: u32 = 30;
pub const RANGED_ATTACK_POWER: u32 = 10;
/// Ranged damage by Chebyshev range 0..3
pub const RANGED_ATTACK_FALLOFF: [u32; 4] = [10, 10, 4, 1];
pub const HEAL_POWER: u32 = 12;
pub const RANGED_HEAL_POWER: u32 = 4;
pub const UPGRADE_POWER: u32 = 1;
pub const MAX_UPGRADE_PER_TICK: u32 = 15;
pub const CARRY_CAPACITY: u32 = 50;
pub const MAX_CREEP_SIZE: usize = 50;
pub const CREEP_LIFE_TIME: u64 = 1500;
pub const CLAIM_LIFE_TIME: u64 = 600;
pub const CREEP_SPAWN_TIME: u64 = 3;
pub const SPAWN_RENEW_RATIO: f64 = 1.2;
/// Fraction of body cost a player creep drops on death
pub const CREEP_CORPSE_RATE: f64 = 0.2;
pub const TOMBSTONE_DECAY_PER_PART: u64 = 5;
pub const RUIN_DECAY: u64 = 500;
pub const MOVE_FATIGUE_POWER: u32 = 2;

pub fn body_part_cost(part: PartType) -> u32 {
    match part {
        PartType::Move => 50,
        PartType::Work => 100,
        PartType::Carry => 50,
        PartType::Attack => 80,
        PartType::RangedAttack => 150,
        PartType::Tough => 10,
        PartType::Heal => 250,
        PartType::Claim => 600,
    }
}

// Sources and minerals
pub const SOURCE_ENERGY_CAPACITY: u32 = 3000;
pub const SOURCE_ENERGY_NEUTRAL_CAPACITY: u32 = 1500;
pub const SOURCE_ENERGY_KEEPER_CAPACITY: u32 = 4000;
pub const ENERGY_REGEN_TIME: u64 = 300;
pub const MINERAL_REGEN_TIME: u64 = 50_000;
pub const MINERAL_DENSITY_CHANGE: f64 = 0.05;
pub const EXTRACTOR_COOLDOWN: u64 = 5;

/// Mineral amount by density class 1..4
pub fn mineral_density_amount(density: u8) -> u32 {
    match density {
        1 => 15_000,
        2 => 35_000,
        3 => 70_000,
        _ => 100_000,
    }
}

/// Cumulative density probabilities for rerolls: low 10%, moderate 40%,
/// high 40%, ultra 10%.
pub fn mineral_density_roll(roll: f64) -> u8 {
    if roll < 0.1 {
        1
    } else if roll < 0.5 {
        2
    } else if roll < 0.9 {
        3
    } else {
        4
    }
}

// Links
pub const LINK_CAPACITY: u32 = 800;
pub const LINK_COOLDOWN: u64 = 1;
pub const LINK_LOSS_RATIO: f64 = 0.03;

// Labs
pub const LAB_REACT_AMOUNT: u32 = 5;
pub const LAB_BOOST_ENERGY: u32 = 20;
pub const LAB_BOOST_MINERAL: u32 = 30;
pub const LAB_ENERGY_CAPACITY: u32 = 2000;
pub const LAB_MINERAL_CAPACITY: u32 = 3000;

// Towers
pub const TOWER_POWER_ATTACK: u32 = 600;
pub const TOWER_POWER_HEAL: u32 = 400;
pub const TOWER_POWER_REPAIR: u32 = 800;
pub const TOWER_ENERGY_COST: u32 = 10;
pub const TOWER_OPTIMAL_RANGE: u32 = 5;
pub const TOWER_FALLOFF_RANGE: u32 = 20;
pub const TOWER_FALLOFF: f64 = 0.75;

// Structure decay, amounts per period
pub const RAMPART_DECAY_AMOUNT: u32 = 300;
pub const RAMPART_DECAY_TIME: u64 = 100;
pub const ROAD_DECAY_AMOUNT: u32 = 100;
pub const ROAD_DECAY_TIME: u64 = 1000;
pub const CONTAINER_DECAY_AMOUNT: u32 = 5000;
pub const CONTAINER_DECAY_TIME_OWNED: u64 = 500;
pub const CONTAINER_DECAY_TIME: u64 = 100;
/// Dropped energy loses ceil(amount / 1000) per tick
pub const ENERGY_DECAY_DIVISOR: u32 = 1000;

// Controller
pub const DOWNGRADE_RESTORE: u64 = 100;
pub const RESERVE_POWER: u64 = 1;
pub const RESERVE_MAX: u64 = 5000;
pub const ATTACK_CONTROLLER_RESERVE: u64 = 300;
pub const ATTACK_CONTROLLER_UPGRADE_BLOCK: u64 = 1000;
pub const SAFE_MODE_DURATION: u64 = 20_000;
pub const SAFE_MODE_COOLDOWN: u64 = 50_000;
pub const SAFE_MODE_COST: u32 = 1000;
pub const GCL_POW: f64 = 2.4;
pub const GCL_MULTIPLY: f64 = 1_000_000.0;

/// Upgrade progress required to finish each controller level 1..7.
/// Level 8 is terminal.
pub fn controller_level_progress(level: u8) -> Option<u32> {
    match level {
        1 => Some(200),
        2 => Some(45_000),
        3 => Some(135_000),
        4 => Some(405_000),
        5 => Some(1_215_000),
        6 => Some(3_645_000),
        7 => Some(10_935_000),
        _ => None,
    }
}

/// Full downgrade timer for a controller level
pub fn controller_downgrade_time(level: u8) -> u64 {
    match level {
        1 => 20_000,
        2 => 10_000,
        3 => 20_000,
        4 => 40_000,
        5 => 80_000,
        6 => 120_000,
        7 => 150_000,
        _ => 200_000,
    }
}

// Nukes and observers
pub const NUKE_RANGE: u32 = 10;
pub const NUKE_LAND_TIME: u64 = 50_000;
pub const NUKER_COOLDOWN: u64 = 100_000;
pub const NUKER_ENERGY_CAPACITY: u32 = 300_000;
pub const NUKER_GHODIUM_CAPACITY: u32 = 5000;
pub const NUKE_DAMAGE_CENTER: u32 = 10_000_000;
pub const NUKE_DAMAGE_RING: u32 = 5_000_000;
pub const NUKE_UPGRADE_BLOCK: u64 = 200;
pub const OBSERVER_RANGE: u32 = 10;

// Power
pub const POWER_SPAWN_ENERGY_RATIO: u32 = 50;

// Terrain fatigue cost per loaded body part
pub const FATIGUE_COST_ROAD: u32 = 1;
pub const FATIGUE_COST_PLAIN: u32 = 2;
pub const FATIGUE_COST_SWAMP: u32 = 10;

// Spawn and extension energy
pub const SPAWN_ENERGY_CAPACITY: u32 = 300;

/// Extension capacity grows with controller level
pub fn extension_energy_capacity(controller_level: u8) -> u32 {
    match controller_level {
        0..=6 => 50,
        7 => 100,
        _ => 200,
    }
}

/// Initial/maximum hits for completed structures. Road and rampart values
/// are the base; roads scale by terrain and ramparts by controller level
/// at the call site.
pub fn structure_hits(kind: ObjectKind) -> u32 {
    match kind {
        ObjectKind::Spawn => 5000,
        ObjectKind::Extension => 1000,
        ObjectKind::Road => 5000,
        ObjectKind::ConstructedWall => 1,
        ObjectKind::Rampart => 1,
        ObjectKind::Link => 1000,
        ObjectKind::Storage => 10_000,
        ObjectKind::Tower => 3000,
        ObjectKind::Observer => 500,
        ObjectKind::PowerSpawn => 5000,
        ObjectKind::Extractor => 500,
        ObjectKind::Lab => 500,
        ObjectKind::Terminal => 3000,
        ObjectKind::Container => 250_000,
        ObjectKind::Nuker => 1000,
        ObjectKind::Factory => 1000,
        _ => 1,
    }
}

pub const ROAD_HITS_SWAMP_RATIO: u32 = 5;
pub const ROAD_HITS_WALL_RATIO: u32 = 150;
pub const CONTAINER_HITS: u32 = 250_000;

/// General store capacities for completed structures
pub fn structure_capacity(kind: ObjectKind) -> Option<u32> {
    match kind {
        ObjectKind::Spawn => Some(SPAWN_ENERGY_CAPACITY),
        ObjectKind::Link => Some(LINK_CAPACITY),
        ObjectKind::Storage => Some(1_000_000),
        ObjectKind::Tower => Some(1000),
        ObjectKind::PowerSpawn => Some(5000),
        ObjectKind::Lab => Some(LAB_MINERAL_CAPACITY),
        ObjectKind::Terminal => Some(300_000),
        ObjectKind::Container => Some(2000),
        ObjectKind::Nuker => Some(NUKER_ENERGY_CAPACITY + NUKER_GHODIUM_CAPACITY),
        ObjectKind::Factory => Some(50_000),
        _ => None,
    }
}

// Lab reactions

/// Product of reacting two reagents, order-insensitive
pub fn reaction_product(a: ResourceType, b: ResourceType) -> Option<ResourceType> {
    use ResourceType::*;
    let pair = if a <= b { (a, b) } else { (b, a) };
    let table: &[((ResourceType, ResourceType), ResourceType)] = &[
        ((Hydrogen, Oxygen), Hydroxide),
        ((Keanium, Zynthium), ZynthiumKeanite),
        ((Utrium, Lemergium), UtriumLemergite),
        ((ZynthiumKeanite, UtriumLemergite), Ghodium),
        ((Hydrogen, Utrium), UtriumHydride),
        ((Oxygen, Utrium), UtriumOxide),
        ((Hydrogen, Keanium), KeaniumHydride),
        ((Oxygen, Keanium), KeaniumOxide),
        ((Hydrogen, Lemergium), LemergiumHydride),
        ((Oxygen, Lemergium), LemergiumOxide),
        ((Hydrogen, Zynthium), ZynthiumHydride),
        ((Oxygen, Zynthium), ZynthiumOxide),
        ((Hydrogen, Ghodium), GhodiumHydride),
        ((Oxygen, Ghodium), GhodiumOxide),
        ((Hydroxide, UtriumHydride), UtriumAcid),
        ((Hydroxide, UtriumOxide), UtriumAlkalide),
        ((Hydroxide, KeaniumHydride), KeaniumAcid),
        ((Hydroxide, KeaniumOxide), KeaniumAlkalide),
        ((Hydroxide, LemergiumHydride), LemergiumAcid),
        ((Hydroxide, LemergiumOxide), LemergiumAlkalide),
        ((Hydroxide, ZynthiumHydride), ZynthiumAcid),
        ((Hydroxide, ZynthiumOxide), ZynthiumAlkalide),
        ((Hydroxide, GhodiumHydride), GhodiumAcid),
        ((Hydroxide, GhodiumOxide), GhodiumAlkalide),
        ((Catalyst, UtriumAcid), CatalyzedUtriumAcid),
        ((Catalyst, UtriumAlkalide), CatalyzedUtriumAlkalide),
        ((Catalyst, KeaniumAcid), CatalyzedKeaniumAcid),
        ((Catalyst, KeaniumAlkalide), CatalyzedKeaniumAlkalide),
        ((Catalyst, LemergiumAcid), CatalyzedLemergiumAcid),
        ((Catalyst, LemergiumAlkalide), CatalyzedLemergiumAlkalide),
        ((Catalyst, ZynthiumAcid), CatalyzedZynthiumAcid),
        ((Catalyst, ZynthiumAlkalide), CatalyzedZynthiumAlkalide),
        ((Catalyst, GhodiumAcid), CatalyzedGhodiumAcid),
        ((Catalyst, GhodiumAlkalide), CatalyzedGhodiumAlkalide),
    ];
    table.iter().find_map(|((x, y), product)| {
        let key = if x <= y { (*x, *y) } else { (*y, *x) };
        if key == pair {
            Some(*product)
        } else {
            None
        }
    })
}

/// Lab cooldown after producing the given compound
pub fn reaction_time(product: ResourceType) -> u64 {
    use ResourceType::*;
    match product {
        Hydroxide => 20,
        ZynthiumKeanite | UtriumLemergite | Ghodium => 5,
        UtriumHydride | UtriumOxide | KeaniumHydride | KeaniumOxide => 10,
        LemergiumHydride => 15,
        LemergiumOxide | ZynthiumOxide | GhodiumHydride | GhodiumOxide => 10,
        ZynthiumHydride => 20,
        UtriumAcid | UtriumAlkalide | KeaniumAcid => 5,
        KeaniumAlkalide | LemergiumAcid => 10,
        LemergiumAlkalide | GhodiumAcid => 15,
        ZynthiumAcid => 40,
        ZynthiumAlkalide => 5,
        GhodiumAlkalide => 30,
        CatalyzedUtriumAcid | CatalyzedUtriumAlkalide => 60,
        CatalyzedKeaniumAcid => 35,
        CatalyzedKeaniumAlkalide => 160,
        CatalyzedLemergiumAcid => 65,
        CatalyzedLemergiumAlkalide | CatalyzedZynthiumAlkalide => 10,
        CatalyzedZynthiumAcid => 160,
        CatalyzedGhodiumAcid => 80,
        CatalyzedGhodiumAlkalide => 150,
        _ => 0,
    }
}

// Boosts

/// Action families a boost can multiply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostAction {
    Harvest,
    Build,
    Repair,
    Dismantle,
    UpgradeController,
    Attack,
    RangedAttack,
    Heal,
    Capacity,
    Fatigue,
    /// Incoming-damage multiplier on boosted TOUGH parts (< 1.0)
    Damage,
}

/// Multiplier a compound applies to one part's action, None when the
/// compound does not boost that part/action pair.
pub fn boost_multiplier(part: PartType, action: BoostAction, compound: ResourceType) -> Option<f64> {
    use BoostAction::*;
    use ResourceType::*;
    let m = match (part, compound) {
        (PartType::Attack, UtriumHydride) => (Attack, 2.0),
        (PartType::Attack, UtriumAcid) => (Attack, 3.0),
        (PartType::Attack, CatalyzedUtriumAcid) => (Attack, 4.0),
        (PartType::Work, UtriumOxide) => (Harvest, 3.0),
        (PartType::Work, UtriumAlkalide) => (Harvest, 5.0),
        (PartType::Work, CatalyzedUtriumAlkalide) => (Harvest, 7.0),
        (PartType::Carry, KeaniumHydride) => (Capacity, 2.0),
        (PartType::Carry, KeaniumAcid) => (Capacity, 3.0),
        (PartType::Carry, CatalyzedKeaniumAcid) => (Capacity, 4.0),
        (PartType::RangedAttack, KeaniumOxide) => (RangedAttack, 2.0),
        (PartType::RangedAttack, KeaniumAlkalide) => (RangedAttack, 3.0),
        (PartType::RangedAttack, CatalyzedKeaniumAlkalide) => (RangedAttack, 4.0),
        (PartType::Work, LemergiumHydride) => (Build, 1.5),
        (PartType::Work, LemergiumAcid) => (Build, 1.8),
        (PartType::Work, CatalyzedLemergiumAcid) => (Build, 2.0),
        (PartType::Heal, LemergiumOxide) => (Heal, 2.0),
        (PartType::Heal, LemergiumAlkalide) => (Heal, 3.0),
        (PartType::Heal, CatalyzedLemergiumAlkalide) => (Heal, 4.0),
        (PartType::Work, ZynthiumHydride) => (Dismantle, 2.0),
        (PartType::Work, ZynthiumAcid) => (Dismantle, 3.0),
        (PartType::Work, CatalyzedZynthiumAcid) => (Dismantle, 4.0),
        (PartType::Move, ZynthiumOxide) => (Fatigue, 2.0),
        (PartType::Move, ZynthiumAlkalide) => (Fatigue, 3.0),
        (PartType::Move, CatalyzedZynthiumAlkalide) => (Fatigue, 4.0),
        (PartType::Work, GhodiumHydride) => (UpgradeController, 1.5),
        (PartType::Work, GhodiumAcid) => (UpgradeController, 1.8),
        (PartType::Work, CatalyzedGhodiumAcid) => (UpgradeController, 2.0),
        (PartType::Tough, GhodiumOxide) => (Damage, 0.7),
        (PartType::Tough, GhodiumAlkalide) => (Damage, 0.5),
        (PartType::Tough, CatalyzedGhodiumAlkalide) => (Damage, 0.3),
        _ => return None,
    };
    let (boosted_action, mult) = m;
    // Build boosts cover repair too
    let matches = boosted_action == action
        || (boosted_action == Build && action == Repair);
    if matches {
        Some(mult)
    } else {
        None
    }
}

/// Which part type a boost compound applies to
pub fn boost_part(compound: ResourceType) -> Option<PartType> {
    use ResourceType::*;
    match compound {
        UtriumHydride | UtriumAcid | CatalyzedUtriumAcid => Some(PartType::Attack),
        UtriumOxide | UtriumAlkalide | CatalyzedUtriumAlkalide | LemergiumHydride
        | LemergiumAcid | CatalyzedLemergiumAcid | ZynthiumHydride | ZynthiumAcid
        | CatalyzedZynthiumAcid | GhodiumHydride | GhodiumAcid | CatalyzedGhodiumAcid => {
            Some(PartType::Work)
        }
        KeaniumHydride | KeaniumAcid | CatalyzedKeaniumAcid => Some(PartType::Carry),
        KeaniumOxide | KeaniumAlkalide | CatalyzedKeaniumAlkalide => Some(PartType::RangedAttack),
        LemergiumOxide | LemergiumAlkalide | CatalyzedLemergiumAlkalide => Some(PartType::Heal),
        ZynthiumOxide | ZynthiumAlkalide | CatalyzedZynthiumAlkalide => Some(PartType::Move),
        GhodiumOxide | GhodiumAlkalide | CatalyzedGhodiumAlkalide => Some(PartType::Tough),
        _ => None,
    }
}

// Factory

/// One factory recipe: components consumed atomically, output produced,
/// cooldown accumulated per production.
#[derive(Debug, Clone)]
pub struct FactoryRecipe {
    pub output: ResourceType,
    pub output_amount: u32,
    pub components: &'static [(ResourceType, u32)],
    pub cooldown: u64,
    /// Minimum factory level; 0 means any factory
    pub level: u8,
}

pub fn factory_recipe(output: ResourceType) -> Option<FactoryRecipe> {
    use ResourceType::*;
    let (output_amount, components, cooldown, level): (u32, &'static [(ResourceType, u32)], u64, u8) =
        match output {
            Battery => (50, &[(Energy, 600)], 10, 0),
            Energy => (500, &[(Battery, 50)], 10, 0),
            UtriumBar => (100, &[(Utrium, 500), (Energy, 200)], 20, 0),
            LemergiumBar => (100, &[(Lemergium, 500), (Energy, 200)], 20, 0),
            ZynthiumBar => (100, &[(Zynthium, 500), (Energy, 200)], 20, 0),
            KeaniumBar => (100, &[(Keanium, 500), (Energy, 200)], 20, 0),
            GhodiumMelt => (100, &[(Ghodium, 500), (Energy, 200)], 20, 0),
            Oxidant => (100, &[(Oxygen, 500), (Energy, 200)], 20, 0),
            Reductant => (100, &[(Hydrogen, 500), (Energy, 200)], 20, 0),
            Purifier => (100, &[(Catalyst, 500), (Energy, 200)], 20, 0),
            Composite => (20, &[(UtriumBar, 20), (ZynthiumBar, 20), (Energy, 600)], 50, 1),
            Crystal => (6, &[(LemergiumBar, 6), (KeaniumBar, 6), (Purifier, 6), (Energy, 600)], 21, 2),
            Liquid => (12, &[(Oxidant, 12), (Reductant, 12), (GhodiumMelt, 12), (Energy, 1200)], 8, 3),
            _ => return None,
        };
    Some(FactoryRecipe { output, output_amount, components, cooldown, level })
}

// NPC tuning
pub const NPC_MASS_ATTACK_THRESHOLD: u32 = 13;
pub const KEEPER_SPAWN_TIME: u64 = 300;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_table_order_insensitive() {
        use ResourceType::*;
        assert_eq!(reaction_product(Hydrogen, Oxygen), Some(Hydroxide));
        assert_eq!(reaction_product(Oxygen, Hydrogen), Some(Hydroxide));
        assert_eq!(reaction_product(Hydroxide, UtriumHydride), Some(UtriumAcid));
        assert_eq!(reaction_product(Energy, Hydrogen), None);
    }

    #[test]
    fn test_catalyzed_chain_reaches_tier3() {
        use ResourceType::*;
        let acid = reaction_product(Hydroxide, GhodiumHydride).unwrap();
        assert_eq!(acid, GhodiumAcid);
        assert_eq!(reaction_product(Catalyst, acid), Some(CatalyzedGhodiumAcid));
    }

    #[test]
    fn test_boost_multiplier_lookup() {
        use ResourceType::*;
        assert_eq!(
            boost_multiplier(PartType::Work, BoostAction::Harvest, UtriumOxide),
            Some(3.0)
        );
        // Build boosts also apply to repair
        assert_eq!(
            boost_multiplier(PartType::Work, BoostAction::Repair, LemergiumHydride),
            Some(1.5)
        );
        assert_eq!(
            boost_multiplier(PartType::Work, BoostAction::Attack, UtriumOxide),
            None
        );
    }

    #[test]
    fn test_density_roll_bands() {
        assert_eq!(mineral_density_roll(0.05), 1);
        assert_eq!(mineral_density_roll(0.3), 2);
        assert_eq!(mineral_density_roll(0.7), 3);
        assert_eq!(mineral_density_roll(0.95), 4);
    }

    #[test]
    fn test_controller_progress_monotonic() {
        let mut last = 0;
        for level in 1..=7 {
            let p = controller_level_progress(level).unwrap();
            assert!(p > last);
            last = p;
        }
        assert!(controller_level_progress(8).is_none());
    }

    #[test]
    fn test_factory_recipe_levels() {
        use ResourceType::*;
        assert_eq!(factory_recipe(Battery).unwrap().level, 0);
        assert_eq!(factory_recipe(Crystal).unwrap().level, 2);
        assert!(factory_recipe(Hydrogen).is_none());
    }
}
