//! Room object model
//!
//! One immutable-per-tick value per entity in a room. A single struct with a
//! kind tag and sparse optional fields, rather than an object hierarchy:
//! patches are sparse field sets, and a flat struct keeps the diff/merge
//! machinery mechanical.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{Direction, ObjectId, Position, RoomName, Tick, UserId};

/// Every resource the engine tracks: energy/power, the eight base minerals,
/// the lab compound tree, and the factory commodities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "energy")]
    Energy,
    #[serde(rename = "power")]
    Power,
    // Base minerals
    #[serde(rename = "H")]
    Hydrogen,
    #[serde(rename = "O")]
    Oxygen,
    #[serde(rename = "U")]
    Utrium,
    #[serde(rename = "L")]
    Lemergium,
    #[serde(rename = "K")]
    Keanium,
    #[serde(rename = "Z")]
    Zynthium,
    #[serde(rename = "X")]
    Catalyst,
    #[serde(rename = "G")]
    Ghodium,
    // Tier-0 intermediates
    #[serde(rename = "OH")]
    Hydroxide,
    #[serde(rename = "ZK")]
    ZynthiumKeanite,
    #[serde(rename = "UL")]
    UtriumLemergite,
    // Tier-1 compounds
    #[serde(rename = "UH")]
    UtriumHydride,
    #[serde(rename = "UO")]
    UtriumOxide,
    #[serde(rename = "KH")]
    KeaniumHydride,
    #[serde(rename = "KO")]
    KeaniumOxide,
    #[serde(rename = "LH")]
    LemergiumHydride,
    #[serde(rename = "LO")]
    LemergiumOxide,
    #[serde(rename = "ZH")]
    ZynthiumHydride,
    #[serde(rename = "ZO")]
    ZynthiumOxide,
    #[serde(rename = "GH")]
    GhodiumHydride,
    #[serde(rename = "GO")]
    GhodiumOxide,
    // Tier-2 acids/alkalides
    #[serde(rename = "UH2O")]
    UtriumAcid,
    #[serde(rename = "UHO2")]
    UtriumAlkalide,
    #[serde(rename = "KH2O")]
    KeaniumAcid,
    #[serde(rename = "KHO2")]
    KeaniumAlkalide,
    #[serde(rename = "LH2O")]
    LemergiumAcid,
    #[serde(rename = "LHO2")]
    LemergiumAlkalide,
    #[serde(rename = "ZH2O")]
    ZynthiumAcid,
    #[serde(rename = "ZHO2")]
    ZynthiumAlkalide,
    #[serde(rename = "GH2O")]
    GhodiumAcid,
    #[serde(rename = "GHO2")]
    GhodiumAlkalide,
    // Tier-3 catalyzed compounds
    #[serde(rename = "XUH2O")]
    CatalyzedUtriumAcid,
    #[serde(rename = "XUHO2")]
    CatalyzedUtriumAlkalide,
    #[serde(rename = "XKH2O")]
    CatalyzedKeaniumAcid,
    #[serde(rename = "XKHO2")]
    CatalyzedKeaniumAlkalide,
    #[serde(rename = "XLH2O")]
    CatalyzedLemergiumAcid,
    #[serde(rename = "XLHO2")]
    CatalyzedLemergiumAlkalide,
    #[serde(rename = "XZH2O")]
    CatalyzedZynthiumAcid,
    #[serde(rename = "XZHO2")]
    CatalyzedZynthiumAlkalide,
    #[serde(rename = "XGH2O")]
    CatalyzedGhodiumAcid,
    #[serde(rename = "XGHO2")]
    CatalyzedGhodiumAlkalide,
    // Factory commodities
    #[serde(rename = "battery")]
    Battery,
    #[serde(rename = "utrium_bar")]
    UtriumBar,
    #[serde(rename = "lemergium_bar")]
    LemergiumBar,
    #[serde(rename = "zynthium_bar")]
    ZynthiumBar,
    #[serde(rename = "keanium_bar")]
    KeaniumBar,
    #[serde(rename = "ghodium_melt")]
    GhodiumMelt,
    #[serde(rename = "oxidant")]
    Oxidant,
    #[serde(rename = "reductant")]
    Reductant,
    #[serde(rename = "purifier")]
    Purifier,
    #[serde(rename = "composite")]
    Composite,
    #[serde(rename = "crystal")]
    Crystal,
    #[serde(rename = "liquid")]
    Liquid,
}

/// Type tag for room objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectKind {
    Creep,
    PowerCreep,
    Source,
    Mineral,
    Controller,
    Spawn,
    Extension,
    Road,
    ConstructedWall,
    Rampart,
    KeeperLair,
    Link,
    Storage,
    Tower,
    Observer,
    PowerSpawn,
    Extractor,
    Lab,
    Terminal,
    Container,
    Nuker,
    Factory,
    ConstructionSite,
    Resource,
    Tombstone,
    Ruin,
    Nuke,
}

impl ObjectKind {
    /// Structures that block movement and spawn placement.
    /// Roads, containers and ramparts are walkable; ramparts gate separately
    /// on ownership/public state.
    pub fn is_obstacle(&self) -> bool {
        matches!(
            self,
            ObjectKind::Creep
                | ObjectKind::PowerCreep
                | ObjectKind::Source
                | ObjectKind::Mineral
                | ObjectKind::Controller
                | ObjectKind::Spawn
                | ObjectKind::Extension
                | ObjectKind::ConstructedWall
                | ObjectKind::KeeperLair
                | ObjectKind::Link
                | ObjectKind::Storage
                | ObjectKind::Tower
                | ObjectKind::Observer
                | ObjectKind::PowerSpawn
                | ObjectKind::Extractor
                | ObjectKind::Lab
                | ObjectKind::Terminal
                | ObjectKind::Nuker
                | ObjectKind::Factory
        )
    }

    pub fn is_structure(&self) -> bool {
        !matches!(
            self,
            ObjectKind::Creep
                | ObjectKind::PowerCreep
                | ObjectKind::Source
                | ObjectKind::Mineral
                | ObjectKind::ConstructionSite
                | ObjectKind::Resource
                | ObjectKind::Tombstone
                | ObjectKind::Ruin
                | ObjectKind::Nuke
        )
    }
}

/// Creep body part types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartType {
    Move,
    Work,
    Carry,
    Attack,
    RangedAttack,
    Tough,
    Heal,
    Claim,
}

/// One body part. Index order in the body list is significant: damage eats
/// parts front-to-back and boost application scans in index order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyPart {
    #[serde(rename = "type")]
    pub part: PartType,
    pub hits: u16,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub boost: Option<ResourceType>,
}

pub const BODY_PART_HITS: u16 = 100;

impl BodyPart {
    pub fn new(part: PartType) -> Self {
        Self { part, hits: BODY_PART_HITS, boost: None }
    }
}

/// Resource store: type → non-negative amount, zero entries pruned
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Store(AHashMap<ResourceType, u32>);

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(resource: ResourceType, amount: u32) -> Self {
        let mut store = Self::default();
        store.add(resource, amount);
        store
    }

    pub fn get(&self, resource: ResourceType) -> u32 {
        self.0.get(&resource).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn add(&mut self, resource: ResourceType, amount: u32) {
        if amount > 0 {
            *self.0.entry(resource).or_insert(0) += amount;
        }
    }

    /// Remove up to `amount`, returning the amount actually removed
    pub fn remove(&mut self, resource: ResourceType, amount: u32) -> u32 {
        match self.0.get_mut(&resource) {
            Some(current) => {
                let removed = amount.min(*current);
                *current -= removed;
                if *current == 0 {
                    self.0.remove(&resource);
                }
                removed
            }
            None => 0,
        }
    }

    /// Resource types present, in sorted order for deterministic iteration
    pub fn resources(&self) -> Vec<ResourceType> {
        let mut keys: Vec<ResourceType> = self.0.keys().copied().collect();
        keys.sort();
        keys
    }
}

/// Reservation on a neutral controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub user: UserId,
    /// Absolute tick at which the reservation lapses
    pub end_time: Tick,
}

/// In-progress spawning descriptor, held by the spawn structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawningState {
    /// Id of the placeholder creep sitting on the spawn tile
    pub creep: ObjectId,
    /// Absolute tick at which the body is ready for placement
    pub need_time: Tick,
    /// Caller-specified placement scan order; None means all eight
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub directions: Option<Vec<Direction>>,
}

/// Timed effect on an object (terminal disruption, power effects)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    pub kind: EffectKind,
    /// Absolute expiry tick
    pub until: Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    DisruptTerminal,
    OperateFactory,
}

/// The single persisted memory slot an NPC creep is allowed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpcMemory {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target: Option<ObjectId>,
    /// Cached path token: remaining steps plus the tick it was computed
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub path: Vec<Direction>,
    pub path_time: Tick,
}

/// One entity in a room: creep, structure, resource pile, site, tombstone…
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub pos: Position,
    pub room: RoomName,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hits: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hits_max: Option<u32>,
    #[serde(skip_serializing_if = "Store::is_empty", default)]
    pub store: Store,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub store_capacity: Option<u32>,
    /// Per-resource capacity overrides (labs cap energy and mineral apart)
    #[serde(skip_serializing_if = "capacity_map_is_empty", default)]
    pub store_capacity_resource: AHashMap<ResourceType, u32>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub body: Vec<BodyPart>,
    #[serde(skip_serializing_if = "is_zero", default)]
    pub fatigue: u32,
    /// True while this creep is the placeholder of an active spawn
    #[serde(skip_serializing_if = "is_false", default)]
    pub is_spawning: bool,
    /// Absolute tick at which this creep dies of old age
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub age_time: Option<Tick>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub spawning: Option<SpawningState>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cooldown_time: Option<Tick>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next_regeneration_time: Option<Tick>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next_decay_time: Option<Tick>,
    /// Expiry tick for tombstones, ruins and dropped piles
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub decay_time: Option<Tick>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub land_time: Option<Tick>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resource_type: Option<ResourceType>,
    /// Pile amount or mineral remaining amount
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub amount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mineral_type: Option<ResourceType>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub density: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub progress: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub progress_total: Option<u32>,
    /// Structure a construction site will become
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub structure_type: Option<ObjectKind>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub downgrade_time: Option<Tick>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reservation: Option<Reservation>,
    /// Absolute tick until which safe mode is active
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub safe_mode: Option<Tick>,
    #[serde(skip_serializing_if = "is_zero", default)]
    pub safe_mode_available: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub safe_mode_cooldown: Option<Tick>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub upgrade_blocked: Option<Tick>,
    /// True for ramparts open to all users
    #[serde(skip_serializing_if = "is_false", default)]
    pub is_public: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub effects: Vec<Effect>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub npc_memory: Option<NpcMemory>,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

fn is_false(v: &bool) -> bool {
    !*v
}

// AHashMap only derefs to HashMap, so the attribute needs a free function
fn capacity_map_is_empty(m: &AHashMap<ResourceType, u32>) -> bool {
    m.is_empty()
}

impl RoomObject {
    pub fn new(id: ObjectId, kind: ObjectKind, pos: Position, room: RoomName) -> Self {
        Self {
            id,
            kind,
            pos,
            room,
            owner: None,
            hits: None,
            hits_max: None,
            store: Store::new(),
            store_capacity: None,
            store_capacity_resource: AHashMap::new(),
            body: Vec::new(),
            fatigue: 0,
            is_spawning: false,
            age_time: None,
            spawning: None,
            cooldown_time: None,
            next_regeneration_time: None,
            next_decay_time: None,
            decay_time: None,
            land_time: None,
            resource_type: None,
            amount: None,
            mineral_type: None,
            density: None,
            level: None,
            progress: None,
            progress_total: None,
            structure_type: None,
            downgrade_time: None,
            reservation: None,
            safe_mode: None,
            safe_mode_available: 0,
            safe_mode_cooldown: None,
            upgrade_blocked: None,
            is_public: false,
            effects: Vec::new(),
            npc_memory: None,
        }
    }

    pub fn with_owner(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_hits(mut self, hits: u32, hits_max: u32) -> Self {
        self.hits = Some(hits);
        self.hits_max = Some(hits_max);
        self
    }

    pub fn with_store(mut self, resource: ResourceType, amount: u32) -> Self {
        self.store.add(resource, amount);
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.store_capacity = Some(capacity);
        self
    }

    pub fn with_body(mut self, parts: &[PartType]) -> Self {
        self.body = parts.iter().map(|p| BodyPart::new(*p)).collect();
        let hits = self.body.len() as u32 * BODY_PART_HITS as u32;
        self.hits = Some(hits);
        self.hits_max = Some(hits);
        self
    }

    /// Count of a part type with hits remaining
    pub fn active_parts(&self, part: PartType) -> u32 {
        self.body.iter().filter(|p| p.part == part && p.hits > 0).count() as u32
    }

    pub fn has_active_part(&self, part: PartType) -> bool {
        self.body.iter().any(|p| p.part == part && p.hits > 0)
    }

    /// Summed power of a part type for one action, each active part scaled
    /// by its boost multiplier, floored at the end.
    pub fn body_power(&self, part: PartType, action: crate::constants::BoostAction, base: u32) -> u32 {
        let mut power = 0.0f64;
        for p in &self.body {
            if p.part != part || p.hits == 0 {
                continue;
            }
            let mult = p
                .boost
                .and_then(|b| crate::constants::boost_multiplier(part, action, b))
                .unwrap_or(1.0);
            power += base as f64 * mult;
        }
        power.floor() as u32
    }

    /// Store capacity for one resource, honoring per-resource overrides.
    /// With an override the resource competes only against its own cap;
    /// otherwise it shares the general capacity with all non-overridden
    /// resources.
    pub fn free_capacity(&self, resource: ResourceType) -> u32 {
        if let Some(cap) = self.store_capacity_resource.get(&resource) {
            return cap.saturating_sub(self.store.get(resource));
        }
        let cap = self.store_capacity.unwrap_or(0);
        let overridden: u32 = self
            .store_capacity_resource
            .keys()
            .map(|r| self.store.get(*r))
            .sum();
        cap.saturating_sub(self.store.total() - overridden)
    }

    /// Carry capacity from body parts, honoring capacity boosts
    pub fn body_carry_capacity(&self) -> u32 {
        self.body_power(
            PartType::Carry,
            crate::constants::BoostAction::Capacity,
            crate::constants::CARRY_CAPACITY,
        )
    }

    /// The single mineral a lab holds, if any
    pub fn lab_mineral(&self) -> Option<ResourceType> {
        self.store.resources().into_iter().find(|r| *r != ResourceType::Energy)
    }

    pub fn is_npc(&self, users: &AHashMap<UserId, super::room::UserRecord>) -> bool {
        self.owner
            .as_ref()
            .and_then(|o| users.get(o))
            .map(|u| u.npc)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creep() -> RoomObject {
        RoomObject::new(
            ObjectId::new(),
            ObjectKind::Creep,
            Position::new(10, 10),
            RoomName::new(0, 0),
        )
        .with_body(&[PartType::Work, PartType::Work, PartType::Carry, PartType::Move])
    }

    #[test]
    fn test_store_add_remove_prunes_zero() {
        let mut store = Store::new();
        store.add(ResourceType::Energy, 50);
        assert_eq!(store.get(ResourceType::Energy), 50);
        assert_eq!(store.remove(ResourceType::Energy, 80), 50);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_total() {
        let mut store = Store::new();
        store.add(ResourceType::Energy, 30);
        store.add(ResourceType::Hydrogen, 20);
        assert_eq!(store.total(), 50);
    }

    #[test]
    fn test_active_parts_ignore_destroyed() {
        let mut c = creep();
        assert_eq!(c.active_parts(PartType::Work), 2);
        c.body[0].hits = 0;
        assert_eq!(c.active_parts(PartType::Work), 1);
    }

    #[test]
    fn test_with_body_sets_hits() {
        let c = creep();
        assert_eq!(c.hits, Some(400));
        assert_eq!(c.hits_max, Some(400));
    }

    #[test]
    fn test_lab_free_capacity_per_resource() {
        let mut lab = RoomObject::new(
            ObjectId::new(),
            ObjectKind::Lab,
            Position::new(5, 5),
            RoomName::new(0, 0),
        )
        .with_capacity(3000)
        .with_store(ResourceType::Energy, 500)
        .with_store(ResourceType::Hydrogen, 1000);
        lab.store_capacity_resource.insert(ResourceType::Energy, 2000);

        // Energy competes only against its own 2000 cap
        assert_eq!(lab.free_capacity(ResourceType::Energy), 1500);
        // Minerals share the general 3000 cap, energy excluded
        assert_eq!(lab.free_capacity(ResourceType::Hydrogen), 2000);
    }

    #[test]
    fn test_wire_resource_names() {
        let json = serde_json::to_string(&ResourceType::CatalyzedUtriumAcid).unwrap();
        assert_eq!(json, "\"XUH2O\"");
        let json = serde_json::to_string(&ResourceType::Energy).unwrap();
        assert_eq!(json, "\"energy\"");
    }

    #[test]
    fn test_empty_optional_fields_stay_off_the_wire() {
        let road = RoomObject::new(
            ObjectId::new(),
            ObjectKind::Road,
            Position::new(1, 1),
            RoomName::new(0, 0),
        );
        let json = serde_json::to_string(&road).unwrap();
        assert!(!json.contains("storeCapacityResource"));
        assert!(!json.contains("\"body\""));
        assert!(!json.contains("fatigue"));
    }
}
