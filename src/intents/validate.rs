//! Intent-validation pipeline
//!
//! A fixed ordered chain of independent validators filters the batch before
//! any mechanic step runs. Rejection is silent and idempotent: validating an
//! already-validated batch changes nothing. Downstream steps assume the
//! guarantees made here and only re-check stricter, mechanic-specific rules
//! (combat re-derives exact range for falloff, movement re-checks terrain).

use crate::constants;
use crate::core::types::{ObjectId, UserId};
use crate::intents::record::{Intent, IntentBatch, SpawnCreateIntent};
use crate::state::object::{ObjectKind, PartType, ResourceType, RoomObject};
use crate::state::room::RoomSnapshot;

/// One intent that passed the whole chain
#[derive(Debug, Clone)]
pub struct ValidIntent {
    pub user: UserId,
    pub actor: ObjectId,
    pub intent: Intent,
}

/// The validated batch handed to every processing step, in deterministic
/// (user, actor, submission) order.
#[derive(Debug, Clone, Default)]
pub struct ValidBatch {
    pub intents: Vec<ValidIntent>,
    pub spawn_creates: Vec<(UserId, SpawnCreateIntent)>,
}

impl ValidBatch {
    /// Valid intents matching a predicate, for step-local filtering
    pub fn select<'a>(
        &'a self,
        pred: impl Fn(&Intent) -> bool + 'a,
    ) -> impl Iterator<Item = &'a ValidIntent> {
        self.intents.iter().filter(move |v| pred(&v.intent))
    }
}

type Validator = fn(&RoomSnapshot, &UserId, &RoomObject, &Intent) -> bool;

/// The fixed validator chain. Order matters: later validators may assume
/// earlier ones passed (range checks dereference the target unconditionally
/// because target-existence ran first).
const CHAIN: &[(&str, Validator)] = &[
    ("actor-ready", actor_ready),
    ("ownership", ownership),
    ("safe-mode", safe_mode_gate),
    ("target-and-range", target_and_range),
    ("body-part", required_body_part),
    ("resources", resource_availability),
    ("structure-rules", structure_rules),
];

/// Filter the room's intent batch down to the records every mechanic step
/// may assume are well-formed.
pub fn validate(snapshot: &RoomSnapshot) -> ValidBatch {
    let mut batch = ValidBatch::default();
    for (user, intents) in &snapshot.intents.users {
        for (actor_id, records) in &intents.objects {
            let Some(actor) = snapshot.get(*actor_id) else {
                continue;
            };
            for record in records {
                let Some(intent) = record.parse() else {
                    continue;
                };
                let rejected = CHAIN
                    .iter()
                    .find(|(_, v)| !v(snapshot, user, actor, &intent));
                if let Some((rule, _)) = rejected {
                    tracing::debug!(user = %user, actor = %actor_id, rule, "intent rejected");
                    continue;
                }
                batch.intents.push(ValidIntent {
                    user: user.clone(),
                    actor: *actor_id,
                    intent,
                });
            }
        }
        for create in &intents.spawn_creates {
            if validate_spawn_create(snapshot, user, create) {
                batch.spawn_creates.push((user.clone(), create.clone()));
            }
        }
    }
    batch
}

/// Expected actor kind; None means a creep
fn expected_actor(intent: &Intent) -> Option<ObjectKind> {
    use Intent::*;
    match intent {
        TowerAttack { .. } | TowerHeal { .. } | TowerRepair { .. } => Some(ObjectKind::Tower),
        RenewCreep { .. } | RecycleCreep { .. } | CancelSpawning => Some(ObjectKind::Spawn),
        RunReaction { .. } | BoostCreep { .. } => Some(ObjectKind::Lab),
        LinkTransferEnergy { .. } => Some(ObjectKind::Link),
        FactoryProduce { .. } => Some(ObjectKind::Factory),
        LaunchNuke { .. } => Some(ObjectKind::Nuker),
        ObserveRoom { .. } => Some(ObjectKind::Observer),
        ProcessPower => Some(ObjectKind::PowerSpawn),
        ActivateSafeMode => Some(ObjectKind::Controller),
        _ => None,
    }
}

fn actor_ready(_snapshot: &RoomSnapshot, _user: &UserId, actor: &RoomObject, intent: &Intent) -> bool {
    match expected_actor(intent) {
        Some(kind) => actor.kind == kind,
        None => {
            actor.kind == ObjectKind::Creep
                && !actor.is_spawning
                && actor.hits.map(|h| h > 0).unwrap_or(false)
        }
    }
}

fn ownership(_snapshot: &RoomSnapshot, user: &UserId, actor: &RoomObject, _intent: &Intent) -> bool {
    actor.owner.as_ref() == Some(user)
}

/// While the controller's safe mode is active, non-owner users lose their
/// offensive intents in this room.
fn safe_mode_gate(snapshot: &RoomSnapshot, user: &UserId, _actor: &RoomObject, intent: &Intent) -> bool {
    use Intent::*;
    let offensive = matches!(
        intent,
        Attack { .. }
            | RangedAttack { .. }
            | RangedMassAttack
            | AttackController { .. }
            | Dismantle { .. }
            | Withdraw { .. }
    );
    if !offensive || !snapshot.safe_mode_active() {
        return true;
    }
    snapshot.controller_owner() == Some(user)
}

/// Range requirement per operation; None means no in-room target range check
fn required_range(intent: &Intent) -> Option<u32> {
    use Intent::*;
    match intent {
        Transfer { .. } | Withdraw { .. } | Pickup { .. } | Harvest { .. } | Attack { .. }
        | Heal { .. } | Pull { .. } | Dismantle { .. } | ClaimController { .. }
        | ReserveController { .. } | AttackController { .. } | GenerateSafeMode { .. }
        | RenewCreep { .. } | RecycleCreep { .. } | BoostCreep { .. } => Some(1),
        Build { .. } | Repair { .. } | UpgradeController { .. } | RangedAttack { .. }
        | RangedHeal { .. } => Some(3),
        _ => None,
    }
}

fn target_and_range(snapshot: &RoomSnapshot, _user: &UserId, actor: &RoomObject, intent: &Intent) -> bool {
    let Some(target_id) = intent.target() else {
        return true;
    };
    let Some(target) = snapshot.get(target_id) else {
        return false;
    };
    match required_range(intent) {
        Some(range) => actor.pos.range_to(&target.pos) <= range,
        None => true,
    }
}

/// Body part the acting creep must have at least one active instance of
fn required_part(intent: &Intent) -> Option<PartType> {
    use Intent::*;
    match intent {
        Harvest { .. } | Build { .. } | Repair { .. } | Dismantle { .. }
        | UpgradeController { .. } => Some(PartType::Work),
        Attack { .. } => Some(PartType::Attack),
        RangedAttack { .. } | RangedMassAttack => Some(PartType::RangedAttack),
        Heal { .. } | RangedHeal { .. } => Some(PartType::Heal),
        ClaimController { .. } | ReserveController { .. } | AttackController { .. } => {
            Some(PartType::Claim)
        }
        Transfer { .. } | Withdraw { .. } | Pickup { .. } | Drop { .. } => Some(PartType::Carry),
        Move { .. } => Some(PartType::Move),
        _ => None,
    }
}

fn required_body_part(_snapshot: &RoomSnapshot, _user: &UserId, actor: &RoomObject, intent: &Intent) -> bool {
    match required_part(intent) {
        Some(part) => actor.has_active_part(part),
        None => true,
    }
}

fn resource_availability(snapshot: &RoomSnapshot, _user: &UserId, actor: &RoomObject, intent: &Intent) -> bool {
    use Intent::*;
    match intent {
        Transfer { resource, amount, .. } | Drop { resource, amount } => {
            *amount > 0 && actor.store.get(*resource) > 0
        }
        Withdraw { target, resource, amount } => {
            *amount > 0
                && snapshot
                    .get(*target)
                    .map(|t| t.store.get(*resource) > 0)
                    .unwrap_or(false)
        }
        Build { .. } | Repair { .. } | UpgradeController { .. } => {
            actor.store.get(ResourceType::Energy) > 0
        }
        GenerateSafeMode { .. } => {
            actor.store.get(ResourceType::Ghodium) >= constants::SAFE_MODE_COST
        }
        TowerAttack { .. } | TowerHeal { .. } | TowerRepair { .. } => {
            actor.store.get(ResourceType::Energy) >= constants::TOWER_ENERGY_COST
        }
        LinkTransferEnergy { amount, .. } => {
            *amount > 0 && actor.store.get(ResourceType::Energy) >= *amount
        }
        ProcessPower => {
            actor.store.get(ResourceType::Energy) >= constants::POWER_SPAWN_ENERGY_RATIO
                && actor.store.get(ResourceType::Power) >= 1
        }
        LaunchNuke { .. } => {
            actor.store.get(ResourceType::Energy) >= constants::NUKER_ENERGY_CAPACITY
                && actor.store.get(ResourceType::Ghodium) >= constants::NUKER_GHODIUM_CAPACITY
        }
        _ => true,
    }
}

/// Mechanic-specific structural preconditions, the last and strictest link
fn structure_rules(snapshot: &RoomSnapshot, user: &UserId, actor: &RoomObject, intent: &Intent) -> bool {
    use Intent::*;
    let time = snapshot.game_time;
    let cooled = |obj: &RoomObject| obj.cooldown_time.map(|t| t <= time).unwrap_or(true);
    match intent {
        Harvest { target } => {
            let Some(target) = snapshot.get(*target) else { return false };
            match target.kind {
                ObjectKind::Source => true,
                ObjectKind::Mineral => {
                    // Mineral harvest requires an aligned, non-cooling extractor
                    snapshot
                        .of_kind(ObjectKind::Extractor)
                        .any(|e| e.pos == target.pos && cooled(e))
                }
                _ => false,
            }
        }
        RunReaction { lab1, lab2 } => {
            if !cooled(actor) {
                return false;
            }
            let (Some(a), Some(b)) = (snapshot.get(*lab1), snapshot.get(*lab2)) else {
                return false;
            };
            a.kind == ObjectKind::Lab
                && b.kind == ObjectKind::Lab
                && actor.pos.range_to(&a.pos) <= 2
                && actor.pos.range_to(&b.pos) <= 2
        }
        FactoryProduce { product } => {
            let Some(recipe) = constants::factory_recipe(*product) else {
                return false;
            };
            cooled(actor) && actor.level.unwrap_or(0) >= recipe.level
        }
        LinkTransferEnergy { target, .. } => {
            cooled(actor)
                && snapshot
                    .get(*target)
                    .map(|t| t.kind == ObjectKind::Link)
                    .unwrap_or(false)
        }
        LaunchNuke { room, .. } => {
            cooled(actor) && snapshot.name.range_to(room) <= constants::NUKE_RANGE
        }
        ObserveRoom { room } => snapshot.name.range_to(room) <= constants::OBSERVER_RANGE,
        RenewCreep { target } => {
            let Some(creep) = snapshot.get(*target) else { return false };
            actor.spawning.is_none()
                && creep.kind == ObjectKind::Creep
                && !creep.body.iter().any(|p| p.part == PartType::Claim)
        }
        RecycleCreep { target } => snapshot
            .get(*target)
            .map(|c| c.kind == ObjectKind::Creep && c.owner.as_ref() == Some(user))
            .unwrap_or(false),
        CancelSpawning => actor.spawning.is_some(),
        UpgradeController { target } => {
            let Some(controller) = snapshot.get(*target) else { return false };
            controller.upgrade_blocked.map(|t| t <= time).unwrap_or(true)
        }
        ClaimController { target } => {
            let Some(controller) = snapshot.get(*target) else { return false };
            controller.owner.is_none()
                && controller
                    .reservation
                    .as_ref()
                    .map(|r| r.end_time <= time || &r.user == user)
                    .unwrap_or(true)
        }
        ReserveController { target } => {
            let Some(controller) = snapshot.get(*target) else { return false };
            controller.owner.is_none()
                && controller
                    .reservation
                    .as_ref()
                    .map(|r| r.end_time <= time || &r.user == user)
                    .unwrap_or(true)
        }
        AttackController { target } => {
            let Some(controller) = snapshot.get(*target) else { return false };
            let hostile_owner = controller.owner.as_ref().map(|o| o != user).unwrap_or(false);
            let hostile_reserve = controller
                .reservation
                .as_ref()
                .map(|r| r.end_time > time && &r.user != user)
                .unwrap_or(false);
            hostile_owner || hostile_reserve
        }
        ActivateSafeMode => {
            actor.safe_mode_available > 0
                && actor.safe_mode.map(|t| t <= time).unwrap_or(true)
                && actor.safe_mode_cooldown.map(|t| t <= time).unwrap_or(true)
        }
        BoostCreep { target, .. } => {
            cooled(actor)
                && actor.lab_mineral().is_some()
                && snapshot
                    .get(*target)
                    .map(|c| c.kind == ObjectKind::Creep)
                    .unwrap_or(false)
        }
        _ => true,
    }
}

fn validate_spawn_create(snapshot: &RoomSnapshot, user: &UserId, create: &SpawnCreateIntent) -> bool {
    let Some(spawn) = snapshot.get(create.spawn) else {
        return false;
    };
    if spawn.kind != ObjectKind::Spawn
        || spawn.owner.as_ref() != Some(user)
        || spawn.spawning.is_some()
    {
        return false;
    }
    if create.body.is_empty() || create.body.len() > constants::MAX_CREEP_SIZE {
        return false;
    }
    let cost: u32 = create.body.iter().map(|p| constants::body_part_cost(*p)).sum();
    available_spawn_energy(snapshot, user, create) >= cost
}

/// Energy reachable for charging: the listed structures, or the spawn plus
/// every owned spawn/extension in the room.
pub fn available_spawn_energy(
    snapshot: &RoomSnapshot,
    user: &UserId,
    create: &SpawnCreateIntent,
) -> u32 {
    energy_structures(snapshot, user, create)
        .iter()
        .filter_map(|id| snapshot.get(*id))
        .map(|s| s.store.get(ResourceType::Energy))
        .sum()
}

/// Charging drain order, sorted by id when the caller did not list one
pub fn energy_structures(
    snapshot: &RoomSnapshot,
    user: &UserId,
    create: &SpawnCreateIntent,
) -> Vec<ObjectId> {
    match &create.energy_structures {
        Some(list) => list.clone(),
        None => snapshot
            .iter()
            .filter(|o| {
                matches!(o.kind, ObjectKind::Spawn | ObjectKind::Extension)
                    && o.owner.as_ref() == Some(user)
            })
            .map(|o| o.id)
            .collect(),
    }
}
