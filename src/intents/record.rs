//! Intent records and the closed intent enum
//!
//! Wire records arrive as `{ "name": ..., field-map... }` per action. They
//! parse into the closed `Intent` enum; an unknown name or a missing/
//! mistyped required field fails the parse and the record becomes a silent
//! no-op, never aborting its siblings. Dispatch downstream is an exhaustive
//! match over the enum, checked at compile time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{Direction, ObjectId, Position, RoomName, UserId};
use crate::state::object::{PartType, ResourceType};

/// One declarative player action for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum Intent {
    Move { direction: Direction },
    Pull { target: ObjectId },
    Transfer { target: ObjectId, resource: ResourceType, amount: u32 },
    Withdraw { target: ObjectId, resource: ResourceType, amount: u32 },
    Pickup { target: ObjectId },
    Drop { resource: ResourceType, amount: u32 },
    Harvest { target: ObjectId },
    Build { target: ObjectId },
    Repair { target: ObjectId },
    Dismantle { target: ObjectId },
    UpgradeController { target: ObjectId },
    ReserveController { target: ObjectId },
    ClaimController { target: ObjectId },
    AttackController { target: ObjectId },
    /// Actor is the controller itself
    ActivateSafeMode,
    /// Creep feeds 1000 ghodium into its controller
    GenerateSafeMode { target: ObjectId },
    Attack { target: ObjectId },
    RangedAttack { target: ObjectId },
    RangedMassAttack,
    Heal { target: ObjectId },
    RangedHeal { target: ObjectId },
    Say { message: String },
    /// Actor is the spawn
    RenewCreep { target: ObjectId },
    /// Actor is the spawn
    RecycleCreep { target: ObjectId },
    CancelSpawning,
    Suicide,
    /// Actor is the output lab
    RunReaction { lab1: ObjectId, lab2: ObjectId },
    /// Actor is the lab holding the boost compound
    #[serde(rename_all = "camelCase")]
    BoostCreep { target: ObjectId, parts_count: Option<u32> },
    LinkTransferEnergy { target: ObjectId, amount: u32 },
    FactoryProduce { product: ResourceType },
    TowerAttack { target: ObjectId },
    TowerHeal { target: ObjectId },
    TowerRepair { target: ObjectId },
    LaunchNuke { room: RoomName, pos: Position },
    ObserveRoom { room: RoomName },
    ProcessPower,
}

impl Intent {
    /// The in-room object this intent acts on, when it has one
    pub fn target(&self) -> Option<ObjectId> {
        use Intent::*;
        match self {
            Pull { target }
            | Transfer { target, .. }
            | Withdraw { target, .. }
            | Pickup { target }
            | Harvest { target }
            | Build { target }
            | Repair { target }
            | Dismantle { target }
            | UpgradeController { target }
            | ReserveController { target }
            | ClaimController { target }
            | AttackController { target }
            | GenerateSafeMode { target }
            | Attack { target }
            | RangedAttack { target }
            | Heal { target }
            | RangedHeal { target }
            | RenewCreep { target }
            | RecycleCreep { target }
            | BoostCreep { target, .. }
            | LinkTransferEnergy { target, .. }
            | TowerAttack { target }
            | TowerHeal { target }
            | TowerRepair { target } => Some(*target),
            _ => None,
        }
    }
}

/// One wire intent record, kept untyped until the validation pipeline
/// parses it. Parsing failure is the malformed-intent no-op path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRecord(pub serde_json::Value);

impl IntentRecord {
    pub fn parse(&self) -> Option<Intent> {
        serde_json::from_value(self.0.clone()).ok()
    }

    pub fn of(intent: &Intent) -> Self {
        Self(serde_json::to_value(intent).unwrap_or(serde_json::Value::Null))
    }
}

/// Spawn-creation request. Kept apart from object intents because creation
/// has no pre-existing target id to key on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnCreateIntent {
    pub spawn: ObjectId,
    pub creep_name: String,
    pub body: Vec<PartType>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub directions: Option<Vec<Direction>>,
    /// Energy drain order; None means the spawn plus all extensions,
    /// sorted by id
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub energy_structures: Option<Vec<ObjectId>>,
}

/// All intents one user submitted for one room-tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIntents {
    /// One object may carry several intents of different kinds in the same
    /// tick (move + pull, attack + heal)
    #[serde(default)]
    pub objects: BTreeMap<ObjectId, Vec<IntentRecord>>,
    #[serde(default)]
    pub spawn_creates: Vec<SpawnCreateIntent>,
}

/// The whole intent batch for one room-tick, grouped per user then per
/// target object. BTree maps keep iteration deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentBatch {
    pub users: BTreeMap<UserId, UserIntents>,
}

impl IntentBatch {
    pub fn push(&mut self, user: &UserId, object: ObjectId, intent: Intent) {
        self.users
            .entry(user.clone())
            .or_default()
            .objects
            .entry(object)
            .or_default()
            .push(IntentRecord::of(&intent));
    }

    pub fn push_spawn_create(&mut self, user: &UserId, create: SpawnCreateIntent) {
        self.users.entry(user.clone()).or_default().spawn_creates.push(create);
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
