//! Cosmetic tick event log
//!
//! Best-effort telemetry for client visualization: which creep hit what,
//! how much was harvested. Never consulted by processing steps; dropping it
//! entirely changes no gameplay state.

use serde::{Deserialize, Serialize};

use crate::core::types::{ObjectId, Position, RoomName, UserId};
use crate::state::object::ResourceType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "event")]
pub enum TickEvent {
    Attack { attacker: ObjectId, target: ObjectId, damage: u32 },
    Heal { healer: ObjectId, target: ObjectId, amount: u32 },
    Harvest { creep: ObjectId, target: ObjectId, amount: u32 },
    Build { creep: ObjectId, site: ObjectId, amount: u32 },
    Repair { creep: ObjectId, target: ObjectId, amount: u32 },
    UpgradeController { creep: ObjectId, amount: u32 },
    Transfer { from: ObjectId, to: ObjectId, resource: ResourceType, amount: u32 },
    ObjectDestroyed { id: ObjectId, kind_tag: String },
    SpawnCompleted { spawn: ObjectId, creep: ObjectId },
    NukeLanded { pos: Position },
    ObserveRoom { user: UserId, room: RoomName },
}
