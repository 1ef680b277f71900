//! Shared fixtures for the integration tests

use deepwarren::core::config::EngineConfig;
use deepwarren::core::types::{ObjectId, Position, RoomName, UserId};
use deepwarren::intents::record::IntentBatch;
use deepwarren::simulation::tick::{process_room_tick, TickOutcome};
use deepwarren::state::object::{ObjectKind, PartType, ResourceType, RoomObject};
use deepwarren::state::room::{RoomSnapshot, UserRecord};
use deepwarren::state::terrain::RoomTerrain;

pub const ROOM: RoomName = RoomName { x: 0, y: 0 };

pub fn alice() -> UserId {
    UserId::new("alice")
}

pub fn bob() -> UserId {
    UserId::new("bob")
}

pub fn player(name: &str) -> UserRecord {
    UserRecord {
        id: UserId::new(name),
        username: name.to_string(),
        gcl: 1,
        power: 0,
        npc: false,
    }
}

pub fn npc_user(name: &str) -> UserRecord {
    UserRecord { npc: true, ..player(name) }
}

pub fn snapshot(game_time: u64, objects: Vec<RoomObject>, intents: IntentBatch) -> RoomSnapshot {
    RoomSnapshot::new(
        ROOM,
        game_time,
        objects,
        RoomTerrain::open(),
        vec![player("alice"), player("bob")],
        intents,
    )
}

pub fn run(snap: &RoomSnapshot) -> TickOutcome {
    process_room_tick(snap, &EngineConfig::default())
}

pub fn id(tag: &str, salt: u64) -> ObjectId {
    ObjectId::derive(0, tag, salt)
}

/// Worker creep: WORK WORK CARRY MOVE, 50 capacity
pub fn worker(creep_id: ObjectId, owner: &UserId, pos: Position) -> RoomObject {
    RoomObject::new(creep_id, ObjectKind::Creep, pos, ROOM)
        .with_owner(owner.clone())
        .with_body(&[PartType::Work, PartType::Work, PartType::Carry, PartType::Move])
        .with_capacity(50)
}

pub fn source(source_id: ObjectId, pos: Position, energy: u32) -> RoomObject {
    RoomObject::new(source_id, ObjectKind::Source, pos, ROOM)
        .with_store(ResourceType::Energy, energy)
        .with_capacity(3000)
}

/// Patch lookup helper: the merged patch staged for one object, if any
pub fn patch_for<'a>(
    outcome: &'a TickOutcome,
    target: ObjectId,
) -> Option<&'a deepwarren::mutation::patch::ObjectPatch> {
    outcome.patches.iter().find(|(pid, _)| *pid == target).map(|(_, p)| p)
}
