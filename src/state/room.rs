//! The per-tick room snapshot: immutable input to the pipeline
//!
//! Built once by the storage loader, never mutated during processing. Every
//! step reads this and writes only through the mutation writers. Iteration
//! helpers return objects in sorted-id order so a tick is deterministic
//! regardless of hash-map layout.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::core::types::{ObjectId, Position, RoomName, Tick, UserId};
use crate::intents::record::IntentBatch;
use crate::state::object::{ObjectKind, RoomObject};
use crate::state::terrain::RoomTerrain;

/// Account-level record for a user present in the room
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub gcl: u64,
    #[serde(default)]
    pub power: u64,
    /// NPC factions (keepers, invaders) get memory-light AI, no stats
    #[serde(default)]
    pub npc: bool,
}

/// Immutable state of one room plus its intent batch at the start of a tick
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub name: RoomName,
    pub game_time: Tick,
    pub objects: AHashMap<ObjectId, RoomObject>,
    pub terrain: RoomTerrain,
    pub users: AHashMap<UserId, UserRecord>,
    #[serde(default)]
    pub intents: IntentBatch,
    /// Object ids in sorted order, rebuilt on construction/deserialization
    #[serde(skip)]
    sorted_ids: Vec<ObjectId>,
    /// Per-tile object ids in sorted order, for O(1) tile queries
    #[serde(skip)]
    tile_index: AHashMap<Position, Vec<ObjectId>>,
}

impl RoomSnapshot {
    pub fn new(
        name: RoomName,
        game_time: Tick,
        objects: Vec<RoomObject>,
        terrain: RoomTerrain,
        users: Vec<UserRecord>,
        intents: IntentBatch,
    ) -> Self {
        let objects: AHashMap<ObjectId, RoomObject> =
            objects.into_iter().map(|o| (o.id, o)).collect();
        let users = users.into_iter().map(|u| (u.id.clone(), u)).collect();
        let mut snapshot = Self {
            name,
            game_time,
            objects,
            terrain,
            users,
            intents,
            sorted_ids: Vec::new(),
            tile_index: AHashMap::new(),
        };
        snapshot.rebuild_index();
        snapshot
    }

    /// Decode the wire form. Fails the whole tick on malformed input; the
    /// core never processes a partial snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut snapshot: RoomSnapshot = serde_json::from_str(json)?;
        for (id, obj) in &snapshot.objects {
            if *id != obj.id {
                return Err(EngineError::InvalidSnapshot(format!(
                    "object key {} does not match object id {}",
                    id, obj.id
                )));
            }
        }
        snapshot.rebuild_index();
        Ok(snapshot)
    }

    fn rebuild_index(&mut self) {
        self.sorted_ids = self.objects.keys().copied().collect();
        self.sorted_ids.sort();
        self.tile_index.clear();
        for id in &self.sorted_ids {
            if let Some(obj) = self.objects.get(id) {
                self.tile_index.entry(obj.pos).or_default().push(*id);
            }
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&RoomObject> {
        self.objects.get(&id)
    }

    /// All objects in sorted-id order
    pub fn iter(&self) -> impl Iterator<Item = &RoomObject> {
        self.sorted_ids.iter().filter_map(move |id| self.objects.get(id))
    }

    pub fn of_kind(&self, kind: ObjectKind) -> impl Iterator<Item = &RoomObject> {
        self.iter().filter(move |o| o.kind == kind)
    }

    /// Objects standing on a tile, sorted-id order
    pub fn at(&self, pos: Position) -> impl Iterator<Item = &RoomObject> {
        self.tile_index
            .get(&pos)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.objects.get(id))
    }

    pub fn creeps_of<'a>(&'a self, owner: &'a UserId) -> impl Iterator<Item = &'a RoomObject> {
        self.of_kind(ObjectKind::Creep)
            .filter(move |o| o.owner.as_ref() == Some(owner))
    }

    /// The room's controller, if it has one
    pub fn controller(&self) -> Option<&RoomObject> {
        self.of_kind(ObjectKind::Controller).next()
    }

    /// Whether safe mode is active this tick
    pub fn safe_mode_active(&self) -> bool {
        self.controller()
            .and_then(|c| c.safe_mode)
            .map(|until| until > self.game_time)
            .unwrap_or(false)
    }

    /// Owner of the room's controller, if claimed
    pub fn controller_owner(&self) -> Option<&UserId> {
        self.controller().and_then(|c| c.owner.as_ref())
    }

    pub fn is_npc_user(&self, user: &UserId) -> bool {
        self.users.get(user).map(|u| u.npc).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::object::ObjectKind;

    fn snapshot_with(objects: Vec<RoomObject>) -> RoomSnapshot {
        RoomSnapshot::new(
            RoomName::new(0, 0),
            100,
            objects,
            RoomTerrain::open(),
            vec![],
            IntentBatch::default(),
        )
    }

    #[test]
    fn test_iteration_is_sorted_by_id() {
        let room = RoomName::new(0, 0);
        let objects: Vec<RoomObject> = (0..20)
            .map(|i| {
                RoomObject::new(
                    ObjectId::derive(1, "t", i),
                    ObjectKind::Road,
                    Position::new(i as u8, 0),
                    room,
                )
            })
            .collect();
        let snapshot = snapshot_with(objects);
        let ids: Vec<ObjectId> = snapshot.iter().map(|o| o.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_at_filters_by_position() {
        let room = RoomName::new(0, 0);
        let a = RoomObject::new(ObjectId::new(), ObjectKind::Road, Position::new(5, 5), room);
        let b = RoomObject::new(ObjectId::new(), ObjectKind::Container, Position::new(5, 5), room);
        let c = RoomObject::new(ObjectId::new(), ObjectKind::Road, Position::new(6, 5), room);
        let snapshot = snapshot_with(vec![a, b, c]);
        assert_eq!(snapshot.at(Position::new(5, 5)).count(), 2);
    }

    #[test]
    fn test_at_returns_sorted_ids() {
        let room = RoomName::new(0, 0);
        let objects: Vec<RoomObject> = (0..8)
            .map(|i| {
                RoomObject::new(
                    ObjectId::derive(2, "s", i),
                    ObjectKind::Road,
                    Position::new(9, 9),
                    room,
                )
            })
            .collect();
        let snapshot = snapshot_with(objects);
        let ids: Vec<ObjectId> = snapshot.at(Position::new(9, 9)).map(|o| o.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids.len(), 8);
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_safe_mode_active_window() {
        let room = RoomName::new(0, 0);
        let mut controller =
            RoomObject::new(ObjectId::new(), ObjectKind::Controller, Position::new(1, 1), room);
        controller.safe_mode = Some(150);
        let snapshot = snapshot_with(vec![controller]);
        assert!(snapshot.safe_mode_active());
    }

    #[test]
    fn test_json_rejects_mismatched_key() {
        let room = RoomName::new(0, 0);
        let obj = RoomObject::new(ObjectId::new(), ObjectKind::Road, Position::new(1, 1), room);
        let snapshot = snapshot_with(vec![obj]);
        let mut value = serde_json::to_value(&snapshot).unwrap();
        // Corrupt one object key
        let objects = value.get_mut("objects").unwrap().as_object_mut().unwrap();
        let (_, v) = objects.iter().next().map(|(k, v)| (k.clone(), v.clone())).unwrap();
        objects.clear();
        objects.insert(uuid::Uuid::new_v4().to_string(), v);
        let err = RoomSnapshot::from_json(&value.to_string());
        assert!(err.is_err());
    }
}
