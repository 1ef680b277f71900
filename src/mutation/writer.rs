//! Mutation writers
//!
//! Steps never touch the snapshot; every change funnels through a writer.
//! `RoomWriter` accumulates sparse patches, whole-object inserts and
//! removals for the room being processed. Removal is authoritative: once an
//! id is marked removed, any patch to it (already staged or arriving later)
//! is dropped, and later steps query `is_removed` before acting. The
//! `GlobalWriter` carries the few effects that land outside the current
//! room and is merged id-keyed by the multi-room driver, so concurrent room
//! processing cannot duplicate an insert.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::types::{ObjectId, RoomName, UserId};
use crate::mutation::patch::ObjectPatch;
use crate::state::object::RoomObject;

/// Room-scoped mutation accumulator
#[derive(Debug, Default)]
pub struct RoomWriter {
    patches: AHashMap<ObjectId, ObjectPatch>,
    inserts: AHashMap<ObjectId, RoomObject>,
    removals: AHashSet<ObjectId>,
}

impl RoomWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a sparse patch; merges field-wise with anything already staged.
    /// Silently a no-op for removed ids.
    pub fn patch(&mut self, id: ObjectId, patch: ObjectPatch) {
        if self.removals.contains(&id) || patch.is_empty() {
            return;
        }
        if let Some(inserted) = self.inserts.get_mut(&id) {
            // Patching an object created this tick mutates the insert itself
            patch.apply_to(inserted);
            return;
        }
        self.patches.entry(id).or_default().merge(&patch);
    }

    /// Stage a whole-object insert, id-keyed and idempotent
    pub fn upsert(&mut self, object: RoomObject) {
        if self.removals.contains(&object.id) {
            return;
        }
        self.patches.remove(&object.id);
        self.inserts.insert(object.id, object);
    }

    /// Authoritative removal: drops staged patches/inserts, blocks future ones
    pub fn remove(&mut self, id: ObjectId) {
        self.patches.remove(&id);
        self.inserts.remove(&id);
        self.removals.insert(id);
    }

    /// Removal-marker query used by later steps (decay must skip a pile an
    /// earlier step already picked up)
    pub fn is_removed(&self, id: ObjectId) -> bool {
        self.removals.contains(&id)
    }

    /// Objects inserted this tick, for same-tick merge lookups (ground
    /// piles). Sorted by id.
    pub fn inserts(&self) -> Vec<&RoomObject> {
        let mut out: Vec<&RoomObject> = self.inserts.values().collect();
        out.sort_by_key(|o| o.id);
        out
    }

    pub fn get_insert_mut(&mut self, id: ObjectId) -> Option<&mut RoomObject> {
        self.inserts.get_mut(&id)
    }

    /// Drain into the tick outcome, sorted for deterministic emission
    pub fn into_parts(self) -> (Vec<(ObjectId, ObjectPatch)>, Vec<ObjectId>, Vec<RoomObject>) {
        let mut patches: Vec<(ObjectId, ObjectPatch)> = self.patches.into_iter().collect();
        patches.sort_by_key(|(id, _)| *id);
        let mut removals: Vec<ObjectId> = self.removals.into_iter().collect();
        removals.sort();
        let mut inserts: Vec<RoomObject> = self.inserts.into_values().collect();
        inserts.sort_by_key(|o| o.id);
        (patches, removals, inserts)
    }
}

/// Cross-room effects produced while processing one room
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalEffects {
    /// Whole objects landing in other rooms (a launched nuke), id-keyed
    pub upserts: AHashMap<ObjectId, (RoomName, RoomObject)>,
    /// Per-user GCL progress increments
    pub gcl: AHashMap<UserId, u64>,
    /// Per-user processed power credits
    pub power: AHashMap<UserId, u64>,
    /// Observer vision requests
    pub vision: Vec<(UserId, RoomName)>,
}

/// Writer for effects that land outside the current room
#[derive(Debug, Default)]
pub struct GlobalWriter {
    effects: GlobalEffects,
}

impl GlobalWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, room: RoomName, object: RoomObject) {
        self.effects.upserts.insert(object.id, (room, object));
    }

    pub fn add_gcl(&mut self, user: &UserId, delta: u64) {
        *self.effects.gcl.entry(user.clone()).or_insert(0) += delta;
    }

    pub fn add_power(&mut self, user: &UserId, delta: u64) {
        *self.effects.power.entry(user.clone()).or_insert(0) += delta;
    }

    pub fn request_vision(&mut self, user: &UserId, room: RoomName) {
        self.effects.vision.push((user.clone(), room));
    }

    pub fn into_effects(self) -> GlobalEffects {
        self.effects
    }
}

impl GlobalEffects {
    /// Merge effects from another room's tick. Upserts are id-keyed, so the
    /// same logical object arriving twice stays a single insert.
    pub fn merge(&mut self, other: GlobalEffects) {
        self.upserts.extend(other.upserts);
        for (user, delta) in other.gcl {
            *self.gcl.entry(user).or_insert(0) += delta;
        }
        for (user, delta) in other.power {
            *self.power.entry(user).or_insert(0) += delta;
        }
        self.vision.extend(other.vision);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Position;
    use crate::state::object::ObjectKind;

    fn road(id: ObjectId) -> RoomObject {
        RoomObject::new(id, ObjectKind::Road, Position::new(1, 1), RoomName::new(0, 0))
            .with_hits(5000, 5000)
    }

    #[test]
    fn test_patches_merge_per_id() {
        let mut writer = RoomWriter::new();
        let id = ObjectId::derive(1, "w", 0);
        writer.patch(id, ObjectPatch { hits: Some(Some(10)), ..Default::default() });
        writer.patch(id, ObjectPatch { fatigue: Some(3), ..Default::default() });
        let (patches, _, _) = writer.into_parts();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].1.hits, Some(Some(10)));
        assert_eq!(patches[0].1.fatigue, Some(3));
    }

    #[test]
    fn test_remove_is_authoritative() {
        let mut writer = RoomWriter::new();
        let id = ObjectId::derive(1, "w", 1);
        writer.patch(id, ObjectPatch { hits: Some(Some(10)), ..Default::default() });
        writer.remove(id);
        // Later patches are silently dropped
        writer.patch(id, ObjectPatch { hits: Some(Some(99)), ..Default::default() });
        assert!(writer.is_removed(id));
        let (patches, removals, _) = writer.into_parts();
        assert!(patches.is_empty());
        assert_eq!(removals, vec![id]);
    }

    #[test]
    fn test_patch_after_upsert_mutates_insert() {
        let mut writer = RoomWriter::new();
        let id = ObjectId::derive(1, "w", 2);
        writer.upsert(road(id));
        writer.patch(id, ObjectPatch { hits: Some(Some(100)), ..Default::default() });
        let (patches, _, inserts) = writer.into_parts();
        assert!(patches.is_empty());
        assert_eq!(inserts[0].hits, Some(100));
    }

    #[test]
    fn test_global_merge_is_idempotent_per_id() {
        let id = ObjectId::derive(1, "n", 0);
        let room = RoomName::new(3, 3);
        let mut a = GlobalWriter::new();
        a.upsert(room, road(id));
        let mut b = GlobalWriter::new();
        b.upsert(room, road(id));
        let mut merged = a.into_effects();
        merged.merge(b.into_effects());
        assert_eq!(merged.upserts.len(), 1);
    }
}
