//! Step-local ledger
//!
//! Several intents often hit the same object in one step (two creeps
//! harvesting one source, three building one site). The ledger accumulates
//! their combined effect on a mutable clone of the pre-tick value, seeded on
//! first touch, then flushes one consolidated sparse patch per object. A
//! ledger lives and dies inside a single step; it is never read by another.

use ahash::AHashMap;

use crate::core::types::ObjectId;
use crate::mutation::patch::ObjectPatch;
use crate::mutation::writer::RoomWriter;
use crate::state::object::RoomObject;
use crate::state::room::RoomSnapshot;

pub struct Ledger<'a> {
    snapshot: &'a RoomSnapshot,
    touched: AHashMap<ObjectId, RoomObject>,
}

impl<'a> Ledger<'a> {
    pub fn new(snapshot: &'a RoomSnapshot) -> Self {
        Self { snapshot, touched: AHashMap::new() }
    }

    /// Mutable working copy, cloned from the pre-tick snapshot on first
    /// touch. None if the object does not exist or an earlier step removed
    /// it. Patches other steps staged are never consulted: cross-step
    /// dependency goes through the removal marker only, and conflicting
    /// field writes resolve by the writer's later-wins merge.
    pub fn get_mut(&mut self, id: ObjectId, writer: &RoomWriter) -> Option<&mut RoomObject> {
        if writer.is_removed(id) {
            return None;
        }
        if !self.touched.contains_key(&id) {
            let working = self.snapshot.get(id)?.clone();
            self.touched.insert(id, working);
        }
        self.touched.get_mut(&id)
    }

    /// Read-only view of the working copy, without touching
    pub fn get(&self, id: ObjectId) -> Option<&RoomObject> {
        self.touched.get(&id).or_else(|| self.snapshot.get(id))
    }

    /// Forget a touched object without emitting a patch (the object died
    /// and its removal supersedes any field changes)
    pub fn discard(&mut self, id: ObjectId) {
        self.touched.remove(&id);
    }

    /// Emit one consolidated sparse patch per touched object, sorted by id
    pub fn flush(self, writer: &mut RoomWriter) {
        let mut ids: Vec<ObjectId> = self.touched.keys().copied().collect();
        ids.sort();
        for id in ids {
            let after = &self.touched[&id];
            let Some(before) = self.snapshot.get(id) else {
                continue;
            };
            let patch = ObjectPatch::diff(before, after);
            if !patch.is_empty() {
                writer.patch(id, patch);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Position, RoomName};
    use crate::intents::record::IntentBatch;
    use crate::state::object::{ObjectKind, ResourceType};
    use crate::state::terrain::RoomTerrain;

    fn snapshot() -> (RoomSnapshot, ObjectId) {
        let id = ObjectId::derive(5, "ledger", 0);
        let source = RoomObject::new(id, ObjectKind::Source, Position::new(4, 4), RoomName::new(0, 0))
            .with_store(ResourceType::Energy, 3000)
            .with_capacity(3000);
        let snap = RoomSnapshot::new(
            RoomName::new(0, 0),
            50,
            vec![source],
            RoomTerrain::open(),
            vec![],
            IntentBatch::default(),
        );
        (snap, id)
    }

    #[test]
    fn test_two_touches_one_patch() {
        let (snap, id) = snapshot();
        let mut writer = RoomWriter::new();
        let mut ledger = Ledger::new(&snap);
        ledger.get_mut(id, &writer).unwrap().store.remove(ResourceType::Energy, 4);
        ledger.get_mut(id, &writer).unwrap().store.remove(ResourceType::Energy, 6);
        ledger.flush(&mut writer);
        let (patches, _, _) = writer.into_parts();
        assert_eq!(patches.len(), 1);
        let store = patches[0].1.store.as_ref().unwrap();
        assert_eq!(store.get(ResourceType::Energy), 2990);
    }

    #[test]
    fn test_untouched_objects_emit_nothing() {
        let (snap, _) = snapshot();
        let mut writer = RoomWriter::new();
        let ledger = Ledger::new(&snap);
        ledger.flush(&mut writer);
        let (patches, _, _) = writer.into_parts();
        assert!(patches.is_empty());
    }

    #[test]
    fn test_working_copies_ignore_staged_patches() {
        let (snap, id) = snapshot();
        let mut writer = RoomWriter::new();
        writer.patch(
            id,
            ObjectPatch {
                store: Some(crate::state::object::Store::of(ResourceType::Energy, 7)),
                ..Default::default()
            },
        );
        let mut ledger = Ledger::new(&snap);
        // the clone comes from the snapshot, not the staged value
        assert_eq!(
            ledger.get_mut(id, &writer).unwrap().store.get(ResourceType::Energy),
            3000
        );
    }

    #[test]
    fn test_removed_object_not_touchable() {
        let (snap, id) = snapshot();
        let mut writer = RoomWriter::new();
        writer.remove(id);
        let mut ledger = Ledger::new(&snap);
        assert!(ledger.get_mut(id, &writer).is_none());
    }
}
