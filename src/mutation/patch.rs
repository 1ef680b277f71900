//! Sparse object patches
//!
//! A patch carries one `Option` per mutable field; only present fields
//! represent a change. Combining two patches for the same object is a pure
//! field-wise combinator: a present field wins over an absent one, and the
//! later patch wins ties. The cosmetic action log rides along as a sub-patch
//! that never affects gameplay state.

use serde::{Deserialize, Serialize};

use crate::core::types::{ObjectId, Position, Tick, UserId};
use crate::state::object::{
    BodyPart, Effect, NpcMemory, Reservation, RoomObject, SpawningState, Store,
};

/// Cosmetic action-log sub-patch: what a client needs to animate the tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLog {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub say: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub attacked: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub healed: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub harvested: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub built: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub repaired: Option<u32>,
}

impl ActionLog {
    pub fn is_empty(&self) -> bool {
        *self == ActionLog::default()
    }

    fn merge(&mut self, other: &ActionLog) {
        if other.say.is_some() {
            self.say = other.say.clone();
        }
        if other.attacked.is_some() {
            self.attacked = other.attacked;
        }
        if other.healed.is_some() {
            self.healed = other.healed;
        }
        if other.harvested.is_some() {
            self.harvested = other.harvested;
        }
        if other.built.is_some() {
            self.built = other.built;
        }
        if other.repaired.is_some() {
            self.repaired = other.repaired;
        }
    }
}

/// Every patch field mirrors a mutable `RoomObject` field wrapped in one
/// more `Option`; the inner type keeps the field's own optionality so a
/// patch can clear a timer or a spawning descriptor.
macro_rules! for_each_field {
    ($m:ident) => {
        $m!(pos);
        $m!(owner);
        $m!(hits);
        $m!(hits_max);
        $m!(store);
        $m!(store_capacity);
        $m!(body);
        $m!(fatigue);
        $m!(is_spawning);
        $m!(age_time);
        $m!(spawning);
        $m!(cooldown_time);
        $m!(next_regeneration_time);
        $m!(next_decay_time);
        $m!(decay_time);
        $m!(amount);
        $m!(density);
        $m!(level);
        $m!(progress);
        $m!(downgrade_time);
        $m!(reservation);
        $m!(safe_mode);
        $m!(safe_mode_available);
        $m!(safe_mode_cooldown);
        $m!(upgrade_blocked);
        $m!(effects);
        $m!(npc_memory);
    };
}

/// Sparse set of field changes for one object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPatch {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pos: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner: Option<Option<UserId>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hits: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hits_max: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub store: Option<Store>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub store_capacity: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub body: Option<Vec<BodyPart>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fatigue: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub is_spawning: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub age_time: Option<Option<Tick>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub spawning: Option<Option<SpawningState>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cooldown_time: Option<Option<Tick>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next_regeneration_time: Option<Option<Tick>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next_decay_time: Option<Option<Tick>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub decay_time: Option<Option<Tick>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub amount: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub density: Option<Option<u8>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub level: Option<Option<u8>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub progress: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub downgrade_time: Option<Option<Tick>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reservation: Option<Option<Reservation>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub safe_mode: Option<Option<Tick>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub safe_mode_available: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub safe_mode_cooldown: Option<Option<Tick>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub upgrade_blocked: Option<Option<Tick>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub effects: Option<Vec<Effect>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub npc_memory: Option<Option<NpcMemory>>,
    #[serde(skip_serializing_if = "ActionLog::is_empty", default)]
    pub action_log: ActionLog,
}

impl ObjectPatch {
    pub fn is_empty(&self) -> bool {
        *self == ObjectPatch::default()
    }

    /// Sparse difference `before -> after`: only changed fields present
    pub fn diff(before: &RoomObject, after: &RoomObject) -> ObjectPatch {
        let mut patch = ObjectPatch::default();
        macro_rules! diff_field {
            ($f:ident) => {
                if before.$f != after.$f {
                    patch.$f = Some(after.$f.clone());
                }
            };
        }
        for_each_field!(diff_field);
        patch
    }

    /// Field-wise merge: present fields of `other` win
    pub fn merge(&mut self, other: &ObjectPatch) {
        macro_rules! merge_field {
            ($f:ident) => {
                if other.$f.is_some() {
                    self.$f = other.$f.clone();
                }
            };
        }
        for_each_field!(merge_field);
        self.action_log.merge(&other.action_log);
    }

    /// Apply every present field to an object (the persistence side of the
    /// contract; also used to roll snapshots forward in tests and the CLI)
    pub fn apply_to(&self, obj: &mut RoomObject) {
        macro_rules! apply_field {
            ($f:ident) => {
                if let Some(v) = &self.$f {
                    obj.$f = v.clone();
                }
            };
        }
        for_each_field!(apply_field);
    }

    /// Convenience: a patch carrying only an action-log entry
    pub fn log(action_log: ActionLog) -> ObjectPatch {
        ObjectPatch { action_log, ..Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ObjectId, RoomName};
    use crate::state::object::{ObjectKind, ResourceType};
    use proptest::prelude::*;

    fn object() -> RoomObject {
        RoomObject::new(
            ObjectId::derive(7, "patch", 0),
            ObjectKind::Creep,
            Position::new(10, 10),
            RoomName::new(0, 0),
        )
        .with_hits(100, 100)
        .with_store(ResourceType::Energy, 25)
    }

    #[test]
    fn test_diff_only_changed_fields() {
        let before = object();
        let mut after = before.clone();
        after.hits = Some(70);
        after.fatigue = 4;
        let patch = ObjectPatch::diff(&before, &after);
        assert_eq!(patch.hits, Some(Some(70)));
        assert_eq!(patch.fatigue, Some(4));
        assert!(patch.store.is_none());
        assert!(patch.pos.is_none());
    }

    #[test]
    fn test_diff_then_apply_roundtrips() {
        let before = object();
        let mut after = before.clone();
        after.pos = Position::new(11, 10);
        after.store.remove(ResourceType::Energy, 10);
        after.age_time = Some(1600);
        let patch = ObjectPatch::diff(&before, &after);
        let mut replayed = before.clone();
        patch.apply_to(&mut replayed);
        assert_eq!(replayed, after);
    }

    #[test]
    fn test_merge_later_wins_ties() {
        let mut a = ObjectPatch { hits: Some(Some(50)), ..Default::default() };
        let b = ObjectPatch { hits: Some(Some(30)), fatigue: Some(2), ..Default::default() };
        a.merge(&b);
        assert_eq!(a.hits, Some(Some(30)));
        assert_eq!(a.fatigue, Some(2));
    }

    #[test]
    fn test_merge_can_clear_optional_field() {
        let mut a = ObjectPatch::default();
        let b = ObjectPatch { spawning: Some(None), ..Default::default() };
        a.merge(&b);
        let mut obj = object();
        obj.spawning = Some(SpawningState {
            creep: ObjectId::derive(1, "c", 0),
            need_time: 103,
            directions: None,
        });
        a.apply_to(&mut obj);
        assert!(obj.spawning.is_none());
    }

    fn arb_patch() -> impl Strategy<Value = ObjectPatch> {
        (
            proptest::option::of(0u32..200),
            proptest::option::of(0u32..20),
            proptest::option::of(0u32..500),
            proptest::option::of(".{0,8}"),
        )
            .prop_map(|(hits, fatigue, progress, say)| ObjectPatch {
                hits: hits.map(Some),
                fatigue,
                progress: progress.map(Some),
                action_log: ActionLog { say, ..Default::default() },
                ..Default::default()
            })
    }

    proptest! {
        #[test]
        fn prop_merge_identity(p in arb_patch()) {
            let mut merged = p.clone();
            merged.merge(&ObjectPatch::default());
            prop_assert_eq!(&merged, &p);
            let mut merged = ObjectPatch::default();
            merged.merge(&p);
            prop_assert_eq!(&merged, &p);
        }

        #[test]
        fn prop_merge_associative(a in arb_patch(), b in arb_patch(), c in arb_patch()) {
            let mut left = a.clone();
            left.merge(&b);
            left.merge(&c);
            let mut bc = b.clone();
            bc.merge(&c);
            let mut right = a.clone();
            right.merge(&bc);
            prop_assert_eq!(left, right);
        }

        #[test]
        fn prop_merge_right_biased(a in arb_patch(), b in arb_patch()) {
            let mut merged = a.clone();
            merged.merge(&b);
            if let Some(h) = b.hits {
                prop_assert_eq!(merged.hits, Some(h));
            }
        }
    }
}
