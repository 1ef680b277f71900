//! Spawn lifecycle: create, place, renew, recycle, cancel, suicide

mod common;

use common::*;
use deepwarren::core::types::{Direction, Position};
use deepwarren::intents::record::{Intent, IntentBatch, SpawnCreateIntent};
use deepwarren::simulation::tick::apply_outcome;
use deepwarren::state::object::{
    ObjectKind, PartType, ResourceType, RoomObject, SpawningState, Store,
};
use deepwarren::state::room::RoomSnapshot;
use deepwarren::state::terrain::RoomTerrain;

fn spawn_structure(spawn_id: deepwarren::core::types::ObjectId, energy: u32) -> RoomObject {
    RoomObject::new(spawn_id, ObjectKind::Spawn, Position::new(25, 25), ROOM)
        .with_owner(alice())
        .with_capacity(300)
        .with_store(ResourceType::Energy, energy)
}

#[test]
fn spawning_charges_energy_then_places_the_creep() {
    let spawn_id = id("spawn", 1);
    let mut intents = IntentBatch::default();
    intents.push_spawn_create(
        &alice(),
        SpawnCreateIntent {
            spawn: spawn_id,
            creep_name: "w1".into(),
            body: vec![PartType::Work, PartType::Carry, PartType::Move],
            directions: None,
            energy_structures: None,
        },
    );
    let mut snap = snapshot(10, vec![spawn_structure(spawn_id, 300)], intents);
    let first = run(&snap);

    // 200 energy charged up front, placeholder parked on the spawn tile
    let spawn_patch = patch_for(&first, spawn_id).unwrap();
    assert_eq!(spawn_patch.store.as_ref().unwrap(), &Store::of(ResourceType::Energy, 100));
    let placeholder = first.inserts.iter().find(|o| o.kind == ObjectKind::Creep).unwrap();
    let creep_id = placeholder.id;
    assert!(placeholder.is_spawning);
    assert_eq!(placeholder.pos, Position::new(25, 25));
    assert_eq!(placeholder.hits, Some(300));
    assert_eq!(placeholder.store_capacity, Some(50));
    assert_eq!(first.stats.users[&alice()].energy_spawn, 200);

    // 3 parts x 3 ticks: busy until tick 19, placed on tick 19's outcome
    snap = apply_outcome(&snap, &first);
    for _ in 0..9 {
        let outcome = run(&snap);
        snap = apply_outcome(&snap, &outcome);
    }
    assert_eq!(snap.game_time, 20);
    let creep = snap.get(creep_id).unwrap();
    assert!(!creep.is_spawning);
    assert!(creep.pos.is_adjacent(&Position::new(25, 25)));
    assert_eq!(creep.age_time, Some(19 + 1500));
    assert!(snap.get(spawn_id).unwrap().spawning.is_none());
}

#[test]
fn renew_extends_lifetime_and_charges_the_spawn() {
    let spawn_id = id("spawn", 1);
    let creep_id = id("creep", 1);
    let mut creep = RoomObject::new(creep_id, ObjectKind::Creep, Position::new(25, 24), ROOM)
        .with_owner(alice())
        .with_body(&[PartType::Work, PartType::Carry, PartType::Move])
        .with_capacity(50);
    creep.age_time = Some(510);
    let mut intents = IntentBatch::default();
    intents.push(&alice(), spawn_id, Intent::RenewCreep { target: creep_id });
    let snap = snapshot(10, vec![spawn_structure(spawn_id, 300), creep], intents);
    let outcome = run(&snap);

    // gained = floor(1500 * 1.2 / 3 / 3) = 200; cost = ceil(1.2 * 200 / 3 / 3) = 27
    let creep_patch = patch_for(&outcome, creep_id).unwrap();
    assert_eq!(creep_patch.age_time, Some(Some(710)));
    let spawn_patch = patch_for(&outcome, spawn_id).unwrap();
    assert_eq!(spawn_patch.store.as_ref().unwrap().get(ResourceType::Energy), 273);
}

#[test]
fn recycle_refunds_the_full_body_cost() {
    let spawn_id = id("spawn", 1);
    let creep_id = id("creep", 1);
    let creep = RoomObject::new(creep_id, ObjectKind::Creep, Position::new(25, 24), ROOM)
        .with_owner(alice())
        .with_body(&[PartType::Work, PartType::Carry, PartType::Move])
        .with_capacity(50);
    let mut intents = IntentBatch::default();
    intents.push(&alice(), spawn_id, Intent::RecycleCreep { target: creep_id });
    let snap = snapshot(10, vec![spawn_structure(spawn_id, 300), creep], intents);
    let outcome = run(&snap);

    assert!(outcome.removals.contains(&creep_id));
    let tombstone = outcome.inserts.iter().find(|o| o.kind == ObjectKind::Tombstone).unwrap();
    assert_eq!(tombstone.store.get(ResourceType::Energy), 200);
}

#[test]
fn cancel_spawning_discards_the_placeholder_without_refund() {
    let spawn_id = id("spawn", 1);
    let placeholder_id = id("creep", 1);
    let mut spawn = spawn_structure(spawn_id, 100);
    spawn.spawning = Some(SpawningState { creep: placeholder_id, need_time: 50, directions: None });
    let mut placeholder =
        RoomObject::new(placeholder_id, ObjectKind::Creep, Position::new(25, 25), ROOM)
            .with_owner(alice())
            .with_body(&[PartType::Work, PartType::Carry, PartType::Move]);
    placeholder.is_spawning = true;
    let mut intents = IntentBatch::default();
    intents.push(&alice(), spawn_id, Intent::CancelSpawning);
    let snap = snapshot(10, vec![spawn, placeholder], intents);
    let outcome = run(&snap);

    assert!(outcome.removals.contains(&placeholder_id));
    // no tombstone and no energy back
    assert!(outcome.inserts.is_empty());
    let spawn_patch = patch_for(&outcome, spawn_id).unwrap();
    assert_eq!(spawn_patch.spawning, Some(None));
}

#[test]
fn walled_in_spawn_stomps_the_lone_hostile_blocker() {
    let spawn_id = id("spawn", 1);
    let placeholder_id = id("creep", 1);
    let hostile_id = id("creep", 2);
    let mut spawn = spawn_structure(spawn_id, 0);
    spawn.spawning =
        Some(SpawningState { creep: placeholder_id, need_time: 10, directions: None });
    let mut placeholder =
        RoomObject::new(placeholder_id, ObjectKind::Creep, Position::new(25, 25), ROOM)
            .with_owner(alice())
            .with_body(&[PartType::Move]);
    placeholder.is_spawning = true;
    let hostile = worker(hostile_id, &bob(), Position::new(26, 25));
    // wall in every neighbor except the hostile's tile
    let mut terrain = RoomTerrain::open();
    for (x, y) in [(24, 24), (25, 24), (26, 24), (24, 25), (24, 26), (25, 26), (26, 26)] {
        terrain.set_wall(Position::new(x, y));
    }
    let snap = RoomSnapshot::new(
        ROOM,
        10,
        vec![spawn, placeholder, hostile],
        terrain,
        vec![player("alice"), player("bob")],
        IntentBatch::default(),
    );
    let outcome = run(&snap);

    assert!(outcome.removals.contains(&hostile_id));
    let tombstone = outcome.inserts.iter().find(|o| o.kind == ObjectKind::Tombstone).unwrap();
    assert_eq!(tombstone.pos, Position::new(26, 25));
    assert_eq!(tombstone.owner, Some(bob()));
    let placed = patch_for(&outcome, placeholder_id).unwrap();
    assert_eq!(placed.pos, Some(Position::new(26, 25)));
    assert_eq!(placed.is_spawning, Some(false));
    assert_eq!(placed.age_time, Some(Some(1510)));
    assert_eq!(patch_for(&outcome, spawn_id).unwrap().spawning, Some(None));
}

#[test]
fn open_tile_outside_the_preferred_scan_defers_instead_of_stomping() {
    let spawn_id = id("spawn", 1);
    let placeholder_id = id("creep", 1);
    let hostile_id = id("creep", 2);
    let mut spawn = spawn_structure(spawn_id, 0);
    spawn.spawning = Some(SpawningState {
        creep: placeholder_id,
        need_time: 10,
        directions: Some(vec![Direction::Right]),
    });
    let mut placeholder =
        RoomObject::new(placeholder_id, ObjectKind::Creep, Position::new(25, 25), ROOM)
            .with_owner(alice())
            .with_body(&[PartType::Move]);
    placeholder.is_spawning = true;
    // the preferred tile is held by a hostile, but (24, 25) is still open
    let hostile = worker(hostile_id, &bob(), Position::new(26, 25));
    let snap = snapshot(10, vec![spawn, placeholder, hostile], IntentBatch::default());
    let outcome = run(&snap);

    assert!(outcome.removals.is_empty());
    assert!(patch_for(&outcome, placeholder_id).is_none());
    assert!(patch_for(&outcome, spawn_id).is_none());
}

#[test]
fn suicide_leaves_a_partial_refund_tombstone() {
    let creep_id = id("creep", 1);
    let creep = RoomObject::new(creep_id, ObjectKind::Creep, Position::new(10, 10), ROOM)
        .with_owner(alice())
        .with_body(&[PartType::Work, PartType::Carry, PartType::Move])
        .with_capacity(50);
    let mut intents = IntentBatch::default();
    intents.push(&alice(), creep_id, Intent::Suicide);
    let snap = snapshot(10, vec![creep], intents);
    let outcome = run(&snap);

    assert!(outcome.removals.contains(&creep_id));
    let tombstone = outcome.inserts.iter().find(|o| o.kind == ObjectKind::Tombstone).unwrap();
    // floor(0.2 x 200)
    assert_eq!(tombstone.store.get(ResourceType::Energy), 40);
}
