//! Structure mechanics: links, labs, factory, towers, power, controller,
//! nukes and scheduled decay

mod common;

use common::*;
use deepwarren::core::types::Position;
use deepwarren::intents::record::{Intent, IntentBatch};
use deepwarren::state::object::{ObjectKind, PartType, ResourceType, RoomObject, Store};

#[test]
fn link_transfer_loses_three_percent_in_transit() {
    let sender_id = id("link", 1);
    let receiver_id = id("link", 2);
    let sender = RoomObject::new(sender_id, ObjectKind::Link, Position::new(10, 10), ROOM)
        .with_owner(alice())
        .with_capacity(800)
        .with_store(ResourceType::Energy, 500);
    let receiver = RoomObject::new(receiver_id, ObjectKind::Link, Position::new(20, 10), ROOM)
        .with_owner(alice())
        .with_capacity(800)
        .with_store(ResourceType::Energy, 100);
    let mut intents = IntentBatch::default();
    intents.push(&alice(), sender_id, Intent::LinkTransferEnergy { target: receiver_id, amount: 400 });
    let snap = snapshot(10, vec![sender, receiver], intents);
    let outcome = run(&snap);

    // loss = ceil(400 * 0.03) = 12, all charged to the sender
    let sender_patch = patch_for(&outcome, sender_id).unwrap();
    assert_eq!(sender_patch.store.as_ref().unwrap().get(ResourceType::Energy), 100);
    assert_eq!(sender_patch.cooldown_time, Some(Some(20)));
    let receiver_patch = patch_for(&outcome, receiver_id).unwrap();
    assert_eq!(receiver_patch.store.as_ref().unwrap().get(ResourceType::Energy), 488);
}

#[test]
fn lab_reaction_consumes_reagents_and_cools_down() {
    let output_id = id("lab", 1);
    let lab1_id = id("lab", 2);
    let lab2_id = id("lab", 3);
    let output = RoomObject::new(output_id, ObjectKind::Lab, Position::new(10, 10), ROOM)
        .with_owner(alice())
        .with_capacity(3000);
    let lab1 = RoomObject::new(lab1_id, ObjectKind::Lab, Position::new(11, 10), ROOM)
        .with_owner(alice())
        .with_capacity(3000)
        .with_store(ResourceType::Hydrogen, 100);
    let lab2 = RoomObject::new(lab2_id, ObjectKind::Lab, Position::new(10, 11), ROOM)
        .with_owner(alice())
        .with_capacity(3000)
        .with_store(ResourceType::Oxygen, 100);
    let mut intents = IntentBatch::default();
    intents.push(&alice(), output_id, Intent::RunReaction { lab1: lab1_id, lab2: lab2_id });
    let snap = snapshot(10, vec![output, lab1, lab2], intents);
    let outcome = run(&snap);

    let output_patch = patch_for(&outcome, output_id).unwrap();
    assert_eq!(output_patch.store.as_ref().unwrap(), &Store::of(ResourceType::Hydroxide, 5));
    // hydroxide cooks for 20 ticks
    assert_eq!(output_patch.cooldown_time, Some(Some(30)));
    let lab1_patch = patch_for(&outcome, lab1_id).unwrap();
    assert_eq!(lab1_patch.store.as_ref().unwrap().get(ResourceType::Hydrogen), 95);
    let lab2_patch = patch_for(&outcome, lab2_id).unwrap();
    assert_eq!(lab2_patch.store.as_ref().unwrap().get(ResourceType::Oxygen), 95);
}

#[test]
fn boosting_marks_parts_and_drains_the_lab() {
    let lab_id = id("lab", 1);
    let creep_id = id("creep", 1);
    let lab = RoomObject::new(lab_id, ObjectKind::Lab, Position::new(10, 10), ROOM)
        .with_owner(alice())
        .with_capacity(3000)
        .with_store(ResourceType::UtriumOxide, 100)
        .with_store(ResourceType::Energy, 100);
    let creep = worker(creep_id, &alice(), Position::new(10, 11));
    let mut intents = IntentBatch::default();
    intents.push(&alice(), lab_id, Intent::BoostCreep { target: creep_id, parts_count: None });
    let snap = snapshot(10, vec![lab, creep], intents);
    let outcome = run(&snap);

    // both WORK parts boosted at 30 mineral + 20 energy each
    let creep_patch = patch_for(&outcome, creep_id).unwrap();
    let body = creep_patch.body.as_ref().unwrap();
    assert_eq!(body[0].boost, Some(ResourceType::UtriumOxide));
    assert_eq!(body[1].boost, Some(ResourceType::UtriumOxide));
    let lab_patch = patch_for(&outcome, lab_id).unwrap();
    assert_eq!(lab_patch.store.as_ref().unwrap().get(ResourceType::UtriumOxide), 40);
    assert_eq!(lab_patch.store.as_ref().unwrap().get(ResourceType::Energy), 60);
}

#[test]
fn factory_produces_batteries_atomically() {
    let factory_id = id("factory", 1);
    let factory = RoomObject::new(factory_id, ObjectKind::Factory, Position::new(10, 10), ROOM)
        .with_owner(alice())
        .with_capacity(50_000)
        .with_store(ResourceType::Energy, 600);
    let mut intents = IntentBatch::default();
    intents.push(&alice(), factory_id, Intent::FactoryProduce { product: ResourceType::Battery });
    let snap = snapshot(10, vec![factory], intents);
    let outcome = run(&snap);

    let patch = patch_for(&outcome, factory_id).unwrap();
    assert_eq!(patch.store.as_ref().unwrap(), &Store::of(ResourceType::Battery, 50));
    assert_eq!(patch.cooldown_time, Some(Some(20)));
}

#[test]
fn factory_with_short_components_takes_nothing() {
    let factory_id = id("factory", 1);
    let factory = RoomObject::new(factory_id, ObjectKind::Factory, Position::new(10, 10), ROOM)
        .with_owner(alice())
        .with_capacity(50_000)
        .with_store(ResourceType::Energy, 599);
    let mut intents = IntentBatch::default();
    intents.push(&alice(), factory_id, Intent::FactoryProduce { product: ResourceType::Battery });
    let snap = snapshot(10, vec![factory], intents);
    let outcome = run(&snap);

    assert!(patch_for(&outcome, factory_id).is_none());
}

#[test]
fn tower_damage_falls_off_past_optimal_range() {
    let tower_id = id("tower", 1);
    let victim_id = id("creep", 1);
    let tower = RoomObject::new(tower_id, ObjectKind::Tower, Position::new(10, 10), ROOM)
        .with_owner(alice())
        .with_capacity(1000)
        .with_store(ResourceType::Energy, 50);
    let body = vec![PartType::Tough; 20];
    let victim = RoomObject::new(victim_id, ObjectKind::Creep, Position::new(10, 20), ROOM)
        .with_owner(bob())
        .with_body(&body);
    let mut intents = IntentBatch::default();
    intents.push(&alice(), tower_id, Intent::TowerAttack { target: victim_id });
    let snap = snapshot(10, vec![tower, victim], intents);
    let outcome = run(&snap);

    // range 10: 600 * (1 - 0.75 * 5/15) = 450
    let victim_patch = patch_for(&outcome, victim_id).unwrap();
    assert_eq!(victim_patch.hits, Some(Some(1550)));
    let tower_patch = patch_for(&outcome, tower_id).unwrap();
    assert_eq!(tower_patch.store.as_ref().unwrap().get(ResourceType::Energy), 40);
}

#[test]
fn power_processing_credits_the_owner() {
    let spawn_id = id("powerspawn", 1);
    let power_spawn = RoomObject::new(spawn_id, ObjectKind::PowerSpawn, Position::new(10, 10), ROOM)
        .with_owner(alice())
        .with_capacity(5000)
        .with_store(ResourceType::Power, 5)
        .with_store(ResourceType::Energy, 200);
    let mut intents = IntentBatch::default();
    intents.push(&alice(), spawn_id, Intent::ProcessPower);
    let snap = snapshot(10, vec![power_spawn], intents);
    let outcome = run(&snap);

    let patch = patch_for(&outcome, spawn_id).unwrap();
    assert_eq!(patch.store.as_ref().unwrap().get(ResourceType::Power), 4);
    assert_eq!(patch.store.as_ref().unwrap().get(ResourceType::Energy), 150);
    assert_eq!(outcome.global.power[&alice()], 1);
    assert_eq!(outcome.stats.users[&alice()].power_processed, 1);
}

#[test]
fn claiming_a_neutral_controller_takes_ownership() {
    let creep_id = id("creep", 1);
    let controller_id = id("controller", 1);
    let claimer = RoomObject::new(creep_id, ObjectKind::Creep, Position::new(10, 10), ROOM)
        .with_owner(alice())
        .with_body(&[PartType::Claim, PartType::Move]);
    let controller =
        RoomObject::new(controller_id, ObjectKind::Controller, Position::new(10, 11), ROOM);
    let mut intents = IntentBatch::default();
    intents.push(&alice(), creep_id, Intent::ClaimController { target: controller_id });
    let snap = snapshot(10, vec![claimer, controller], intents);
    let outcome = run(&snap);

    let patch = patch_for(&outcome, controller_id).unwrap();
    assert_eq!(patch.owner, Some(Some(alice())));
    assert_eq!(patch.level, Some(Some(1)));
    assert_eq!(patch.progress, Some(Some(0)));
    assert_eq!(patch.downgrade_time, Some(Some(10 + 20_000)));
}

#[test]
fn reservation_grows_one_tick_per_claim_part() {
    let creep_id = id("creep", 1);
    let controller_id = id("controller", 1);
    let reserver = RoomObject::new(creep_id, ObjectKind::Creep, Position::new(10, 10), ROOM)
        .with_owner(alice())
        .with_body(&[PartType::Claim, PartType::Claim, PartType::Move]);
    let controller =
        RoomObject::new(controller_id, ObjectKind::Controller, Position::new(10, 11), ROOM);
    let mut intents = IntentBatch::default();
    intents.push(&alice(), creep_id, Intent::ReserveController { target: controller_id });
    let snap = snapshot(10, vec![reserver, controller], intents);
    let outcome = run(&snap);

    let patch = patch_for(&outcome, controller_id).unwrap();
    let reservation = patch.reservation.as_ref().unwrap().as_ref().unwrap();
    assert_eq!(reservation.user, alice());
    assert_eq!(reservation.end_time, 12);
}

#[test]
fn neglected_controller_drops_a_level_on_schedule() {
    let controller_id = id("controller", 1);
    let mut controller =
        RoomObject::new(controller_id, ObjectKind::Controller, Position::new(10, 11), ROOM);
    controller.owner = Some(alice());
    controller.level = Some(3);
    controller.progress = Some(40_000);
    controller.downgrade_time = Some(10);
    let snap = snapshot(10, vec![controller], IntentBatch::default());
    let outcome = run(&snap);

    let patch = patch_for(&outcome, controller_id).unwrap();
    assert_eq!(patch.level, Some(Some(2)));
    assert_eq!(patch.progress, Some(Some(0)));
    // half the new level's full downgrade window
    assert_eq!(patch.downgrade_time, Some(Some(10 + 5000)));
}

#[test]
fn road_decays_and_reschedules() {
    let road_id = id("road", 1);
    let mut road = RoomObject::new(road_id, ObjectKind::Road, Position::new(10, 10), ROOM)
        .with_hits(4000, 5000);
    road.next_decay_time = Some(10);
    let snap = snapshot(10, vec![road], IntentBatch::default());
    let outcome = run(&snap);

    let patch = patch_for(&outcome, road_id).unwrap();
    assert_eq!(patch.hits, Some(Some(3900)));
    assert_eq!(patch.next_decay_time, Some(Some(1010)));
}

#[test]
fn expired_tombstone_spills_its_store() {
    let tombstone_id = id("tombstone", 1);
    let mut tombstone =
        RoomObject::new(tombstone_id, ObjectKind::Tombstone, Position::new(10, 10), ROOM);
    tombstone.owner = Some(alice());
    tombstone.store = Store::of(ResourceType::Energy, 30);
    tombstone.decay_time = Some(10);
    let snap = snapshot(10, vec![tombstone], IntentBatch::default());
    let outcome = run(&snap);

    assert!(outcome.removals.contains(&tombstone_id));
    let pile = outcome.inserts.iter().find(|o| o.kind == ObjectKind::Resource).unwrap();
    assert_eq!(pile.resource_type, Some(ResourceType::Energy));
    assert_eq!(pile.amount, Some(30));
    assert_eq!(pile.pos, Position::new(10, 10));
}

#[test]
fn landing_nuke_wipes_creeps_and_hammers_structures() {
    let nuke_id = id("nuke", 1);
    let creep_id = id("creep", 1);
    let power_creep_id = id("powercreep", 1);
    let extension_id = id("extension", 1);
    let pile_id = id("pile", 1);
    let controller_id = id("controller", 1);
    let mut nuke = RoomObject::new(nuke_id, ObjectKind::Nuke, Position::new(25, 25), ROOM);
    nuke.owner = Some(bob());
    nuke.land_time = Some(10);
    let extension =
        RoomObject::new(extension_id, ObjectKind::Extension, Position::new(25, 25), ROOM)
            .with_owner(alice())
            .with_hits(1000, 1000);
    let mut pile = RoomObject::new(pile_id, ObjectKind::Resource, Position::new(30, 30), ROOM);
    pile.resource_type = Some(ResourceType::Energy);
    pile.amount = Some(500);
    let mut controller =
        RoomObject::new(controller_id, ObjectKind::Controller, Position::new(40, 40), ROOM);
    controller.owner = Some(alice());
    controller.level = Some(4);
    controller.safe_mode = Some(50_000);
    let power_creep =
        RoomObject::new(power_creep_id, ObjectKind::PowerCreep, Position::new(14, 14), ROOM)
            .with_owner(alice())
            .with_hits(1000, 1000);
    let snap = snapshot(
        10,
        vec![
            nuke,
            worker(creep_id, &alice(), Position::new(12, 12)),
            power_creep,
            extension,
            pile,
            controller,
        ],
        IntentBatch::default(),
    );
    let outcome = run(&snap);

    // creeps and debris go without tombstones
    assert!(outcome.removals.contains(&creep_id));
    // power creeps persist at zero hits instead of being removed
    assert!(!outcome.removals.contains(&power_creep_id));
    assert_eq!(patch_for(&outcome, power_creep_id).unwrap().hits, Some(Some(0)));
    assert!(outcome.removals.contains(&pile_id));
    assert!(outcome.removals.contains(&nuke_id));
    assert!(!outcome.inserts.iter().any(|o| o.kind == ObjectKind::Tombstone));
    // the extension under the center blast is flattened
    assert!(outcome.removals.contains(&extension_id));
    let controller_patch = patch_for(&outcome, controller_id).unwrap();
    assert_eq!(controller_patch.upgrade_blocked, Some(Some(10 + 200)));
    assert_eq!(controller_patch.safe_mode, Some(None));
}
