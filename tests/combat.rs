//! Combat: melee, ranged falloff, rampart absorption, death processing

mod common;

use common::*;
use deepwarren::core::types::Position;
use deepwarren::intents::record::{Intent, IntentBatch};
use deepwarren::state::object::{ObjectKind, PartType, ResourceType, RoomObject};

fn fighter(creep_id: deepwarren::core::types::ObjectId, parts: &[PartType], pos: Position) -> RoomObject {
    RoomObject::new(creep_id, ObjectKind::Creep, pos, ROOM)
        .with_owner(alice())
        .with_body(parts)
}

#[test]
fn single_attack_part_deals_thirty() {
    let attacker_id = id("creep", 1);
    let victim_id = id("creep", 2);
    let mut intents = IntentBatch::default();
    intents.push(&alice(), attacker_id, Intent::Attack { target: victim_id });
    let snap = snapshot(
        10,
        vec![
            fighter(attacker_id, &[PartType::Attack, PartType::Move], Position::new(10, 10)),
            worker(victim_id, &bob(), Position::new(10, 11)),
        ],
        intents,
    );
    let outcome = run(&snap);

    let victim_patch = patch_for(&outcome, victim_id).unwrap();
    assert_eq!(victim_patch.hits, Some(Some(370)));
}

#[test]
fn ranged_attack_falls_off_with_range() {
    let attacker_id = id("creep", 1);
    let victim_id = id("creep", 2);
    let mut intents = IntentBatch::default();
    intents.push(&alice(), attacker_id, Intent::RangedAttack { target: victim_id });
    let snap = snapshot(
        10,
        vec![
            fighter(attacker_id, &[PartType::RangedAttack, PartType::Move], Position::new(10, 10)),
            worker(victim_id, &bob(), Position::new(10, 12)),
        ],
        intents,
    );
    let outcome = run(&snap);

    // range 2: 10 * 4/10 = 4
    let victim_patch = patch_for(&outcome, victim_id).unwrap();
    assert_eq!(victim_patch.hits, Some(Some(396)));
}

#[test]
fn rampart_absorbs_before_the_creep_underneath() {
    let attacker_id = id("creep", 1);
    let victim_id = id("creep", 2);
    let rampart_id = id("rampart", 1);
    let rampart = RoomObject::new(rampart_id, ObjectKind::Rampart, Position::new(10, 11), ROOM)
        .with_owner(bob())
        .with_hits(20, 300_000);
    let mut intents = IntentBatch::default();
    intents.push(&alice(), attacker_id, Intent::Attack { target: victim_id });
    let snap = snapshot(
        10,
        vec![
            fighter(attacker_id, &[PartType::Attack, PartType::Move], Position::new(10, 10)),
            worker(victim_id, &bob(), Position::new(10, 11)),
            rampart,
        ],
        intents,
    );
    let outcome = run(&snap);

    // the rampart soaks its 20 hits and dies; 10 damage reaches the creep
    assert!(outcome.removals.contains(&rampart_id));
    let victim_patch = patch_for(&outcome, victim_id).unwrap();
    assert_eq!(victim_patch.hits, Some(Some(390)));
}

#[test]
fn lethal_damage_leaves_a_tombstone_with_refund() {
    let attacker_id = id("creep", 1);
    let victim_id = id("creep", 2);
    let body = [PartType::Attack, PartType::Attack, PartType::Attack, PartType::Attack, PartType::Move];
    let mut intents = IntentBatch::default();
    intents.push(&alice(), attacker_id, Intent::Attack { target: victim_id });
    let snap = snapshot(
        10,
        vec![
            fighter(attacker_id, &body, Position::new(10, 10)),
            fighter(victim_id, &[PartType::Move], Position::new(10, 11)).with_owner(bob()),
        ],
        intents,
    );
    let outcome = run(&snap);

    assert!(outcome.removals.contains(&victim_id));
    let tombstone = outcome
        .inserts
        .iter()
        .find(|o| o.kind == ObjectKind::Tombstone)
        .unwrap();
    assert_eq!(tombstone.pos, Position::new(10, 11));
    assert_eq!(tombstone.owner, Some(bob()));
    // floor(0.2 x 50 body cost)
    assert_eq!(tombstone.store.get(ResourceType::Energy), 10);
    assert_eq!(tombstone.decay_time, Some(15));
    assert_eq!(outcome.stats.users[&bob()].creeps_lost, 1);
}

#[test]
fn heal_restores_front_parts_first() {
    let healer_id = id("creep", 1);
    let hurt_id = id("creep", 2);
    let mut hurt = worker(hurt_id, &alice(), Position::new(10, 11));
    hurt.body[0].hits = 50;
    hurt.hits = Some(350);
    let mut intents = IntentBatch::default();
    intents.push(&alice(), healer_id, Intent::Heal { target: hurt_id });
    let snap = snapshot(
        10,
        vec![
            fighter(healer_id, &[PartType::Heal, PartType::Move], Position::new(10, 10)),
            hurt,
        ],
        intents,
    );
    let outcome = run(&snap);

    let hurt_patch = patch_for(&outcome, hurt_id).unwrap();
    assert_eq!(hurt_patch.hits, Some(Some(362)));
}
