//! Single-room tick throughput on a busy harvesting room

use criterion::{criterion_group, criterion_main, Criterion};

use deepwarren::core::config::EngineConfig;
use deepwarren::core::types::{ObjectId, Position, RoomName, UserId};
use deepwarren::intents::record::{Intent, IntentBatch};
use deepwarren::simulation::tick::process_room_tick;
use deepwarren::state::object::{ObjectKind, PartType, ResourceType, RoomObject};
use deepwarren::state::room::{RoomSnapshot, UserRecord};
use deepwarren::state::terrain::RoomTerrain;

fn busy_room() -> RoomSnapshot {
    let room = RoomName::new(0, 0);
    let alice = UserId::new("alice");
    let mut objects = Vec::new();
    let mut intents = IntentBatch::default();

    for i in 0..4u64 {
        let source_id = ObjectId::derive(0, "source", i);
        objects.push(
            RoomObject::new(source_id, ObjectKind::Source, Position::new(10 + 10 * i as u8, 10), room)
                .with_store(ResourceType::Energy, 3000)
                .with_capacity(3000),
        );
        // a ring of harvesters around each source
        for j in 0..25u64 {
            let creep_id = ObjectId::derive(0, "creep", i * 100 + j);
            objects.push(
                RoomObject::new(
                    creep_id,
                    ObjectKind::Creep,
                    Position::new(10 + 10 * i as u8, 11),
                    room,
                )
                .with_owner(alice.clone())
                .with_body(&[PartType::Work, PartType::Work, PartType::Carry, PartType::Move])
                .with_capacity(50),
            );
            intents.push(&alice, creep_id, Intent::Harvest { target: source_id });
        }
    }

    let users = vec![UserRecord {
        id: alice,
        username: "alice".into(),
        gcl: 1,
        power: 0,
        npc: false,
    }];
    RoomSnapshot::new(room, 100, objects, RoomTerrain::open(), users, intents)
}

fn bench_room_tick(c: &mut Criterion) {
    let snapshot = busy_room();
    let config = EngineConfig::default();
    c.bench_function("room_tick_100_harvesters", |b| {
        b.iter(|| process_room_tick(&snapshot, &config))
    });
}

criterion_group!(benches, bench_room_tick);
criterion_main!(benches);
