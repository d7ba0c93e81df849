//! # World Integration Tests
//!
//! Covers what the per-module unit tests cannot see on their own:
//!
//! 1. **Entity recycling** through the world, including component cleanup
//! 2. **Command buffers** replayed after iteration
//! 3. **Concurrency**: per-type locking, writers waiting on live queries,
//!    and deletes racing attaches on the same ids
//!
//! Run with: cargo test -p strata_ecs --test world_tests -- --nocapture

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use strata_ecs::{CommandBuffer, CommandStats, EcsError, Entity, World};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Health(u32);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Burning;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Score(u64);

// ============================================================================
// ENTITY RECYCLING
// ============================================================================

#[test]
fn tail_delete_reissues_same_id() {
    let world = World::new();
    let _a = world.new_entity();
    let b = world.new_entity();

    world.delete_entity(b).unwrap();
    assert_eq!(world.new_entity(), b);
}

#[test]
fn inner_delete_is_lifo_then_counter() {
    let world = World::new();
    let entities: Vec<Entity> = (0..5).map(|_| world.new_entity()).collect();

    world.delete_entity(entities[1]).unwrap();
    world.delete_entity(entities[3]).unwrap();

    assert_eq!(world.new_entity(), entities[3]);
    assert_eq!(world.new_entity(), entities[1]);
    assert_eq!(world.new_entity(), Entity::from_raw(5));
}

#[test]
fn double_delete_never_duplicates_ids() {
    let _ = tracing_subscriber::fmt::try_init();

    let world = World::new();
    let entities: Vec<Entity> = (0..4).map(|_| world.new_entity()).collect();

    world.delete_entity(entities[2]).unwrap();
    assert_eq!(
        world.delete_entity(entities[2]),
        Err(EcsError::EntityNotAlive(entities[2]))
    );
    world.delete_entity(entities[3]).unwrap();
    assert!(world.delete_entity(entities[3]).is_err());

    let mut issued: Vec<Entity> = (0..4).map(|_| world.new_entity()).collect();
    issued.sort();
    issued.dedup();
    assert_eq!(issued.len(), 4);
    assert_eq!(world.entity_count(), 6);
}

// ============================================================================
// COMMAND BUFFERS
// ============================================================================

#[test]
fn deferred_changes_apply_after_iteration() {
    let world = World::new();
    let commands = CommandBuffer::new();

    let entities: Vec<Entity> = (0..6).map(|_| world.new_entity()).collect();
    for (i, &entity) in entities.iter().enumerate() {
        world.attach_component(entity, Health(i as u32 * 10)).unwrap();
        world.attach_component(entity, Burning).unwrap();
    }

    {
        let query = world.get_query::<(Health, Burning)>();
        for element in &query {
            let (health, _) = element.components();
            if health.0 == 0 {
                commands.delete_entity(element.entity());
            } else if health.0 < 30 {
                commands.detach::<Burning>(element.entity());
                commands.attach(element.entity(), Score(u64::from(health.0)));
            }
        }
        // Nothing has happened yet.
        assert_eq!(query.len(), 6);
    }

    let stats = world.execute_command_buffer(&commands);
    assert_eq!(
        stats,
        CommandStats {
            applied: 5,
            skipped: 0
        }
    );
    assert!(commands.is_empty());

    assert!(!world.is_alive(entities[0]));
    let burning = world.get_query::<(Health, Burning)>();
    assert_eq!(burning.entities(), &entities[3..]);
    let scored = world.get_query::<(Score,)>();
    assert_eq!(scored.entities(), &entities[1..3]);
}

#[test]
fn replay_keeps_recorded_order() {
    let world = World::new();
    let entity = world.new_entity();
    let commands = CommandBuffer::new();

    commands.attach(entity, Health(1));
    commands.detach::<Health>(entity);
    commands.attach(entity, Health(2));

    let stats = commands.run(&world);
    assert_eq!(stats.applied, 3);
    assert_eq!(*world.get_component::<Health>(entity).unwrap(), Health(2));
}

#[test]
fn stale_commands_are_skipped() {
    let world = World::new();
    let entity = world.new_entity();
    world.attach_component(entity, Health(1)).unwrap();
    let commands = CommandBuffer::new();

    commands.attach(entity, Health(99));
    commands.detach::<Burning>(entity);
    commands.delete_entity(entity);
    commands.delete_entity(entity);
    commands.attach_with(entity, || Score(1));

    let stats = world.execute_command_buffer(&commands);
    assert_eq!(stats.applied, 1);
    assert_eq!(stats.skipped, 4);
    assert_eq!(stats.total(), 5);
    assert_eq!(world.component_count::<Health>(), 0);
    assert_eq!(world.component_count::<Score>(), 0);
}

#[test]
fn many_threads_record_into_one_buffer() {
    let world = World::new();
    let commands = CommandBuffer::new();
    let entities: Vec<Entity> = (0..400).map(|_| world.new_entity()).collect();

    thread::scope(|scope| {
        for chunk in entities.chunks(100) {
            let commands = &commands;
            scope.spawn(move || {
                for &entity in chunk {
                    commands.attach(entity, Score(entity.raw()));
                }
            });
        }
    });

    assert_eq!(commands.len(), 400);
    let stats = world.execute_command_buffer(&commands);
    assert_eq!(stats.applied, 400);

    let query = world.get_query::<(Score,)>();
    assert_eq!(query.entities(), entities.as_slice());
    for element in &query {
        assert_eq!(element.components().0 .0, element.entity().raw());
    }
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn writer_waits_for_live_query() {
    let world = Arc::new(World::new());
    let entity = world.new_entity();
    world.attach_component(entity, Health(5)).unwrap();

    let query = world.get_query::<(Health,)>();
    let attached = Arc::new(AtomicBool::new(false));

    let writer = {
        let world = Arc::clone(&world);
        let attached = Arc::clone(&attached);
        thread::spawn(move || {
            let other = world.new_entity();
            world.attach_component(other, Health(6)).unwrap();
            attached.store(true, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!attached.load(Ordering::SeqCst));
    assert_eq!(query.len(), 1);

    drop(query);
    writer.join().unwrap();
    assert!(attached.load(Ordering::SeqCst));
    assert_eq!(world.get_query::<(Health,)>().len(), 2);
}

#[test]
fn distinct_types_mutate_in_parallel() {
    let world = World::new();
    let entities: Vec<Entity> = (0..1_000).map(|_| world.new_entity()).collect();

    thread::scope(|scope| {
        scope.spawn(|| {
            for &entity in &entities {
                world.attach_component(entity, Health(1)).unwrap();
            }
        });
        scope.spawn(|| {
            for &entity in entities.iter().step_by(2) {
                world.attach_component(entity, Score(2)).unwrap();
            }
        });
        scope.spawn(|| {
            for &entity in entities.iter().step_by(5) {
                world.attach_component(entity, Burning).unwrap();
            }
        });
    });

    let query = world.get_query::<(Health, Score, Burning)>();
    assert_eq!(query.len(), 100);
    assert!(query.entities().iter().all(|e| e.raw() % 10 == 0));
}

#[test]
fn concurrent_readers_share_cache() {
    let world = World::new();
    for _ in 0..64 {
        let entity = world.new_entity();
        world.attach_component(entity, Health(1)).unwrap();
        world.attach_component(entity, Score(1)).unwrap();
    }

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let query = world.get_query::<(Score, Health)>();
                    assert_eq!(query.len(), 64);
                }
            });
        }
    });

    assert_eq!(world.queries().storage_count(), 1);
}

#[test]
fn blocked_delete_keeps_id_out_of_circulation() {
    let world = Arc::new(World::new());
    let doomed = world.new_entity();
    world.attach_component(doomed, Health(1)).unwrap();

    // Holding Health parks the deleter between retiring and stripping.
    let held = world.get_component::<Health>(doomed).unwrap();
    let deleter = {
        let world = Arc::clone(&world);
        thread::spawn(move || world.delete_entity(doomed))
    };
    while world.is_alive(doomed) {
        thread::yield_now();
    }
    thread::sleep(Duration::from_millis(20));

    let newcomer = world.new_entity();
    assert_ne!(newcomer, doomed);
    world.attach_component(newcomer, Score(7)).unwrap();
    assert_eq!(
        world.attach_component(doomed, Score(1)),
        Err(EcsError::EntityNotAlive(doomed))
    );

    drop(held);
    deleter.join().unwrap().unwrap();

    let recycled = world.new_entity();
    assert_eq!(recycled, doomed);
    world.attach_component(recycled, Burning).unwrap();
    assert!(!world.has_component::<Health>(recycled));
    assert!(!world.has_component::<Score>(recycled));
    assert!(world.has_component::<Burning>(recycled));
    assert_eq!(*world.get_component::<Score>(newcomer).unwrap(), Score(7));
}

#[test]
fn racing_attach_never_outlives_delete() {
    let world = World::new();

    for _ in 0..200 {
        let entity = world.new_entity();
        let barrier = Barrier::new(2);
        thread::scope(|scope| {
            scope.spawn(|| {
                barrier.wait();
                let _ = world.attach_component(entity, Burning);
            });
            scope.spawn(|| {
                barrier.wait();
                world.delete_entity(entity).unwrap();
            });
        });

        assert!(!world.is_alive(entity));
        assert_eq!(world.component_count::<Burning>(), 0);
    }

    let successor = world.new_entity();
    assert!(!world.has_component::<Burning>(successor));
}

#[test]
fn nested_query_survives_blocked_delete_and_new_type() {
    struct Fresh;

    let world = Arc::new(World::new());
    let entity = world.new_entity();
    world.attach_component(entity, Health(1)).unwrap();
    world.attach_component(entity, Score(1)).unwrap();

    let (holding_tx, holding_rx) = crossbeam_channel::bounded(1);
    let (go_tx, go_rx) = crossbeam_channel::bounded::<()>(1);
    let (done_tx, done_rx) = crossbeam_channel::bounded(1);

    let system = {
        let world = Arc::clone(&world);
        thread::spawn(move || {
            let outer = world.get_query::<(Health,)>();
            holding_tx.send(()).unwrap();
            go_rx.recv().unwrap();
            let inner = world.get_query::<(Health, Score)>();
            done_tx.send((outer.len(), inner.len())).unwrap();
        })
    };
    holding_rx.recv().unwrap();

    let deleter = {
        let world = Arc::clone(&world);
        thread::spawn(move || world.delete_entity(entity))
    };
    thread::sleep(Duration::from_millis(50));

    let creator = {
        let world = Arc::clone(&world);
        thread::spawn(move || {
            let other = world.new_entity();
            world.attach_component(other, Fresh).unwrap();
        })
    };
    thread::sleep(Duration::from_millis(50));

    go_tx.send(()).unwrap();
    let lens = done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("nested query blocked behind a pending delete");
    assert_eq!(lens.0, 1);

    system.join().unwrap();
    deleter.join().unwrap().unwrap();
    creator.join().unwrap();
    assert!(!world.is_alive(entity));
    assert_eq!(world.component_count::<Fresh>(), 1);
    assert_eq!(world.component_count::<Health>(), 0);
}
