//! # Scene Integration Tests
//!
//! Full frames through the facade: configuration in, systems running
//! against the world and the bus, commits at the frame boundary.

use std::io::Write;
use strata::prelude::*;
use strata::{ConfigError, FrameConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position(f32);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity(f32);

#[derive(Debug, Clone, PartialEq)]
struct Moved {
    entity: Entity,
    to: f32,
}

fn quiet_config() -> RuntimeConfig {
    RuntimeConfig {
        frame: FrameConfig {
            target_fps: 0,
            warn_on_slow_frame: false,
        },
        ..RuntimeConfig::default()
    }
}

#[test]
fn movement_system_over_several_frames() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut frames = FrameLoop::new(&quiet_config());
    let mover = frames.scene().world().new_entity();
    let rock = frames.scene().world().new_entity();
    {
        let world = frames.scene().world();
        world.attach_component(mover, Position(0.0)).unwrap();
        world.attach_component(mover, Velocity(1.5)).unwrap();
        world.attach_component(rock, Position(9.0)).unwrap();
    }
    let mut moves = frames.scene().events().get_event_reader::<Moved>();

    let mut seen = Vec::new();
    for _ in 0..3 {
        frames.run_frame(|scene| {
            let world = scene.world();
            let writer = scene.events().get_event_writer();
            let targets: Vec<(Entity, f32)> = world
                .get_query::<(Position, Velocity)>()
                .iter()
                .map(|element| {
                    let (position, velocity) = *element.components();
                    (element.entity(), position.0 + velocity.0)
                })
                .collect();
            for (entity, to) in targets {
                if let Some(mut position) = world.get_component_mut::<Position>(entity) {
                    position.0 = to;
                }
                writer.send(Moved { entity, to });
            }
        });
        seen.extend(moves.read_all());
    }

    let world = frames.scene().world();
    assert_eq!(*world.get_component::<Position>(mover).unwrap(), Position(4.5));
    assert_eq!(*world.get_component::<Position>(rock).unwrap(), Position(9.0));
    assert_eq!(
        seen.iter().map(|m| m.to).collect::<Vec<_>>(),
        vec![1.5, 3.0, 4.5]
    );
    assert!(seen.iter().all(|m| m.entity == mover));
    assert_eq!(frames.stats().frames_recorded, 3);
}

#[test]
fn deferred_spawns_land_at_frame_end() {
    let mut frames = FrameLoop::new(&quiet_config());
    let parent = frames.scene().world().new_entity();
    frames
        .scene()
        .world()
        .attach_component(parent, Position(1.0))
        .unwrap();

    let stats = frames.run_frame(|scene| {
        for element in &scene.world().get_query::<(Position,)>() {
            let child = scene.world().new_entity();
            let at = element.components().0 .0;
            scene.commands().attach(child, Position(at + 1.0));
            scene.commands().attach_with(child, || Velocity(0.0));
        }
    });

    assert_eq!(stats.commands.applied, 2);
    let query = frames.scene().world().get_query::<(Position,)>();
    assert_eq!(query.len(), 2);
    let moving = frames.scene().world().get_query::<(Velocity, Position)>();
    assert_eq!(moving.len(), 1);
}

#[test]
fn callbacks_run_once_per_event() {
    let mut frames = FrameLoop::new(&quiet_config());
    let hits = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    {
        let hits = std::sync::Arc::clone(&hits);
        frames.scene().events().add_callback(move |_: &Moved| {
            hits.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });
    }

    let entity = frames.scene().world().new_entity();
    frames.run_frames(4, |scene| {
        scene
            .events()
            .get_event_writer()
            .send(Moved { entity, to: 0.0 });
    });

    assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 4);
    assert_eq!(frames.scene().events().update_count(), 4);
}

#[test]
fn config_file_round_trip_into_scene() {
    let path = std::env::temp_dir().join(format!("strata-scene-{}.toml", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[world]\nentity_capacity = 8\n\n[events]\nevent_capacity = 4").unwrap();
    }

    let config = RuntimeConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.world.entity_capacity, 8);
    assert_eq!(config.events.event_capacity, 4);

    let scene = Scene::new(&config);
    assert_eq!(scene.world().entity_count(), 0);
    assert_eq!(scene.frame_budget(), config.frame.frame_budget());
}

#[test]
fn bad_config_is_reported() {
    let err = RuntimeConfig::from_toml_str("[frame]\ntarget_fps = -3").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
