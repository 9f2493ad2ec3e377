// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Snapshot persistence through files and across worlds

use ecs_runtime::ecs::components::{Lung, LungState, Mouth};
use ecs_runtime::ecs::systems::BreathingSystem;
use ecs_runtime::{EcsError, Entity, Snapshot, World};
use std::fs::File;
use std::io::BufReader;

fn breathing_world() -> World {
    let mut world = World::new();
    world.register::<Lung>().unwrap();
    world.register::<Mouth>().unwrap();
    world.add_system(BreathingSystem::new());
    world
}

#[test]
fn test_resume_simulation_from_file() {
    let mut original = breathing_world();
    let gone = original.create_entity();
    let entity = original.create_entity();
    original.add_component(entity, Lung::new(1.0)).unwrap();
    original.add_component(entity, Mouth::new(true)).unwrap();
    original.destroy_entity(gone);
    for _ in 0..5 {
        original.update(0.1).unwrap();
    }

    let path = std::env::temp_dir().join(format!("ecs-runtime-{}.json", std::process::id()));
    original
        .save_snapshot()
        .unwrap()
        .write_to(File::create(&path).unwrap())
        .unwrap();
    let snapshot = Snapshot::read_from(BufReader::new(File::open(&path).unwrap())).unwrap();
    std::fs::remove_file(&path).unwrap();

    let mut resumed = breathing_world();
    resumed.load_snapshot(&snapshot).unwrap();
    assert_eq!(resumed.entities(), vec![entity]);
    assert!(!resumed.is_entity_alive(gone));

    for _ in 0..5 {
        original.update(0.1).unwrap();
        resumed.update(0.1).unwrap();
    }
    let resumed_lung = resumed.get_component::<Lung>(entity).unwrap();
    let original_lung = original.get_component::<Lung>(entity).unwrap();
    assert!((resumed_lung.volume - original_lung.volume).abs() < 1e-9);
    assert_eq!(resumed_lung.state, LungState::Inhale);
    assert_eq!(resumed.get_component::<Mouth>(entity), Some(Mouth::new(true)));
}

#[test]
fn test_load_replaces_existing_state() {
    let source = breathing_world();
    let kept = source.create_entity();
    source.add_component(kept, Mouth::new(false)).unwrap();
    let snapshot = source.save_snapshot().unwrap();

    let mut target = breathing_world();
    for _ in 0..3 {
        let e = target.create_entity();
        target.add_component(e, Lung::new(2.0)).unwrap();
    }
    target.load_snapshot(&snapshot).unwrap();

    assert_eq!(target.entity_count(), 1);
    assert!(target.query::<(Lung,)>().is_empty());
    assert_eq!(target.query::<(Mouth,)>(), vec![kept]);
    assert_eq!(target.create_entity(), Entity::from_raw(1));
}

#[test]
fn test_empty_world_round_trip() {
    let world = breathing_world();
    let json = world.save_snapshot().unwrap().to_json_pretty().unwrap();
    let snapshot = Snapshot::from_json(&json).unwrap();
    assert!(snapshot.entities.is_empty());
    assert!(snapshot.components.values().all(|c| c.is_empty()));

    let mut other = breathing_world();
    other.load_snapshot(&snapshot).unwrap();
    assert_eq!(other.entity_count(), 0);
}

#[test]
fn test_malformed_json_is_a_serialization_error() {
    let err = Snapshot::from_json("{\"format_version\": 1}").unwrap_err();
    assert!(matches!(err, EcsError::Serialization(_)));
}

#[test]
fn test_duplicate_column_entity_rejected() {
    let json = r#"{
        "format_version": "1.0.0",
        "next_entity": 1,
        "entities": [0],
        "components": {
            "Mouth": { "entities": [0, 0], "values": [{"is_open": true}, {"is_open": false}] }
        }
    }"#;
    let err = Snapshot::from_json(json).unwrap_err();
    assert!(err.to_string().contains("twice"));
}
