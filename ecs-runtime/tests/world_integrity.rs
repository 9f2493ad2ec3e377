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
//! Structural integrity tests for the entity manager
//!
//! Exercises add/get exactness, destruction, archetype membership, query
//! containment and pooling through the public world API.

use ecs_runtime::ecs::{AnyComponent, Component, ComponentArray, ComponentStorage, Signature};
use ecs_runtime::{EcsError, Entity, World};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct Health(i32);
impl Component for Health {
    fn type_name() -> &'static str {
        "Health"
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct Name(String);
impl Component for Name {
    fn type_name() -> &'static str {
        "Name"
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct Armor {
    rating: u8,
}
impl Component for Armor {
    fn type_name() -> &'static str {
        "Armor"
    }
}

fn world() -> World {
    let mut world = World::new();
    world.register::<Health>().unwrap();
    world.register::<Name>().unwrap();
    world.register::<Armor>().unwrap();
    world
}

/// Small deterministic generator so the mixed-operation tests are repeatable
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

#[test]
fn test_get_returns_exact_value() {
    let world = world();
    for i in 0..100 {
        let entity = world.create_entity();
        world.add_component(entity, Health(i)).unwrap();
        world.add_component(entity, Name(format!("e{}", i))).unwrap();
        assert_eq!(world.get_component::<Health>(entity), Some(Health(i)));
        assert_eq!(world.get_component::<Name>(entity), Some(Name(format!("e{}", i))));
    }
}

#[test]
fn test_destroyed_entity_disappears() {
    let world = world();
    let keep = world.create_entity();
    let gone = world.create_entity();
    for &e in &[keep, gone] {
        world.add_component(e, Health(10)).unwrap();
        world.add_component(e, Armor { rating: 2 }).unwrap();
    }

    assert!(world.destroy_entity(gone));
    assert!(world.get_component::<Health>(gone).is_none());
    assert!(world.get_component::<Armor>(gone).is_none());
    assert!(world.archetype_of(gone).is_none());
    assert_eq!(world.query::<(Health,)>(), vec![keep]);
    assert_eq!(world.query::<()>(), vec![keep]);

    // Ids are never handed out again
    let fresh = world.create_entity();
    assert_ne!(fresh, gone);
    assert!(!world.query::<(Health,)>().contains(&gone));
}

#[test]
fn test_second_component_moves_archetype() {
    let world = world();
    let e = world.create_entity();
    world.add_component(e, Health(1)).unwrap();
    let only_health = world.archetype_of(e).unwrap();

    world.add_component(e, Name("a".into())).unwrap();
    let both = world.archetype_of(e).unwrap();

    assert_eq!(only_health.len(), 1);
    assert_eq!(both.len(), 2);
    assert!(both.is_superset_of(&only_health));
    assert_eq!(
        world.manager().archetype_members(&only_health),
        Some(Vec::new())
    );
    assert_eq!(world.manager().archetype_members(&both), Some(vec![e]));
}

#[test]
fn test_query_matches_supersets_exactly() {
    let world = world();
    let mut rng = Lcg(7);
    let mut expected_health = HashSet::new();
    let mut expected_both = HashSet::new();

    for _ in 0..200 {
        let e = world.create_entity();
        let has_health = rng.next(2) == 0;
        let has_name = rng.next(2) == 0;
        if rng.next(3) == 0 {
            world.add_component(e, Armor::default()).unwrap();
        }
        if has_health {
            world.add_component(e, Health(0)).unwrap();
            expected_health.insert(e);
        }
        if has_name {
            world.add_component(e, Name::default()).unwrap();
        }
        if has_health && has_name {
            expected_both.insert(e);
        }
    }

    let health: HashSet<Entity> = world.query::<(Health,)>().into_iter().collect();
    let both: HashSet<Entity> = world.query::<(Health, Name)>().into_iter().collect();
    let reversed: HashSet<Entity> = world.query::<(Name, Health)>().into_iter().collect();

    assert_eq!(health, expected_health);
    assert_eq!(both, expected_both);
    assert_eq!(both, reversed);
    assert!(both.is_subset(&health));
    assert_eq!(world.query::<()>().len(), 200);
}

#[test]
fn test_mixed_operations_keep_indices_consistent() {
    let world = world();
    let health_id = world.manager().component_id::<Health>().unwrap();
    let mut rng = Lcg(42);
    let mut live: Vec<Entity> = Vec::new();

    for _ in 0..2_000 {
        match rng.next(5) {
            0 | 1 => live.push(world.create_entity()),
            2 if !live.is_empty() => {
                let e = live[rng.next(live.len() as u64) as usize];
                world.add_component(e, Health(rng.next(100) as i32)).unwrap();
            }
            3 if !live.is_empty() => {
                let e = live[rng.next(live.len() as u64) as usize];
                world.remove_component_by_id(e, health_id);
            }
            4 if !live.is_empty() => {
                let index = rng.next(live.len() as u64) as usize;
                assert!(world.destroy_entity(live.swap_remove(index)));
            }
            _ => {}
        }
    }

    assert_eq!(world.entity_count(), live.len());
    let with_health = world.query::<(Health,)>();
    for &e in &live {
        let location = world.manager().location_of(e).unwrap();
        let members = world
            .manager()
            .archetype_members(&world.archetype_of(e).unwrap())
            .unwrap();
        assert_eq!(members[location.row], e);
        assert_eq!(world.has_component::<Health>(e), with_health.contains(&e));
    }
    assert_eq!(
        world.manager().component_count(health_id),
        with_health.len()
    );
}

#[test]
fn test_array_length_invariant() {
    let mut array = ComponentArray::<Health>::new();
    let entities: Vec<Entity> = (0..10).map(Entity::from_raw).collect();
    for (i, &e) in entities.iter().enumerate() {
        array.insert(e, Health(i as i32));
        assert_eq!(array.len(), array.entities().len());
        assert_eq!(array.len(), array.as_slice().len());
    }
    for &e in entities.iter().step_by(3) {
        assert!(array.remove(e).is_some());
        assert!(array.get(e).is_none());
        assert_eq!(array.len(), array.entities().len());
    }
    assert_eq!(array.len(), 6);
    for &e in array.entities() {
        assert_eq!(array.get(e).unwrap().0 as u64, e.raw());
    }
}

#[test]
fn test_pool_reuse_is_type_safe() {
    let world = world();
    let name_id = world.manager().component_id::<Name>().unwrap();

    let e = world.create_entity();
    world.add_component(e, Name("buffer".into())).unwrap();
    assert!(world.remove_component::<Name>(e));

    let recycled: Name = world.pooled::<Name>().unwrap();
    assert_eq!(recycled, Name::default());

    let err = world
        .recycle(name_id, AnyComponent::new(Health(3)))
        .unwrap_err();
    assert!(matches!(err, EcsError::TypeMismatch { expected: "Name", found: "Health" }));

    // Two entities never share one pooled value
    world.recycle(name_id, AnyComponent::new(Name::default())).unwrap();
    let a = world.create_entity();
    let b = world.create_entity();
    world.add_component(a, world.pooled::<Name>().unwrap()).unwrap();
    world.add_component(b, world.pooled::<Name>().unwrap()).unwrap();
    world.update_component(a, Name("a".into())).unwrap();
    assert_eq!(world.get_component::<Name>(b), Some(Name::default()));
}

#[test]
fn test_idempotent_deletes() {
    let world = world();
    let e = world.create_entity();
    assert!(!world.remove_component::<Health>(e));
    assert!(world.destroy_entity(e));
    assert!(!world.destroy_entity(e));
    assert!(!world.remove_component::<Health>(e));
    assert!(matches!(
        world.add_component(e, Health(1)),
        Err(EcsError::InvalidEntity(_))
    ));
}

#[test]
fn test_concurrent_structural_changes() {
    let world = Arc::new(world());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let world = Arc::clone(&world);
            thread::spawn(move || {
                let mut mine = Vec::new();
                for i in 0..250 {
                    let e = world.create_entity();
                    world.add_component(e, Health(t * 1000 + i)).unwrap();
                    if i % 2 == 0 {
                        world.add_component(e, Armor { rating: 1 }).unwrap();
                    }
                    if i % 5 == 0 {
                        world.destroy_entity(e);
                    } else {
                        mine.push(e);
                    }
                }
                mine
            })
        })
        .collect();

    let mut survivors = Vec::new();
    for handle in handles {
        survivors.extend(handle.join().unwrap());
    }

    assert_eq!(world.entity_count(), survivors.len());
    assert_eq!(world.query::<(Health,)>().len(), survivors.len());
    let armored = world.query::<(Health, Armor)>();
    for e in &armored {
        assert_eq!(world.archetype_of(*e).unwrap().len(), 2);
    }
    assert_eq!(armored.len(), 4 * 100);
    assert!(world.archetype_count() <= 4);
    assert!(world
        .archetype_of(survivors[0])
        .map(|s: Signature| !s.is_empty())
        .unwrap_or(false));
}
