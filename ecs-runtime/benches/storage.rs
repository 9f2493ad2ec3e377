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
//! Storage benchmarks
//!
//! These benchmarks measure:
//! - Sparse-set insert, random access and dense iteration
//! - Structural changes that move entities between archetypes
//! - Signature queries over many archetypes
//! - Pool reuse versus fresh construction

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ecs_runtime::ecs::components::{Lung, Mouth};
use ecs_runtime::ecs::{ComponentArray, ComponentStorage, Entity};
use ecs_runtime::World;

fn breathing_world() -> World {
    let mut world = World::new();
    world.register::<Lung>().unwrap();
    world.register::<Mouth>().unwrap();
    world
}

/// Benchmark: insert N components into a bare array
fn bench_array_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_insert");

    for entity_count in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*entity_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(entity_count),
            entity_count,
            |b, &count| {
                b.iter(|| {
                    let mut array = ComponentArray::<Lung>::with_capacity(count);
                    for i in 0..count {
                        array.insert(Entity::from_raw(i as u64), Lung::new(i as f64));
                    }
                    black_box(array);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: point lookups in scattered order
fn bench_array_random_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_random_access");

    for entity_count in [100, 1000, 10000].iter() {
        let mut array = ComponentArray::<Lung>::new();
        for i in 0..*entity_count {
            array.insert(Entity::from_raw(i as u64), Lung::new(1.0));
        }
        let order: Vec<Entity> = (0..*entity_count)
            .map(|i| Entity::from_raw(((i * 7919) % entity_count) as u64))
            .collect();

        group.throughput(Throughput::Elements(*entity_count as u64));
        group.bench_function(BenchmarkId::from_parameter(entity_count), |b| {
            b.iter(|| {
                let mut total = 0.0;
                for &entity in &order {
                    if let Some(lung) = array.get(entity) {
                        total += lung.capacity;
                    }
                }
                black_box(total)
            });
        });
    }

    group.finish();
}

/// Benchmark: dense iteration over the value slice
fn bench_array_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_iteration");

    for entity_count in [1000, 10000, 100000].iter() {
        let mut array = ComponentArray::<Lung>::new();
        for i in 0..*entity_count {
            array.insert(Entity::from_raw(i as u64), Lung::new(1.0));
        }

        group.throughput(Throughput::Elements(*entity_count as u64));
        group.bench_function(BenchmarkId::from_parameter(entity_count), |b| {
            b.iter(|| {
                for lung in array.as_mut_slice() {
                    lung.volume = (lung.volume + 0.05).min(lung.capacity);
                }
                black_box(&array);
            });
        });
    }

    group.finish();
}

/// Benchmark: create entities, attach two components, destroy them again
fn bench_structural_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("structural_churn");

    for entity_count in [100, 1000].iter() {
        group.throughput(Throughput::Elements(*entity_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(entity_count),
            entity_count,
            |b, &count| {
                let world = breathing_world();
                b.iter(|| {
                    let entities: Vec<Entity> = (0..count)
                        .map(|_| {
                            let e = world.create_entity();
                            world.add_component(e, Lung::new(1.0)).unwrap();
                            world.add_component(e, Mouth::new(true)).unwrap();
                            e
                        })
                        .collect();
                    for e in entities {
                        world.destroy_entity(e);
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: query with entities spread over three archetypes
fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    for entity_count in [1000, 10000].iter() {
        let world = breathing_world();
        for i in 0..*entity_count {
            let e = world.create_entity();
            if i % 3 != 0 {
                world.add_component(e, Lung::new(1.0)).unwrap();
            }
            if i % 2 == 0 {
                world.add_component(e, Mouth::new(false)).unwrap();
            }
        }

        group.bench_function(BenchmarkId::new("lung_mouth", entity_count), |b| {
            b.iter(|| black_box(world.query::<(Lung, Mouth)>()));
        });
        group.bench_function(BenchmarkId::new("all", entity_count), |b| {
            b.iter(|| black_box(world.query::<()>()));
        });
    }

    group.finish();
}

/// Benchmark: pooled instances versus fresh defaults
fn bench_pool_reuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_reuse");
    let world = breathing_world();

    group.bench_function("pooled", |b| {
        let e = world.create_entity();
        b.iter(|| {
            let lung = world.pooled::<Lung>().unwrap();
            world.add_component(e, lung).unwrap();
            world.remove_component::<Lung>(e);
        });
    });

    group.bench_function("fresh", |b| {
        let e = world.create_entity();
        b.iter(|| {
            world.add_component(e, Lung::default()).unwrap();
            world.remove_component::<Lung>(e);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_array_insert,
    bench_array_random_access,
    bench_array_iteration,
    bench_structural_churn,
    bench_query,
    bench_pool_reuse
);
criterion_main!(benches);
