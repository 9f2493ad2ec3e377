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
//! Breathing simulation demo
//!
//! Creates one entity with a lung and a mouth, prints every breath event and
//! runs 50 ticks of 0.1 s at a 100 ms cadence.
//!
//! Run with `RUST_LOG=debug cargo run --example breathing` to see structural
//! logging, and set `ECS_WORKER_THREADS` to size the scheduler pool.

use ecs_runtime::ecs::components::{Lung, LungState, Mouth};
use ecs_runtime::ecs::systems::BreathingSystem;
use ecs_runtime::events::{topics, Event};
use ecs_runtime::{World, WorldConfig};
use std::thread;
use std::time::{Duration, Instant};

const TICKS: u32 = 50;
const DT: f64 = 0.1;
const TICK_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> ecs_runtime::Result<()> {
    env_logger::init();

    println!("=== Breathing Simulation ===\n");

    let mut world = World::with_config(WorldConfig::from_env())?;
    world.register::<Lung>()?;
    world.register::<Mouth>()?;
    world.add_system(BreathingSystem::new());

    world.subscribe(topics::ENTITY_BREATHED, |event| {
        let Event::Breathed(breath) = event;
        let state = match breath.state {
            LungState::Inhale => "inhaling",
            LungState::Exhale => "exhaling",
        };
        println!("{} is {} (volume: {:.2})", breath.entity, state, breath.volume);
    });

    let entity = world.create_entity();
    world.add_component(entity, Lung::new(1.0))?;
    world.add_component(entity, Mouth::new(true))?;

    println!("Starting breathing simulation...");
    let start = Instant::now();
    for tick in 0..TICKS {
        let deadline = start + TICK_INTERVAL * (tick + 1);
        world.update(DT)?;
        if let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            thread::sleep(remaining);
        }
    }

    let lung = world
        .get_component::<Lung>(entity)
        .unwrap_or_default();
    println!(
        "\nFinished after {} ticks: volume {:.2}, {:?}",
        TICKS, lung.volume, lung.state
    );
    Ok(())
}
