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
//! Breathing systems
//!
//! Every tick each entity holding both a [`Lung`] and a [`Mouth`] moves air at
//! [`BREATH_RATE`] volume units per second. An exhaling lung that empties
//! turns to inhale and opens the mouth; an inhaling lung that fills turns to
//! exhale and closes it.

use crate::ecs::components::{Lung, LungState, Mouth};
use crate::ecs::{ComponentStorage, Entity, System, SystemAccess, SystemContext};
use crate::error::Result;
use crate::events::Event;

/// Volume moved per second
pub const BREATH_RATE: f64 = 0.5;

/// Payload of [`Event::Breathed`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreathEvent {
    /// Entity whose lung changed
    pub entity: Entity,
    /// State after the step
    pub state: LungState,
    /// Volume after the step
    pub volume: f64,
}

/// Advance one lung by `dt` seconds
///
/// Returns `true` if the state or the volume changed.
pub fn breathe(lung: &mut Lung, mouth: &mut Mouth, dt: f64) -> bool {
    let before = (lung.state, lung.volume);
    let delta = BREATH_RATE * dt;

    match lung.state {
        LungState::Exhale => {
            lung.volume = (lung.volume - delta).max(0.0);
            if lung.volume <= 0.0 {
                lung.state = LungState::Inhale;
                mouth.is_open = true;
            }
        }
        LungState::Inhale => {
            lung.volume = (lung.volume + delta).min(lung.capacity);
            if lung.volume >= lung.capacity {
                lung.state = LungState::Exhale;
                mouth.is_open = false;
            }
        }
    }

    (lung.state, lung.volume) != before
}

/// Step every listed entity that holds both components
///
/// Entities missing either component are skipped.
///
/// # Returns
///
/// One event per entity whose lung changed, in iteration order
pub fn breathe_all<'a, I>(
    entities: I,
    lungs: &mut impl ComponentStorage<Component = Lung>,
    mouths: &mut impl ComponentStorage<Component = Mouth>,
    dt: f64,
) -> Vec<BreathEvent>
where
    I: IntoIterator<Item = &'a Entity>,
{
    let mut events = Vec::new();
    for &entity in entities {
        let (lung, mouth) = match (lungs.get_mut(entity), mouths.get_mut(entity)) {
            (Some(lung), Some(mouth)) => (lung, mouth),
            _ => continue,
        };
        if breathe(lung, mouth, dt) {
            events.push(BreathEvent {
                entity,
                state: lung.state,
                volume: lung.volume,
            });
        }
    }
    events
}

/// Drives [`breathe`] for every matching entity
///
/// Events are published after the component locks are released so handlers
/// may read the world.
#[derive(Debug, Default)]
pub struct BreathingSystem;

impl BreathingSystem {
    /// Create the system
    pub fn new() -> Self {
        BreathingSystem
    }
}

impl System for BreathingSystem {
    fn run(&mut self, ctx: &SystemContext<'_>) -> Result<()> {
        let manager = ctx.manager();
        let entities = manager.query::<(Lung, Mouth)>();
        if entities.is_empty() {
            return Ok(());
        }

        let events = {
            let (mut lungs, mut mouths) = manager.write_pair::<Lung, Mouth>()?;
            breathe_all(&entities, &mut *lungs, &mut *mouths, ctx.dt())
        };

        for event in events {
            ctx.emit(Event::Breathed(event));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "BreathingSystem"
    }

    fn access(&self) -> SystemAccess {
        SystemAccess::new().writes::<Lung>().writes::<Mouth>()
    }
}
