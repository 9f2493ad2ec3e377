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
//! System execution framework
//!
//! Systems contain the per-tick logic that operates on entities and
//! components. Each system declares which component types it reads and
//! writes so the [`Scheduler`](crate::ecs::Scheduler) can run
//! non-conflicting systems side by side.

use crate::ecs::scheduler::CancelToken;
use crate::ecs::{Component, EntityManager};
use crate::error::Result;
use crate::events::{Event, EventBus};
use std::any::TypeId;
use std::collections::HashSet;

/// Component access declared by a system
///
/// Two accesses conflict when either is exclusive, or when one writes a type
/// the other reads or writes. An access with no reads and no writes that is
/// not exclusive conflicts with nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemAccess {
    reads: HashSet<TypeId>,
    writes: HashSet<TypeId>,
    exclusive: bool,
}

impl SystemAccess {
    /// Access touching no component types
    pub fn new() -> Self {
        Self::default()
    }

    /// Access that conflicts with every other system
    pub fn exclusive() -> Self {
        SystemAccess {
            exclusive: true,
            ..Self::default()
        }
    }

    /// Declare shared access to `T`
    pub fn reads<T: Component>(mut self) -> Self {
        self.reads.insert(TypeId::of::<T>());
        self
    }

    /// Declare exclusive access to `T`
    pub fn writes<T: Component>(mut self) -> Self {
        self.writes.insert(TypeId::of::<T>());
        self
    }

    /// Check if this access conflicts with every other
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    /// Check if the two systems may not run at the same time
    pub fn conflicts_with(&self, other: &SystemAccess) -> bool {
        if self.exclusive || other.exclusive {
            return true;
        }
        let writes_into = |a: &SystemAccess, b: &SystemAccess| {
            a.writes
                .iter()
                .any(|ty| b.writes.contains(ty) || b.reads.contains(ty))
        };
        writes_into(self, other) || writes_into(other, self)
    }
}

/// What a running system can see
///
/// Component data is reached through the entity manager, which hands out
/// per-type locks. Guards must be dropped before calling structural
/// operations or [`emit`](SystemContext::emit).
pub struct SystemContext<'a> {
    manager: &'a EntityManager,
    events: &'a EventBus<Event>,
    dt: f64,
    tick: u64,
    cancel: &'a CancelToken,
}

impl<'a> SystemContext<'a> {
    pub(crate) fn new(
        manager: &'a EntityManager,
        events: &'a EventBus<Event>,
        dt: f64,
        tick: u64,
        cancel: &'a CancelToken,
    ) -> Self {
        SystemContext {
            manager,
            events,
            dt,
            tick,
            cancel,
        }
    }

    /// The world's entity manager
    pub fn manager(&self) -> &'a EntityManager {
        self.manager
    }

    /// The world's event bus
    pub fn events(&self) -> &'a EventBus<Event> {
        self.events
    }

    /// Seconds elapsed since the previous tick
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Index of the running tick, starting at 0
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Check if the running update was asked to stop
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Publish `event` under its canonical topic
    pub fn emit(&self, event: Event) -> usize {
        self.events.publish(event.topic(), &event)
    }
}

/// Trait for systems run once per tick
pub trait System: Send + Sync {
    /// Execute one tick
    fn run(&mut self, ctx: &SystemContext<'_>) -> Result<()>;

    /// Get the name of this system for debugging and error reports
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Component types this system touches
    ///
    /// Defaults to exclusive, which never runs alongside anything else.
    fn access(&self) -> SystemAccess {
        SystemAccess::exclusive()
    }
}
