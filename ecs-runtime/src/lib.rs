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
//! # ECS Runtime
//!
//! An Entity Component System runtime: typed components attached to opaque
//! entities, entities grouped into archetypes by their component signature,
//! signature queries, a conflict-aware parallel system scheduler and a
//! topic-keyed event bus.
//!
//! ## Features
//!
//! - **Sparse-set storage**: one dense array per component type behind its own lock
//! - **Archetypes**: entities grouped by the exact set of component types they hold
//! - **Parallelization**: non-conflicting systems run together on Rayon (`parallel` feature)
//! - **Pooling**: removed components are recycled per type
//! - **Snapshots**: the whole world saved to and loaded from JSON
//!
//! ## Example
//!
//! ```rust
//! use ecs_runtime::ecs::components::{Lung, Mouth};
//! use ecs_runtime::ecs::systems::BreathingSystem;
//! use ecs_runtime::World;
//!
//! let mut world = World::new();
//! world.register::<Lung>().unwrap();
//! world.register::<Mouth>().unwrap();
//! world.add_system(BreathingSystem::new());
//!
//! let entity = world.create_entity();
//! world.add_component(entity, Lung::new(1.0)).unwrap();
//! world.add_component(entity, Mouth::new(true)).unwrap();
//!
//! world.update(0.1).unwrap();
//! let lung = world.get_component::<Lung>(entity).unwrap();
//! assert!((lung.volume - 0.05).abs() < 1e-9);
//! ```

#![warn(missing_docs)]

/// Entity Component System implementation
pub mod ecs;

/// Error types
pub mod error;

/// Publish/subscribe event bus
pub mod events;

/// World configuration
pub mod config;

/// Component pooling for reducing allocation churn
pub mod pool;

/// World snapshots
pub mod snapshot;

pub use config::WorldConfig;
pub use ecs::{Entity, World};
pub use error::{EcsError, Result};
pub use snapshot::Snapshot;
