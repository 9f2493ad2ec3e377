//! Entity Component System (ECS) core implementation
//!
//! This module provides the foundational ECS architecture including:
//! - Entity allocation and archetype grouping
//! - Sparse-set component storage behind per-type locks
//! - Signature queries over archetypes
//! - Conflict-aware system scheduling, parallel via Rayon when enabled

mod archetype;
mod component;
mod entity;
mod manager;
mod query;
mod registry;
mod system;
mod world;

pub mod components;
pub mod scheduler;
pub mod systems;

pub use archetype::{Archetype, ArchetypeId, Signature};
pub use component::{AnyComponent, Component, ComponentArray, ComponentStorage};
pub use entity::Entity;
pub use manager::{ArrayReadGuard, ArrayWriteGuard, EntityLocation, EntityManager};
pub use query::ComponentSet;
pub use registry::{ComponentId, ComponentInfo, ComponentRegistry};
pub use scheduler::{CancelToken, Scheduler, TickStats};
pub use system::{System, SystemAccess, SystemContext};
pub use world::World;
