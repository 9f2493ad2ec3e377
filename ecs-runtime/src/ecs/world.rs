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
//! World container for the ECS
//!
//! The world is the explicit handle every caller goes through. It owns the
//! entity manager, the event bus and the scheduler, and forwards the common
//! operations to them.

use crate::config::WorldConfig;
use crate::ecs::archetype::Signature;
use crate::ecs::query::ComponentSet;
use crate::ecs::scheduler::{CancelToken, Scheduler, TickStats};
use crate::ecs::{AnyComponent, Component, ComponentId, Entity, EntityManager, System};
use crate::error::Result;
use crate::events::{Event, EventBus, SubscriptionId};

/// The ECS world containing all entities, components and systems
pub struct World {
    manager: EntityManager,
    events: EventBus<Event>,
    scheduler: Scheduler,
    config: WorldConfig,
}

impl World {
    /// Create a new empty world with default settings
    pub fn new() -> Self {
        World {
            manager: EntityManager::new(),
            events: EventBus::new(),
            scheduler: Scheduler::new(),
            config: WorldConfig::default(),
        }
    }

    /// Create a new empty world from `config`
    ///
    /// # Errors
    ///
    /// Fails if a dedicated scheduler pool was requested and cannot be built.
    pub fn with_config(config: WorldConfig) -> Result<Self> {
        let scheduler = Scheduler::with_threads(config.worker_threads)?;
        log::info!("creating world with {:?}", config);
        Ok(World {
            manager: EntityManager::with_pool_config(config.pool.clone()),
            events: EventBus::new(),
            scheduler,
            config,
        })
    }

    /// The settings this world was created with
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The entity manager
    pub fn manager(&self) -> &EntityManager {
        &self.manager
    }

    /// The event bus
    pub fn events(&self) -> &EventBus<Event> {
        &self.events
    }

    /// Register a component type
    pub fn register<T: Component>(&mut self) -> Result<ComponentId> {
        self.manager.register::<T>()
    }

    /// Create a new entity
    ///
    /// # Panics
    ///
    /// Panics if every entity identifier has been handed out.
    pub fn create_entity(&self) -> Entity {
        self.manager.create_entity()
    }

    /// Destroy an entity and all of its components
    pub fn destroy_entity(&self, entity: Entity) -> bool {
        self.manager.destroy_entity(entity)
    }

    /// Check if an entity is alive
    pub fn is_entity_alive(&self, entity: Entity) -> bool {
        self.manager.is_alive(entity)
    }

    /// Get the number of alive entities
    pub fn entity_count(&self) -> usize {
        self.manager.entity_count()
    }

    /// All alive entities
    pub fn entities(&self) -> Vec<Entity> {
        self.manager.entities()
    }

    /// Attach or replace a component
    pub fn add_component<T: Component>(&self, entity: Entity, component: T) -> Result<()> {
        self.manager.add_component(entity, component)
    }

    /// Detach a component; `false` if it was not there
    pub fn remove_component<T: Component>(&self, entity: Entity) -> bool {
        self.manager.remove_component::<T>(entity)
    }

    /// Detach a component by id; `false` if it was not there
    pub fn remove_component_by_id(&self, entity: Entity, id: ComponentId) -> bool {
        self.manager.remove_component_by_id(entity, id)
    }

    /// Replace a component the entity already holds
    pub fn update_component<T: Component>(&self, entity: Entity, component: T) -> Result<()> {
        self.manager.update_component(entity, component)
    }

    /// Copy of a component value
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<T> {
        self.manager.get_component(entity)
    }

    /// Check if the entity holds a `T`
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.manager.has_component::<T>(entity)
    }

    /// Entities holding every type in `Q`
    pub fn query<Q: ComponentSet>(&self) -> Vec<Entity> {
        self.manager.query::<Q>()
    }

    /// Entities holding every id in `ids`
    pub fn query_ids(&self, ids: &[ComponentId]) -> Vec<Entity> {
        self.manager.query_ids(ids)
    }

    /// Number of archetypes, including the empty one
    pub fn archetype_count(&self) -> usize {
        self.manager.archetype_count()
    }

    /// Signature of the entity's archetype
    pub fn archetype_of(&self, entity: Entity) -> Option<Signature> {
        self.manager.archetype_of(entity)
    }

    /// Take a zero-valued `T` from its pool
    pub fn pooled<T: Component>(&self) -> Result<T> {
        self.manager.pooled::<T>()
    }

    /// Return an erased component to the pool of `id`
    pub fn recycle(&self, id: ComponentId, component: AnyComponent) -> Result<()> {
        self.manager.recycle(id, component)
    }

    /// Register an event handler for `topic`
    pub fn subscribe<F>(&self, topic: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.events.subscribe(topic, handler)
    }

    /// Remove an event handler
    pub fn unsubscribe(&self, topic: &str, id: SubscriptionId) -> bool {
        self.events.unsubscribe(topic, id)
    }

    /// Publish `event` under an explicit topic
    pub fn publish(&self, topic: &str, event: &Event) -> usize {
        self.events.publish(topic, event)
    }

    /// Publish `event` under its canonical topic
    pub fn emit(&self, event: Event) -> usize {
        self.events.publish(event.topic(), &event)
    }

    /// Add a system after all existing ones
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.scheduler.add_system(system);
    }

    /// The system scheduler
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Run every system once
    pub fn update(&mut self, dt: f64) -> Result<TickStats> {
        self.update_with_cancel(dt, &CancelToken::new())
    }

    /// Run every system once, stopping early if `cancel` fires
    ///
    /// Cancellation is observed before each batch and by systems that poll
    /// [`SystemContext::is_cancelled`](crate::ecs::SystemContext::is_cancelled).
    /// A running system is never interrupted, so one that stalls keeps this
    /// call from returning until it finishes.
    pub fn update_with_cancel(&mut self, dt: f64, cancel: &CancelToken) -> Result<TickStats> {
        self.scheduler.run(&self.manager, &self.events, dt, cancel)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
