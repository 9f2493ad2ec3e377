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
//! Entity manager
//!
//! The manager owns entity identifiers, the component registry, every
//! component array with its pool, and the archetype tables. It composes them
//! into the structural operations (create, destroy, add, remove) and keeps
//! the derived indices consistent with the arrays.
//!
//! # Locking
//!
//! Structural state (live entities, their archetype locations and the
//! archetype tables) sits behind one reader/writer lock. Each component array
//! has its own reader/writer lock. Locks are always taken in this order:
//!
//! 1. the structural lock
//! 2. component arrays, in ascending [`ComponentId`] order
//!
//! Callers holding an array guard must drop it before calling any structural
//! operation or query, otherwise they may deadlock against a concurrent
//! structural change.

use crate::ecs::archetype::{Archetype, ArchetypeId, Signature};
use crate::ecs::entity::EntityAllocator;
use crate::ecs::query::{self, ComponentSet};
use crate::ecs::{
    AnyComponent, Component, ComponentArray, ComponentId, ComponentRegistry, ComponentStorage,
    Entity,
};
use crate::error::{EcsError, Result};
use crate::pool::{ComponentPool, PoolConfig, PoolStats};
use crate::snapshot::ComponentColumn;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

/// Shared read access to one component array
pub type ArrayReadGuard<'a, T> = RwLockReadGuard<'a, ComponentArray<T>>;

/// Exclusive write access to one component array
pub type ArrayWriteGuard<'a, T> = RwLockWriteGuard<'a, ComponentArray<T>>;

/// Where an entity currently lives in the archetype tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLocation {
    /// Archetype holding the entity
    pub archetype: ArchetypeId,
    /// Row of the entity inside that archetype
    pub row: usize,
}

/// Structural state guarded by the manager's lock
struct EntityIndex {
    allocator: EntityAllocator,
    locations: HashMap<Entity, EntityLocation>,
    archetypes: Vec<Archetype>,
    by_signature: HashMap<Signature, ArchetypeId>,
}

impl EntityIndex {
    fn new() -> Self {
        let mut index = EntityIndex {
            allocator: EntityAllocator::new(),
            locations: HashMap::new(),
            archetypes: Vec::new(),
            by_signature: HashMap::new(),
        };
        let empty = index.archetype_for(Signature::empty());
        debug_assert_eq!(empty, ArchetypeId::EMPTY);
        index
    }

    fn archetype(&self, id: ArchetypeId) -> &Archetype {
        &self.archetypes[id.index()]
    }

    fn signature_of(&self, entity: Entity) -> Option<&Signature> {
        let location = self.locations.get(&entity)?;
        Some(self.archetype(location.archetype).signature())
    }

    /// Find or create the archetype for `signature`
    fn archetype_for(&mut self, signature: Signature) -> ArchetypeId {
        if let Some(&id) = self.by_signature.get(&signature) {
            return id;
        }
        let id = ArchetypeId::new(self.archetypes.len());
        log::debug!("creating archetype {} for signature {}", id.index(), signature);
        self.archetypes.push(Archetype::new(id, signature.clone()));
        self.by_signature.insert(signature, id);
        id
    }

    fn place(&mut self, entity: Entity, archetype: ArchetypeId) {
        let row = self.archetypes[archetype.index()].push(entity);
        self.locations.insert(entity, EntityLocation { archetype, row });
    }

    /// Remove `entity` from its archetype and forget its location
    fn detach(&mut self, entity: Entity) -> Option<EntityLocation> {
        let location = self.locations.remove(&entity)?;
        let archetype = &mut self.archetypes[location.archetype.index()];
        if let Some(moved) = archetype.swap_remove(location.row) {
            if let Some(moved_location) = self.locations.get_mut(&moved) {
                moved_location.row = location.row;
            }
        }
        Some(location)
    }

    /// Move `entity` into the archetype for `signature`
    fn refile(&mut self, entity: Entity, signature: Signature) {
        if self.detach(entity).is_some() {
            let target = self.archetype_for(signature);
            self.place(entity, target);
        }
    }

    fn reset(&mut self, next_entity: u64) {
        for archetype in &mut self.archetypes {
            archetype.clear();
        }
        self.locations.clear();
        self.allocator.reset(next_entity);
    }
}

/// Type-erased view of one component type's array and pool
trait ErasedStorage: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn len(&self) -> usize;
    fn contains(&self, entity: Entity) -> bool;
    /// Remove the entity's component and hand it to the pool
    fn recycle_entity(&self, entity: Entity) -> bool;
    fn recycle(&self, component: AnyComponent) -> Result<()>;
    fn clear(&self);
    fn encode(&self) -> Result<ComponentColumn>;
    /// Decode a snapshot column into a detached array
    fn decode(&self, column: &ComponentColumn) -> Result<Box<dyn Any + Send>>;
    /// Replace the live array with one produced by `decode`
    fn install(&self, decoded: Box<dyn Any + Send>);
}

struct TypedStorage<T: Component> {
    array: RwLock<ComponentArray<T>>,
    pool: ComponentPool<T>,
}

impl<T: Component> ErasedStorage for TypedStorage<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn len(&self) -> usize {
        self.array.read().len()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.array.read().contains(entity)
    }

    fn recycle_entity(&self, entity: Entity) -> bool {
        let removed = self.array.write().remove(entity);
        match removed {
            Some(component) => {
                self.pool.put(component);
                true
            }
            None => false,
        }
    }

    fn recycle(&self, component: AnyComponent) -> Result<()> {
        self.pool.put_any(component)
    }

    fn clear(&self) {
        self.array.write().clear();
    }

    fn encode(&self) -> Result<ComponentColumn> {
        let array = self.array.read();
        let mut column = ComponentColumn::with_capacity(array.len());
        for (entity, component) in array.iter() {
            column.entities.push(entity);
            column.values.push(serde_json::to_value(component)?);
        }
        Ok(column)
    }

    fn decode(&self, column: &ComponentColumn) -> Result<Box<dyn Any + Send>> {
        let mut array = ComponentArray::<T>::with_capacity(column.len());
        for (entity, value) in column.entities.iter().zip(&column.values) {
            let component: T = serde_json::from_value(value.clone()).map_err(|err| {
                EcsError::Serialization(format!(
                    "cannot decode `{}` for {}: {}",
                    T::type_name(),
                    entity,
                    err
                ))
            })?;
            array.insert(*entity, component);
        }
        Ok(Box::new(array))
    }

    fn install(&self, decoded: Box<dyn Any + Send>) {
        if let Ok(array) = decoded.downcast::<ComponentArray<T>>() {
            *self.array.write() = *array;
        }
    }
}

/// Owner of entities, component storage and archetype tables
pub struct EntityManager {
    registry: ComponentRegistry,
    index: RwLock<EntityIndex>,
    /// Indexed by `ComponentId::index`
    storages: Vec<Box<dyn ErasedStorage>>,
    pool_config: PoolConfig,
}

impl EntityManager {
    /// Create an empty manager with default pool settings
    pub fn new() -> Self {
        Self::with_pool_config(PoolConfig::default())
    }

    /// Create an empty manager whose pools use `pool_config`
    pub fn with_pool_config(pool_config: PoolConfig) -> Self {
        EntityManager {
            registry: ComponentRegistry::new(),
            index: RwLock::new(EntityIndex::new()),
            storages: Vec::new(),
            pool_config,
        }
    }

    /// Register a component type, creating its array and pool
    ///
    /// Registering an already-known type returns its existing id.
    pub fn register<T: Component>(&mut self) -> Result<ComponentId> {
        if let Some(id) = self.registry.id_of::<T>() {
            return Ok(id);
        }
        let id = self.registry.register::<T>()?;
        debug_assert_eq!(id.index(), self.storages.len());
        self.storages.push(Box::new(TypedStorage::<T> {
            array: RwLock::new(ComponentArray::new()),
            pool: ComponentPool::with_config(self.pool_config.clone()),
        }));
        log::info!("registered component `{}` as {}", T::type_name(), id);
        Ok(id)
    }

    /// The component registry
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Id of a registered component type
    pub fn component_id<T: Component>(&self) -> Option<ComponentId> {
        self.registry.id_of::<T>()
    }

    fn typed<T: Component>(&self) -> Result<(ComponentId, &TypedStorage<T>)> {
        let id = self
            .registry
            .id_of::<T>()
            .ok_or(EcsError::UnregisteredComponent(T::type_name()))?;
        let storage = self.storages[id.index()]
            .as_any()
            .downcast_ref::<TypedStorage<T>>()
            .ok_or(EcsError::UnregisteredComponent(T::type_name()))?;
        Ok((id, storage))
    }

    /// Create a new entity with no components
    ///
    /// # Panics
    ///
    /// Panics if every entity identifier has been handed out. Snapshots that
    /// would leave no identifiers are rejected before loading.
    pub fn create_entity(&self) -> Entity {
        let mut index = self.index.write();
        let entity = index.allocator.allocate();
        index.place(entity, ArchetypeId::EMPTY);
        log::debug!("created {}", entity);
        entity
    }

    /// Destroy an entity and return all of its components to their pools
    ///
    /// Returns `false` without doing anything if the entity is unknown or was
    /// already destroyed.
    pub fn destroy_entity(&self, entity: Entity) -> bool {
        let mut index = self.index.write();
        let location = match index.detach(entity) {
            Some(location) => location,
            None => return false,
        };

        // Signature ids are sorted, which keeps array locks in global order
        for id in index.archetype(location.archetype).signature().ids() {
            self.storages[id.index()].recycle_entity(entity);
        }
        log::debug!("destroyed {}", entity);
        true
    }

    /// Check if an entity is alive
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.index.read().locations.contains_key(&entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.index.read().locations.len()
    }

    /// All live entities in archetype order
    pub fn entities(&self) -> Vec<Entity> {
        self.query_ids(&[])
    }

    /// Attach a component to an entity
    ///
    /// If the entity already holds a `T`, the value is replaced in place and
    /// the entity stays in its archetype. Otherwise the entity moves to the
    /// archetype for its extended signature.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if the entity does not exist,
    /// [`EcsError::UnregisteredComponent`] if `T` was never registered.
    pub fn add_component<T: Component>(&self, entity: Entity, component: T) -> Result<()> {
        let mut index = self.index.write();
        let current = index
            .signature_of(entity)
            .ok_or(EcsError::InvalidEntity(entity))?
            .clone();
        let (id, storage) = self.typed::<T>()?;

        storage.array.write().insert(entity, component);
        if !current.contains(id) {
            index.refile(entity, current.with(id));
        }
        log::debug!("added `{}` to {}", T::type_name(), entity);
        Ok(())
    }

    /// Detach a component by type
    ///
    /// Returns `false` if the entity or the component is absent.
    pub fn remove_component<T: Component>(&self, entity: Entity) -> bool {
        match self.registry.id_of::<T>() {
            Some(id) => self.remove_component_by_id(entity, id),
            None => false,
        }
    }

    /// Detach a component by registry id
    ///
    /// The removed value goes back to its pool and the entity is re-filed
    /// under its reduced signature. Returns `false` if the entity or the
    /// component is absent.
    pub fn remove_component_by_id(&self, entity: Entity, id: ComponentId) -> bool {
        let mut index = self.index.write();
        let current = match index.signature_of(entity) {
            Some(signature) if signature.contains(id) => signature.clone(),
            _ => return false,
        };

        self.storages[id.index()].recycle_entity(entity);
        index.refile(entity, current.without(id));
        log::debug!("removed {} from {}", id, entity);
        true
    }

    /// Replace the value of a component the entity already holds
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if the entity does not exist,
    /// [`EcsError::MissingComponent`] if it holds no `T`.
    pub fn update_component<T: Component>(&self, entity: Entity, component: T) -> Result<()> {
        let index = self.index.read();
        if !index.locations.contains_key(&entity) {
            return Err(EcsError::InvalidEntity(entity));
        }
        let missing = EcsError::MissingComponent {
            entity,
            component: T::type_name(),
        };
        let (_, storage) = self.typed::<T>().map_err(|_| missing)?;

        let mut array = storage.array.write();
        match array.get_mut(entity) {
            Some(slot) => {
                *slot = component;
                Ok(())
            }
            None => Err(EcsError::MissingComponent {
                entity,
                component: T::type_name(),
            }),
        }
    }

    /// Point lookup of a component value
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<T> {
        self.with_component(entity, T::clone)
    }

    /// Run `f` against a component without cloning it
    pub fn with_component<T: Component, R>(
        &self,
        entity: Entity,
        f: impl FnOnce(&T) -> R,
    ) -> Option<R> {
        let (_, storage) = self.typed::<T>().ok()?;
        let array = storage.array.read();
        array.get(entity).map(f)
    }

    /// Check if an entity holds a `T`
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        match self.typed::<T>() {
            Ok((_, storage)) => storage.array.read().contains(entity),
            Err(_) => false,
        }
    }

    /// Shared access to the array of `T`
    pub fn read<T: Component>(&self) -> Result<ArrayReadGuard<'_, T>> {
        let (_, storage) = self.typed::<T>()?;
        Ok(storage.array.read())
    }

    /// Exclusive access to the array of `T`
    pub fn write<T: Component>(&self) -> Result<ArrayWriteGuard<'_, T>> {
        let (_, storage) = self.typed::<T>()?;
        Ok(storage.array.write())
    }

    /// Exclusive access to two arrays, locked in global id order
    ///
    /// # Panics
    ///
    /// Panics if `A` and `B` are the same type.
    pub fn write_pair<A: Component, B: Component>(
        &self,
    ) -> Result<(ArrayWriteGuard<'_, A>, ArrayWriteGuard<'_, B>)> {
        assert_ne!(TypeId::of::<A>(), TypeId::of::<B>(), "write_pair needs two distinct types");
        let (id_a, a) = self.typed::<A>()?;
        let (id_b, b) = self.typed::<B>()?;
        if id_a < id_b {
            let guard_a = a.array.write();
            Ok((guard_a, b.array.write()))
        } else {
            let guard_b = b.array.write();
            Ok((a.array.write(), guard_b))
        }
    }

    /// Shared access to two arrays, locked in global id order
    ///
    /// # Panics
    ///
    /// Panics if `A` and `B` are the same type.
    pub fn read_pair<A: Component, B: Component>(
        &self,
    ) -> Result<(ArrayReadGuard<'_, A>, ArrayReadGuard<'_, B>)> {
        assert_ne!(TypeId::of::<A>(), TypeId::of::<B>(), "read_pair needs two distinct types");
        let (id_a, a) = self.typed::<A>()?;
        let (id_b, b) = self.typed::<B>()?;
        if id_a < id_b {
            let guard_a = a.array.read();
            Ok((guard_a, b.array.read()))
        } else {
            let guard_b = b.array.read();
            Ok((a.array.read(), guard_b))
        }
    }

    /// Entities holding at least every type in `Q`
    pub fn query<Q: ComponentSet>(&self) -> Vec<Entity> {
        match Q::component_ids(&self.registry) {
            Some(ids) => self.query_ids(&ids),
            None => Vec::new(),
        }
    }

    /// Entities holding at least every id in `ids`
    pub fn query_ids(&self, ids: &[ComponentId]) -> Vec<Entity> {
        let wanted = Signature::new(ids.iter().copied());
        let index = self.index.read();
        query::matching_entities(&index.archetypes, &wanted)
    }

    /// Number of archetypes created so far, including the empty one
    pub fn archetype_count(&self) -> usize {
        self.index.read().archetypes.len()
    }

    /// Signature of the archetype holding `entity`
    pub fn archetype_of(&self, entity: Entity) -> Option<Signature> {
        self.index.read().signature_of(entity).cloned()
    }

    /// Archetype location of `entity`
    pub fn location_of(&self, entity: Entity) -> Option<EntityLocation> {
        self.index.read().locations.get(&entity).copied()
    }

    /// Members of the archetype with exactly `signature`
    pub fn archetype_members(&self, signature: &Signature) -> Option<Vec<Entity>> {
        let index = self.index.read();
        let id = index.by_signature.get(signature)?;
        Some(index.archetype(*id).entities().to_vec())
    }

    /// Take a zero-valued `T` from its pool
    pub fn pooled<T: Component>(&self) -> Result<T> {
        let (_, storage) = self.typed::<T>()?;
        Ok(storage.pool.get())
    }

    /// Return an erased component to the pool of `id`
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeMismatch`] if the component is not of the pool's type.
    pub fn recycle(&self, id: ComponentId, component: AnyComponent) -> Result<()> {
        match self.storages.get(id.index()) {
            Some(storage) => storage.recycle(component),
            None => Err(EcsError::UnregisteredComponent(component.type_name())),
        }
    }

    /// Free-list length of the pool of `T`
    pub fn pool_size<T: Component>(&self) -> Option<usize> {
        self.typed::<T>().ok().map(|(_, storage)| storage.pool.size())
    }

    /// Statistics of the pool of `T`
    pub fn pool_stats<T: Component>(&self) -> Option<PoolStats> {
        self.typed::<T>().ok().map(|(_, storage)| storage.pool.stats())
    }

    /// Number of stored components of the registered type `id`
    pub fn component_count(&self, id: ComponentId) -> usize {
        self.storages.get(id.index()).map_or(0, |storage| storage.len())
    }

    /// Export the live entity set and every component array
    pub(crate) fn export(&self) -> Result<(Vec<Entity>, u64, BTreeMap<String, ComponentColumn>)> {
        let index = self.index.read();
        let mut entities: Vec<Entity> = index.locations.keys().copied().collect();
        entities.sort_unstable();

        let mut columns = BTreeMap::new();
        for info in self.registry.iter() {
            let column = self.storages[info.id().index()].encode()?;
            columns.insert(info.name().to_string(), column);
        }
        Ok((entities, index.allocator.peek(), columns))
    }

    /// Replace all state with a validated snapshot
    ///
    /// Every column is decoded before anything is touched, so a decoding
    /// failure leaves the current state intact.
    pub(crate) fn import(
        &self,
        entities: &[Entity],
        next_entity: u64,
        columns: &BTreeMap<String, ComponentColumn>,
    ) -> Result<()> {
        let mut decoded = Vec::with_capacity(columns.len());
        let mut signatures: HashMap<Entity, Vec<ComponentId>> = HashMap::new();
        for (name, column) in columns {
            let id = self
                .registry
                .id_by_name(name)
                .ok_or_else(|| EcsError::Serialization(format!("unknown component `{}`", name)))?;
            decoded.push((id, self.storages[id.index()].decode(column)?));
            for entity in &column.entities {
                signatures.entry(*entity).or_default().push(id);
            }
        }

        let mut index = self.index.write();
        for storage in &self.storages {
            storage.clear();
        }
        let highest = entities.iter().map(|e| e.raw() + 1).max().unwrap_or(0);
        index.reset(next_entity.max(highest));

        for &entity in entities {
            let signature = Signature::new(signatures.remove(&entity).unwrap_or_default());
            let archetype = index.archetype_for(signature);
            index.place(entity, archetype);
        }
        for (id, array) in decoded {
            self.storages[id.index()].install(array);
        }
        log::info!("loaded snapshot with {} entities", entities.len());
        Ok(())
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}
