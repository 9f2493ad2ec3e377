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
//! Component storage and management
//!
//! Components are plain data attached to entities. Each component type is
//! stored in its own [`ComponentArray`], a sparse set that keeps values densely
//! packed for cache-friendly iteration while still answering point lookups in
//! O(1).

use crate::ecs::Entity;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Trait that all components must implement
///
/// `Default` supplies the zero value pools hand out and reset to. The serde
/// bounds let every component take part in world snapshots.
pub trait Component: 'static + Send + Sync + Clone + Default + Serialize + DeserializeOwned {
    /// Stable name used in snapshots and diagnostics
    ///
    /// Defaults to the Rust type path. Override it when the snapshot name must
    /// survive refactors that move the type.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Reset this instance to its zero value before it is pooled
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A component value with its concrete type erased
///
/// Used where a caller hands back a component without knowing its static
/// type, such as returning an instance to a pool by [`ComponentId`](crate::ecs::ComponentId).
pub struct AnyComponent {
    type_id: TypeId,
    type_name: &'static str,
    value: Box<dyn Any + Send>,
}

impl AnyComponent {
    /// Erase a concrete component
    pub fn new<T: Component>(value: T) -> Self {
        AnyComponent {
            type_id: TypeId::of::<T>(),
            type_name: T::type_name(),
            value: Box::new(value),
        }
    }

    /// Type id of the wrapped value
    pub fn component_type(&self) -> TypeId {
        self.type_id
    }

    /// Snapshot name of the wrapped value's type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check whether the wrapped value is a `T`
    pub fn is<T: Component>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Recover the concrete value, or get the wrapper back on mismatch
    pub fn downcast<T: Component>(self) -> Result<T, AnyComponent> {
        if !self.is::<T>() {
            return Err(self);
        }
        let AnyComponent {
            type_id,
            type_name,
            value,
        } = self;
        value.downcast::<T>().map(|boxed| *boxed).map_err(|value| AnyComponent {
            type_id,
            type_name,
            value,
        })
    }
}

impl std::fmt::Debug for AnyComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyComponent")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Storage interface for components
pub trait ComponentStorage: Send + Sync {
    /// The component type this storage manages
    type Component: Component;

    /// Insert a component for the given entity, overwriting any previous value
    fn insert(&mut self, entity: Entity, component: Self::Component);

    /// Remove the component for the given entity
    fn remove(&mut self, entity: Entity) -> Option<Self::Component>;

    /// Get a reference to the component for the given entity
    fn get(&self, entity: Entity) -> Option<&Self::Component>;

    /// Get a mutable reference to the component for the given entity
    fn get_mut(&mut self, entity: Entity) -> Option<&mut Self::Component>;

    /// Check if an entity has this component
    fn contains(&self, entity: Entity) -> bool;

    /// Clear all components
    fn clear(&mut self);
}

/// Sparse-set component storage
///
/// Values live contiguously in a dense array. A sparse map from entity to
/// dense index gives O(1) lookup, and removal swaps the last element into the
/// vacated slot so the dense array never has holes. Iteration order is
/// therefore not stable across removals.
///
/// # Memory Layout
///
/// ```text
/// components: [c0, c1, c2, c3]   // dense values
/// entities:   [e7, e2, e9, e4]   // owner of each slot
/// index:      {e7: 0, e2: 1, e9: 2, e4: 3}
/// ```
///
/// At every observable point `components.len() == entities.len() == index.len()`.
///
/// # Example
///
/// ```
/// use ecs_runtime::ecs::{ComponentArray, ComponentStorage, Entity};
/// use ecs_runtime::ecs::components::Mouth;
///
/// let mut array = ComponentArray::<Mouth>::new();
/// let entity = Entity::from_raw(1);
///
/// array.insert(entity, Mouth::new(true));
/// assert!(array.contains(entity));
/// assert!(array.get(entity).unwrap().is_open);
/// ```
pub struct ComponentArray<T: Component> {
    /// Mapping from Entity to dense array index
    index: HashMap<Entity, usize>,
    /// Owner of each dense slot (for swap_remove fix-ups)
    entities: Vec<Entity>,
    /// The component values stored densely
    components: Vec<T>,
}

impl<T: Component> ComponentArray<T> {
    /// Create a new empty array
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a new array with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        ComponentArray {
            index: HashMap::with_capacity(capacity),
            entities: Vec::with_capacity(capacity),
            components: Vec::with_capacity(capacity),
        }
    }

    /// Get the number of components stored
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if the array is empty
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Owners of the dense slots, in storage order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Read-only view of the dense backing array
    pub fn as_slice(&self) -> &[T] {
        &self.components
    }

    /// Mutable view of the dense backing array
    ///
    /// Slots can be rewritten but not added or removed, so the sparse index
    /// stays valid.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.components
    }

    /// Iterate `(entity, component)` pairs in storage order
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.entities.iter().copied().zip(self.components.iter())
    }

    /// Iterate `(entity, component)` pairs mutably in storage order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.entities.iter().copied().zip(self.components.iter_mut())
    }

    /// Get the dense index for an entity, if it exists
    pub fn index_of(&self, entity: Entity) -> Option<usize> {
        self.index.get(&entity).copied()
    }

    fn check_invariants(&self) {
        debug_assert_eq!(self.index.len(), self.entities.len());
        debug_assert_eq!(self.index.len(), self.components.len());
    }
}

impl<T: Component> Default for ComponentArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentStorage for ComponentArray<T> {
    type Component = T;

    fn insert(&mut self, entity: Entity, component: Self::Component) {
        if let Some(&index) = self.index.get(&entity) {
            self.components[index] = component;
        } else {
            let new_index = self.components.len();
            self.components.push(component);
            self.entities.push(entity);
            self.index.insert(entity, new_index);
        }
        self.check_invariants();
    }

    fn remove(&mut self, entity: Entity) -> Option<Self::Component> {
        let index = self.index.remove(&entity)?;
        let component = self.components.swap_remove(index);
        self.entities.swap_remove(index);

        // The former last element now sits at `index`
        if let Some(&moved) = self.entities.get(index) {
            self.index.insert(moved, index);
        }

        self.check_invariants();
        Some(component)
    }

    fn get(&self, entity: Entity) -> Option<&Self::Component> {
        let index = self.index.get(&entity)?;
        Some(&self.components[*index])
    }

    fn get_mut(&mut self, entity: Entity) -> Option<&mut Self::Component> {
        let index = self.index.get(&entity)?;
        Some(&mut self.components[*index])
    }

    fn contains(&self, entity: Entity) -> bool {
        self.index.contains_key(&entity)
    }

    fn clear(&mut self) {
        self.index.clear();
        self.entities.clear();
        self.components.clear();
    }
}
