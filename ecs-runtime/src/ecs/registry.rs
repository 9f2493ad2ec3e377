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
//! Component type registry
//!
//! Every component type is assigned a dense [`ComponentId`] when it is
//! registered. Storage, pools, archetype signatures and lock ordering are all
//! keyed by this id, so no runtime type inspection happens on the access path.

use crate::ecs::Component;
use crate::error::{EcsError, Result};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

/// Stable per-type identifier assigned at registration
///
/// Ids are dense and ordered by registration. The ordering doubles as the
/// global lock order for code that needs more than one component array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(u32);

impl ComponentId {
    pub(crate) fn new(index: usize) -> Self {
        ComponentId(index as u32)
    }

    /// Position of this id in registration order
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// Metadata recorded for a registered component type
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    id: ComponentId,
    name: &'static str,
    type_id: TypeId,
}

impl ComponentInfo {
    /// Registry id
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Snapshot name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Rust type id
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

/// Maps Rust types and snapshot names to component ids
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    infos: Vec<ComponentInfo>,
    by_type: HashMap<TypeId, ComponentId>,
    by_name: HashMap<&'static str, ComponentId>,
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T`, returning its id
    ///
    /// Registering the same type twice returns the existing id. Registering a
    /// different type under a name already in use fails, since snapshots could
    /// no longer tell the two apart.
    pub fn register<T: Component>(&mut self) -> Result<ComponentId> {
        let type_id = TypeId::of::<T>();
        if let Some(&id) = self.by_type.get(&type_id) {
            return Ok(id);
        }

        let name = T::type_name();
        if self.by_name.contains_key(name) {
            return Err(EcsError::DuplicateComponentName(name));
        }

        let id = ComponentId::new(self.infos.len());
        self.infos.push(ComponentInfo { id, name, type_id });
        self.by_type.insert(type_id, id);
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Look up the id of `T`
    pub fn id_of<T: Component>(&self) -> Option<ComponentId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Look up an id by snapshot name
    pub fn id_by_name(&self, name: &str) -> Option<ComponentId> {
        self.by_name.get(name).copied()
    }

    /// Metadata for a registered id
    pub fn info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.infos.get(id.index())
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Check whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// All registered types in id order
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> + '_ {
        self.infos.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Alpha;
    impl Component for Alpha {
        fn type_name() -> &'static str {
            "Alpha"
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Beta;
    impl Component for Beta {
        fn type_name() -> &'static str {
            "Beta"
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct FakeAlpha;
    impl Component for FakeAlpha {
        fn type_name() -> &'static str {
            "Alpha"
        }
    }

    #[test]
    fn test_ids_follow_registration_order() {
        let mut registry = ComponentRegistry::new();
        let a = registry.register::<Alpha>().unwrap();
        let b = registry.register::<Beta>().unwrap();

        assert!(a < b);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = ComponentRegistry::new();
        let first = registry.register::<Alpha>().unwrap();
        let second = registry.register::<Alpha>().unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_by_name_and_type() {
        let mut registry = ComponentRegistry::new();
        let id = registry.register::<Beta>().unwrap();

        assert_eq!(registry.id_of::<Beta>(), Some(id));
        assert_eq!(registry.id_by_name("Beta"), Some(id));
        assert_eq!(registry.info(id).unwrap().name(), "Beta");
        assert_eq!(registry.id_of::<Alpha>(), None);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Alpha>().unwrap();
        let err = registry.register::<FakeAlpha>().unwrap_err();
        assert!(matches!(err, EcsError::DuplicateComponentName("Alpha")));
    }
}
