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
//! Archetype tables
//!
//! An archetype groups every entity whose component-type signature is exactly
//! the same. Queries walk archetypes instead of individual entities, so
//! matching cost scales with the number of distinct signatures.
//!
//! Archetypes hold membership only. Component values stay in their
//! per-type [`ComponentArray`](crate::ecs::ComponentArray); a row of an
//! archetype is resolved to values through the array's sparse index.

use crate::ecs::{ComponentId, Entity};
use std::fmt;

/// Index of an archetype in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchetypeId(u32);

impl ArchetypeId {
    /// The archetype for entities with no components
    pub const EMPTY: ArchetypeId = ArchetypeId(0);

    pub(crate) fn new(index: usize) -> Self {
        ArchetypeId(index as u32)
    }

    /// Position of this archetype in creation order
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Sorted, duplicate-free set of component ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Signature(Vec<ComponentId>);

impl Signature {
    /// Build a signature from any collection of ids
    pub fn new(ids: impl IntoIterator<Item = ComponentId>) -> Self {
        let mut ids: Vec<ComponentId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Signature(ids)
    }

    /// The empty signature
    pub fn empty() -> Self {
        Signature(Vec::new())
    }

    /// Ids in ascending order
    pub fn ids(&self) -> &[ComponentId] {
        &self.0
    }

    /// Number of component types
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the signature has no types
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check membership of a single id
    pub fn contains(&self, id: ComponentId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Signature extended with `id`
    pub fn with(&self, id: ComponentId) -> Signature {
        let mut ids = self.0.clone();
        if let Err(pos) = ids.binary_search(&id) {
            ids.insert(pos, id);
        }
        Signature(ids)
    }

    /// Signature with `id` removed
    pub fn without(&self, id: ComponentId) -> Signature {
        let mut ids = self.0.clone();
        if let Ok(pos) = ids.binary_search(&id) {
            ids.remove(pos);
        }
        Signature(ids)
    }

    /// Check whether every id of `other` is also in `self`
    pub fn is_superset_of(&self, other: &Signature) -> bool {
        if other.len() > self.len() {
            return false;
        }
        // Both sides are sorted, so a single merge pass is enough
        let mut mine = self.0.iter();
        'outer: for wanted in &other.0 {
            for have in mine.by_ref() {
                if have == wanted {
                    continue 'outer;
                }
                if have > wanted {
                    return false;
                }
            }
            return false;
        }
        true
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", id.index())?;
        }
        write!(f, "}}")
    }
}

/// Entities sharing one exact signature
#[derive(Debug)]
pub struct Archetype {
    id: ArchetypeId,
    signature: Signature,
    entities: Vec<Entity>,
}

impl Archetype {
    pub(crate) fn new(id: ArchetypeId, signature: Signature) -> Self {
        Archetype {
            id,
            signature,
            entities: Vec::new(),
        }
    }

    /// Archetype id
    pub fn id(&self) -> ArchetypeId {
        self.id
    }

    /// Component-type signature
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Member entities in storage order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of member entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check whether the archetype has no members
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Append an entity, returning its row
    pub(crate) fn push(&mut self, entity: Entity) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    /// Swap-remove the entity at `row`
    ///
    /// Returns the entity that was moved into `row` to fill the gap, if any.
    pub(crate) fn swap_remove(&mut self, row: usize) -> Option<Entity> {
        self.entities.swap_remove(row);
        self.entities.get(row).copied()
    }

    pub(crate) fn clear(&mut self) {
        self.entities.clear();
    }
}
