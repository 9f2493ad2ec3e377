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
//! Query engine
//!
//! A query names a set of component types and matches every live entity
//! whose signature is a superset of that set. Matching happens per archetype,
//! so an archetype either contributes all of its entities or none.
//!
//! Results are produced in archetype creation order, and in storage order
//! within an archetype. That order is a snapshot: structural changes made
//! after the query returns are not reflected in the result.

use crate::ecs::archetype::{Archetype, Signature};
use crate::ecs::{Component, ComponentId, ComponentRegistry, Entity};

/// A static set of component types usable as a query
///
/// Implemented for tuples of up to six component types:
///
/// ```
/// use ecs_runtime::World;
/// use ecs_runtime::ecs::components::{Lung, Mouth};
///
/// let mut world = World::new();
/// world.register::<Lung>().unwrap();
/// world.register::<Mouth>().unwrap();
///
/// let e = world.create_entity();
/// world.add_component(e, Lung::default()).unwrap();
/// world.add_component(e, Mouth::default()).unwrap();
///
/// assert_eq!(world.query::<(Lung, Mouth)>(), vec![e]);
/// assert_eq!(world.query::<(Mouth,)>(), vec![e]);
/// ```
pub trait ComponentSet {
    /// Resolve the set to registry ids
    ///
    /// Returns `None` if any member type is unregistered, in which case no
    /// entity can match.
    fn component_ids(registry: &ComponentRegistry) -> Option<Vec<ComponentId>>;
}

impl ComponentSet for () {
    fn component_ids(_registry: &ComponentRegistry) -> Option<Vec<ComponentId>> {
        Some(Vec::new())
    }
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn component_ids(registry: &ComponentRegistry) -> Option<Vec<ComponentId>> {
                Some(vec![$(registry.id_of::<$name>()?),+])
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);

/// Collect the entities of every archetype matching `wanted`
pub(crate) fn matching_entities(archetypes: &[Archetype], wanted: &Signature) -> Vec<Entity> {
    let mut result = Vec::new();
    for archetype in matching_archetypes(archetypes, wanted) {
        result.extend_from_slice(archetype.entities());
    }
    result
}

/// Archetypes whose signature covers `wanted`, in creation order
pub(crate) fn matching_archetypes<'a>(
    archetypes: &'a [Archetype],
    wanted: &'a Signature,
) -> impl Iterator<Item = &'a Archetype> + 'a {
    archetypes
        .iter()
        .filter(move |archetype| archetype.signature().is_superset_of(wanted))
}
