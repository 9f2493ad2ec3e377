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
//! World snapshots
//!
//! A [`Snapshot`] captures the live entity set and every registered
//! component array as a self-describing JSON document:
//!
//! ```json
//! {
//!   "format_version": "1.0.0",
//!   "next_entity": 3,
//!   "entities": [0, 1, 2],
//!   "components": {
//!     "Lung": { "entities": [0], "values": [{ "capacity": 1.0, "volume": 0.0, "state": "Inhale" }] }
//!   }
//! }
//! ```
//!
//! Components are keyed by [`Component::type_name`](crate::ecs::Component::type_name).
//! Entity ids survive a save/load cycle unchanged. Loading validates the whole
//! document and decodes every value before the world is touched, so a
//! rejected snapshot leaves the world as it was.

use crate::ecs::{Entity, World};
use crate::error::{EcsError, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::{Read, Write};

/// Format version written into new snapshots
pub const SNAPSHOT_FORMAT_VERSION: &str = "1.0.0";

/// Stored values of one component type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentColumn {
    /// Owner of each value
    pub entities: Vec<Entity>,
    /// Serialized values, parallel to `entities`
    pub values: Vec<serde_json::Value>,
}

impl ComponentColumn {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        ComponentColumn {
            entities: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the column is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Serializable copy of a world's entities and components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Semver of the document layout
    pub format_version: String,
    /// Id the allocator hands out next
    pub next_entity: u64,
    /// Every live entity, ascending
    pub entities: Vec<Entity>,
    /// Component columns keyed by component name
    pub components: BTreeMap<String, ComponentColumn>,
}

impl Snapshot {
    /// Serialize to compact JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Write indented JSON to `writer`
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Read and validate a JSON document from `reader`
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check the document for internal consistency
    ///
    /// Component names are checked against a registry only when loading.
    pub fn validate(&self) -> Result<()> {
        if !is_version_compatible(&self.format_version, SNAPSHOT_FORMAT_VERSION) {
            return Err(invalid(format!(
                "format version {} is incompatible with {}",
                self.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }

        if self.next_entity == u64::MAX {
            return Err(invalid(format!(
                "next_entity {} leaves no ids to allocate",
                self.next_entity
            )));
        }

        let mut live = HashSet::with_capacity(self.entities.len());
        for &entity in &self.entities {
            if !live.insert(entity) {
                return Err(invalid(format!("{} listed twice", entity)));
            }
            if entity.raw() >= self.next_entity {
                return Err(invalid(format!(
                    "{} is not below next_entity {}",
                    entity, self.next_entity
                )));
            }
        }

        for (name, column) in &self.components {
            if column.entities.len() != column.values.len() {
                return Err(invalid(format!(
                    "column `{}` has {} entities but {} values",
                    name,
                    column.entities.len(),
                    column.values.len()
                )));
            }
            let mut seen = HashSet::with_capacity(column.len());
            for &entity in &column.entities {
                if !live.contains(&entity) {
                    return Err(invalid(format!(
                        "column `{}` references unknown {}",
                        name, entity
                    )));
                }
                if !seen.insert(entity) {
                    return Err(invalid(format!("column `{}` lists {} twice", name, entity)));
                }
            }
        }
        Ok(())
    }
}

fn invalid(message: String) -> EcsError {
    EcsError::Serialization(message)
}

/// Check if a snapshot written as `found` can be read by `current`
///
/// Major versions must match. Within 1.x and later, older or equal minor
/// versions are readable; within 0.x the minor version must match exactly.
fn is_version_compatible(found: &str, current: &str) -> bool {
    let found = match Version::parse(found) {
        Ok(v) => v,
        Err(_) => return false,
    };
    let current = match Version::parse(current) {
        Ok(v) => v,
        Err(_) => return false,
    };

    if found.major != current.major {
        return false;
    }
    if found.major != 0 {
        found.minor <= current.minor
    } else {
        found.minor == current.minor
    }
}

impl World {
    /// Capture all entities and components
    pub fn save_snapshot(&self) -> Result<Snapshot> {
        let (entities, next_entity, components) = self.manager().export()?;
        Ok(Snapshot {
            format_version: SNAPSHOT_FORMAT_VERSION.to_string(),
            next_entity,
            entities,
            components,
        })
    }

    /// Replace all entities and components with the snapshot's
    ///
    /// Every component named in the snapshot must be registered. Types
    /// registered in the world but absent from the snapshot end up empty.
    /// Subscriptions and systems are untouched.
    ///
    /// # Errors
    ///
    /// [`EcsError::Serialization`] if the snapshot is inconsistent, names an
    /// unregistered component, or holds a value that does not decode. The
    /// world is unchanged in that case.
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        snapshot.validate()?;
        self.manager()
            .import(&snapshot.entities, snapshot.next_entity, &snapshot.components)
    }
}
