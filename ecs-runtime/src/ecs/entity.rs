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
//! Entity management
//!
//! Entities are opaque identifiers that tie components together. They carry
//! no behavior of their own. Identifiers are handed out monotonically and are
//! never reused within a run, so a stale handle can never alias a newer entity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque entity handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(u64);

impl Entity {
    /// Create an entity handle from a raw identifier
    ///
    /// Handles built this way are only meaningful if the identifier was
    /// previously issued by a world.
    pub fn from_raw(id: u64) -> Self {
        Entity(id)
    }

    /// Get the raw identifier
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Monotonic identifier source
#[derive(Debug, Default)]
pub(crate) struct EntityAllocator {
    next: u64,
}

impl EntityAllocator {
    pub(crate) fn new() -> Self {
        EntityAllocator { next: 0 }
    }

    /// Hand out the next identifier
    ///
    /// # Panics
    ///
    /// Panics if the identifier space is exhausted. `u64::MAX` is never
    /// handed out, and the allocator is left unchanged when this happens.
    pub(crate) fn allocate(&mut self) -> Entity {
        let next = match self.next.checked_add(1) {
            Some(next) => next,
            None => panic!("entity ids exhausted at {}", self.next),
        };
        let entity = Entity(self.next);
        self.next = next;
        entity
    }

    /// Identifier the next call to `allocate` will return
    pub(crate) fn peek(&self) -> u64 {
        self.next
    }

    /// Restart allocation at `next`, used when a snapshot is loaded
    pub(crate) fn reset(&mut self, next: u64) {
        self.next = next;
    }
}
