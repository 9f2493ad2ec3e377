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
//! Error types for ECS operations
//!
//! Structural misuse (unknown entities, missing components, wrong pool types)
//! is reported as a typed error instead of aborting. Deletes of things that are
//! already gone are no-ops rather than errors.

use crate::ecs::Entity;
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, EcsError>;

/// Errors produced by the world, pools, scheduler and snapshot codec
#[derive(Debug, Error)]
pub enum EcsError {
    /// The entity does not exist or was destroyed
    #[error("{0} does not exist")]
    InvalidEntity(Entity),

    /// The entity does not currently hold a component of this type
    #[error("{entity} has no `{component}` component")]
    MissingComponent {
        /// Entity that was addressed
        entity: Entity,
        /// Snapshot name of the missing component type
        component: &'static str,
    },

    /// A pool received a component of a different concrete type
    #[error("pool for `{expected}` cannot accept a `{found}` component")]
    TypeMismatch {
        /// Type the pool was registered for
        expected: &'static str,
        /// Type that was handed back
        found: &'static str,
    },

    /// The component type was never registered with the world
    #[error("component type `{0}` is not registered")]
    UnregisteredComponent(&'static str),

    /// Two distinct component types were registered under one snapshot name
    #[error("component name `{0}` is already registered by another type")]
    DuplicateComponentName(&'static str),

    /// Snapshot decoding failed or described an inconsistent component set
    #[error("snapshot error: {0}")]
    Serialization(String),

    /// A system panicked during a tick
    #[error("system `{system}` panicked: {message}")]
    SystemPanicked {
        /// Name reported by the system
        system: String,
        /// Panic payload rendered as text
        message: String,
    },

    /// A system returned an error during a tick
    #[error("system `{system}` failed: {source}")]
    SystemFailed {
        /// Name reported by the system
        system: String,
        /// Error returned by the system
        #[source]
        source: Box<EcsError>,
    },

    /// The tick was cancelled before every batch ran
    #[error("tick cancelled")]
    Cancelled,

    /// The worker thread pool could not be built
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl From<serde_json::Error> for EcsError {
    fn from(err: serde_json::Error) -> Self {
        EcsError::Serialization(err.to_string())
    }
}
