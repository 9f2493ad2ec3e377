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
//! Component pooling for reducing allocation churn
//!
//! Each component type gets a free list of recycled instances. Removed or
//! destroyed components are reset to their zero value and parked here, and
//! callers building new components can take one back out instead of
//! allocating. Components owning heap buffers keep their capacity across reuse
//! when their [`Component::reset`] preserves it.

use crate::ecs::{AnyComponent, Component};
use crate::error::{EcsError, Result};
use parking_lot::Mutex;

/// Configuration for pool behavior
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Initial capacity reserved for each free list
    pub initial_capacity: usize,
    /// Maximum number of instances to keep in a pool
    pub max_pool_size: usize,
    /// Whether to log when a pool has to allocate a fresh instance
    pub log_resize_events: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            initial_capacity: 64,
            max_pool_size: 1024,
            log_resize_events: false,
        }
    }
}

impl PoolConfig {
    /// Create a new pool configuration with custom settings
    pub fn new(initial_capacity: usize, max_pool_size: usize) -> Self {
        PoolConfig {
            initial_capacity,
            max_pool_size,
            log_resize_events: false,
        }
    }

    /// Enable logging for pool misses
    pub fn with_logging(mut self) -> Self {
        self.log_resize_events = true;
        self
    }
}

/// Statistics for monitoring pool performance
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of times an instance was served from the free list
    pub hits: usize,
    /// Number of times a fresh instance had to be created
    pub misses: usize,
    /// Number of instances handed back
    pub returns: usize,
    /// Number of returned instances dropped because the pool was full
    pub discarded: usize,
    /// Current number of instances in the pool
    pub pool_size: usize,
    /// Peak number of pooled instances
    pub peak_size: usize,
}

impl PoolStats {
    /// Calculate the hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Thread-safe free list for one component type
///
/// # Example
///
/// ```
/// use ecs_runtime::pool::ComponentPool;
/// use ecs_runtime::ecs::components::Mouth;
///
/// let pool = ComponentPool::<Mouth>::new();
/// pool.put(Mouth::new(true));
/// assert_eq!(pool.size(), 1);
///
/// // Returned instances come back reset
/// assert!(!pool.get().is_open);
/// ```
pub struct ComponentPool<T: Component> {
    free: Mutex<Vec<T>>,
    config: PoolConfig,
    stats: Mutex<PoolStats>,
}

impl<T: Component> ComponentPool<T> {
    /// Create a new pool with default configuration
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a new pool with custom configuration
    pub fn with_config(config: PoolConfig) -> Self {
        ComponentPool {
            free: Mutex::new(Vec::with_capacity(config.initial_capacity)),
            config,
            stats: Mutex::new(PoolStats::default()),
        }
    }

    /// Take an instance from the pool
    ///
    /// Pops the most recently returned instance, or creates a zero-valued one
    /// when the pool is empty.
    pub fn get(&self) -> T {
        // LOCK ORDERING: free list first, released before stats
        let (component, pool_len) = {
            let mut free = self.free.lock();
            let component = free.pop();
            (component, free.len())
        };

        let mut stats = self.stats.lock();
        stats.pool_size = pool_len;
        match component {
            Some(component) => {
                stats.hits += 1;
                component
            }
            None => {
                stats.misses += 1;
                if self.config.log_resize_events {
                    log::debug!(
                        "ComponentPool<{}>: allocating new instance (hit rate: {:.1}%)",
                        T::type_name(),
                        stats.hit_rate()
                    );
                }
                T::default()
            }
        }
    }

    /// Reset an instance and return it to the pool
    ///
    /// The instance is dropped instead when the pool is already at
    /// `max_pool_size`.
    pub fn put(&self, mut component: T) {
        component.reset();

        let (kept, pool_len) = {
            let mut free = self.free.lock();
            let kept = free.len() < self.config.max_pool_size;
            if kept {
                free.push(component);
            }
            (kept, free.len())
        };

        let mut stats = self.stats.lock();
        stats.returns += 1;
        if !kept {
            stats.discarded += 1;
        }
        stats.pool_size = pool_len;
        if pool_len > stats.peak_size {
            stats.peak_size = pool_len;
        }
    }

    /// Return a type-erased instance
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TypeMismatch`] if the value is not a `T`. The pool is
    /// left untouched in that case.
    pub fn put_any(&self, component: AnyComponent) -> Result<()> {
        match component.downcast::<T>() {
            Ok(component) => {
                self.put(component);
                Ok(())
            }
            Err(other) => Err(EcsError::TypeMismatch {
                expected: T::type_name(),
                found: other.type_name(),
            }),
        }
    }

    /// Current free-list length
    pub fn size(&self) -> usize {
        self.free.lock().len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.free.lock().is_empty()
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        self.stats.lock().clone()
    }

    /// Get the pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Drop every pooled instance
    pub fn clear(&self) {
        self.free.lock().clear();
        self.stats.lock().pool_size = 0;
    }
}

impl<T: Component> Default for ComponentPool<T> {
    fn default() -> Self {
        Self::new()
    }
}
