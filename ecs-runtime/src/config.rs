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
//! World configuration
//!
//! [`WorldConfig`] is built in code with the builder methods below or read
//! from the process environment with [`WorldConfig::from_env`].

use crate::pool::PoolConfig;

/// Environment variable holding the scheduler's worker thread count
pub const WORKER_THREADS_VAR: &str = "ECS_WORKER_THREADS";

/// Settings applied when a [`World`](crate::World) is created
#[derive(Debug, Clone, Default)]
pub struct WorldConfig {
    /// Settings shared by every component pool
    pub pool: PoolConfig,
    /// Size of a dedicated scheduler pool; `None` uses Rayon's global pool
    pub worker_threads: Option<usize>,
}

impl WorldConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from the environment
    ///
    /// Unparseable or zero values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(WORKER_THREADS_VAR) {
            config.worker_threads = parse_threads(&raw);
        }
        config
    }

    /// Use these pool settings
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Run systems on a dedicated pool of `threads` workers
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }
}

fn parse_threads(raw: &str) -> Option<usize> {
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => {
            log::warn!("ignoring invalid {}={:?}", WORKER_THREADS_VAR, raw);
            None
        }
        Ok(threads) => Some(threads),
    }
}
