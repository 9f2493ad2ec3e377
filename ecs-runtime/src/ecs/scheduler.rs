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
//! System scheduler with parallel execution support
//!
//! Systems are layered into batches from their declared [`SystemAccess`].
//! Batches execute one after another with a join barrier in between; the
//! systems inside a batch never conflict and run in parallel on Rayon when
//! the `parallel` feature is enabled.
//!
//! A system lands in the first batch after the last batch that holds a
//! system it conflicts with, so two conflicting systems always keep their
//! registration order.

use crate::ecs::system::{System, SystemAccess, SystemContext};
use crate::ecs::EntityManager;
use crate::error::{EcsError, Result};
use crate::events::{Event, EventBus};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation flag shared between an update and its caller
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this token to stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check if [`cancel`](CancelToken::cancel) was called
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Statistics for one completed tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickStats {
    /// Index of the tick, starting at 0
    pub tick: u64,
    /// Wall time spent running systems
    pub duration: Duration,
    /// Number of batches executed
    pub batches: usize,
    /// Number of systems executed
    pub systems_run: usize,
}

/// A system with its cached access declaration
struct ScheduledSystem {
    system: Box<dyn System>,
    access: SystemAccess,
}

/// Layer systems into conflict-free batches
///
/// Returns indices into `accesses`, ascending within each batch.
pub fn build_plan(accesses: &[SystemAccess]) -> Vec<Vec<usize>> {
    let mut batches: Vec<Vec<usize>> = Vec::new();
    for (index, access) in accesses.iter().enumerate() {
        let earliest = batches
            .iter()
            .rposition(|batch| batch.iter().any(|&other| accesses[other].conflicts_with(access)))
            .map_or(0, |last| last + 1);
        match batches.get_mut(earliest) {
            Some(batch) => batch.push(index),
            None => batches.push(vec![index]),
        }
    }
    batches
}

/// Conflict-aware system scheduler
///
/// # Examples
///
/// ```
/// use ecs_runtime::ecs::{Scheduler, System, SystemContext};
/// use ecs_runtime::Result;
///
/// struct MySystem;
/// impl System for MySystem {
///     fn run(&mut self, _ctx: &SystemContext<'_>) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// let mut scheduler = Scheduler::new();
/// scheduler.add_system(MySystem);
/// assert_eq!(scheduler.batch_count(), 1);
/// ```
pub struct Scheduler {
    systems: Vec<ScheduledSystem>,
    plan: Option<Vec<Vec<usize>>>,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
    tick: u64,
}

impl Scheduler {
    /// Create a scheduler that runs on Rayon's global pool
    pub fn new() -> Self {
        Scheduler {
            systems: Vec::new(),
            plan: None,
            #[cfg(feature = "parallel")]
            pool: None,
            tick: 0,
        }
    }

    /// Create a scheduler with a dedicated pool of `threads` workers
    ///
    /// `None` uses Rayon's global pool. Without the `parallel` feature the
    /// thread count is ignored and every system runs on the caller's thread.
    ///
    /// # Errors
    ///
    /// [`EcsError::ThreadPool`] if the pool cannot be built.
    pub fn with_threads(threads: Option<usize>) -> Result<Self> {
        #[allow(unused_mut)]
        let mut scheduler = Self::new();
        if let Some(threads) = threads {
            #[cfg(feature = "parallel")]
            {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("ecs-worker-{}", i))
                    .build()
                    .map_err(|err| EcsError::ThreadPool(err.to_string()))?;
                log::info!("scheduler using {} worker threads", threads);
                scheduler.pool = Some(pool);
            }
            #[cfg(not(feature = "parallel"))]
            log::debug!("ignoring {} worker threads, parallel feature disabled", threads);
        }
        Ok(scheduler)
    }

    /// Register a system after all existing ones
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        let access = system.access();
        log::debug!("adding system `{}`", system.name());
        self.systems.push(ScheduledSystem {
            system: Box::new(system),
            access,
        });
        self.plan = None;
    }

    /// Get the number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Names of the registered systems in registration order
    pub fn system_names(&self) -> Vec<String> {
        self.systems
            .iter()
            .map(|s| s.system.name().to_string())
            .collect()
    }

    /// System names grouped by execution batch
    pub fn batches(&self) -> Vec<Vec<String>> {
        let plan = match &self.plan {
            Some(plan) => plan.clone(),
            None => build_plan(&self.accesses()),
        };
        plan.iter()
            .map(|batch| {
                batch
                    .iter()
                    .map(|&i| self.systems[i].system.name().to_string())
                    .collect()
            })
            .collect()
    }

    /// Get the number of batches a tick executes
    pub fn batch_count(&self) -> usize {
        match &self.plan {
            Some(plan) => plan.len(),
            None => build_plan(&self.accesses()).len(),
        }
    }

    /// Number of ticks started so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Remove every system
    pub fn clear(&mut self) {
        self.systems.clear();
        self.plan = None;
    }

    fn accesses(&self) -> Vec<SystemAccess> {
        self.systems.iter().map(|s| s.access.clone()).collect()
    }

    /// Run one tick
    ///
    /// The cancellation token is checked before every batch. A system that
    /// is already running is never interrupted: it sees the request only by
    /// polling [`SystemContext::is_cancelled`], so a system that never
    /// returns blocks the tick indefinitely. A failing or panicking system
    /// does not stop the other systems of its batch, but later batches are
    /// skipped and the first error in registration order is returned.
    pub fn run(
        &mut self,
        manager: &EntityManager,
        events: &EventBus<Event>,
        dt: f64,
        cancel: &CancelToken,
    ) -> Result<TickStats> {
        let start = Instant::now();
        let tick = self.tick;
        self.tick += 1;

        if self.plan.is_none() {
            self.plan = Some(build_plan(&self.accesses()));
        }
        let plan = self.plan.get_or_insert_with(Vec::new);
        let ctx = SystemContext::new(manager, events, dt, tick, cancel);

        let mut systems_run = 0;
        for batch in plan.iter() {
            if cancel.is_cancelled() {
                log::debug!("tick {} cancelled", tick);
                return Err(EcsError::Cancelled);
            }

            let mut members: Vec<&mut ScheduledSystem> = self
                .systems
                .iter_mut()
                .enumerate()
                .filter(|(index, _)| batch.binary_search(index).is_ok())
                .map(|(_, scheduled)| scheduled)
                .collect();
            systems_run += members.len();

            #[cfg(feature = "parallel")]
            let results: Vec<Result<()>> = if members.len() > 1 {
                use rayon::prelude::*;
                let mut run_batch = || -> Vec<Result<()>> {
                    members
                        .par_iter_mut()
                        .map(|scheduled| run_system(scheduled, &ctx))
                        .collect()
                };
                match &self.pool {
                    Some(pool) => pool.install(run_batch),
                    None => run_batch(),
                }
            } else {
                members
                    .iter_mut()
                    .map(|scheduled| run_system(scheduled, &ctx))
                    .collect()
            };

            #[cfg(not(feature = "parallel"))]
            let results: Vec<Result<()>> = members
                .iter_mut()
                .map(|scheduled| run_system(scheduled, &ctx))
                .collect();

            for result in results {
                result?;
            }
        }

        Ok(TickStats {
            tick,
            duration: start.elapsed(),
            batches: plan.len(),
            systems_run,
        })
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn run_system(scheduled: &mut ScheduledSystem, ctx: &SystemContext<'_>) -> Result<()> {
    let system = &mut scheduled.system;
    match panic::catch_unwind(AssertUnwindSafe(|| system.run(ctx))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(EcsError::Cancelled)) => Err(EcsError::Cancelled),
        Ok(Err(err)) => {
            log::warn!("system `{}` failed: {}", system.name(), err);
            Err(EcsError::SystemFailed {
                system: system.name().to_string(),
                source: Box::new(err),
            })
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::warn!("system `{}` panicked: {}", system.name(), message);
            Err(EcsError::SystemPanicked {
                system: system.name().to_string(),
                message,
            })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
