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
//! Breathing components
//!
//! A [`Lung`] fills and empties at a fixed rate while its [`Mouth`] opens and
//! closes with the breathing cycle. Both are driven by
//! [`BreathingSystem`](crate::ecs::systems::BreathingSystem).

use crate::ecs::Component;
use serde::{Deserialize, Serialize};

/// Direction a lung is currently moving air
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LungState {
    /// Volume is falling towards zero
    #[default]
    Exhale,
    /// Volume is rising towards capacity
    Inhale,
}

/// Air held by an entity
///
/// # Examples
///
/// ```
/// use ecs_runtime::ecs::components::{Lung, LungState};
///
/// let lung = Lung::new(1.0);
/// assert_eq!(lung.volume, 0.0);
/// assert_eq!(lung.state, LungState::Inhale);
/// assert!(lung.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Lung {
    /// Maximum volume
    pub capacity: f64,
    /// Current volume, within `0.0..=capacity`
    pub volume: f64,
    /// Current direction
    pub state: LungState,
}

impl Lung {
    /// An empty lung about to inhale
    pub fn new(capacity: f64) -> Self {
        Lung {
            capacity,
            volume: 0.0,
            state: LungState::Inhale,
        }
    }

    /// A lung in an arbitrary state
    pub fn with_state(capacity: f64, volume: f64, state: LungState) -> Self {
        Lung {
            capacity,
            volume,
            state,
        }
    }

    /// Fraction of capacity in use, 0 for a zero-capacity lung
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity > 0.0 {
            self.volume / self.capacity
        } else {
            0.0
        }
    }

    /// Check that the values are finite and the volume within capacity
    pub fn is_valid(&self) -> bool {
        self.capacity.is_finite()
            && self.volume.is_finite()
            && self.capacity >= 0.0
            && (0.0..=self.capacity).contains(&self.volume)
    }
}

impl Component for Lung {
    fn type_name() -> &'static str {
        "Lung"
    }
}

/// Whether an entity's mouth is open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mouth {
    /// `true` while air can pass
    pub is_open: bool,
}

impl Mouth {
    /// Create a mouth
    pub fn new(is_open: bool) -> Self {
        Mouth { is_open }
    }
}

impl Component for Mouth {
    fn type_name() -> &'static str {
        "Mouth"
    }
}
