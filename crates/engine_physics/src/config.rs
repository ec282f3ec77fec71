//! Physics configuration.

use serde::{Deserialize, Serialize};

/// Tuning for [`Physics`](crate::Physics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Collision-resolution passes allowed per move. When exhausted the body
    /// simply stops where it is.
    pub max_iterations: u32,
    /// Longest distance covered by one substep, in world units.
    pub max_substep: f32,
    /// Remaining movement below this on both axes counts as done.
    pub epsilon: f32,
    /// Downward probe distance for [`Physics::is_grounded`](crate::Physics::is_grounded).
    pub ground_epsilon: f32,
    /// Hard bound on collision-free substeps per move.
    pub max_substeps: u32,
}

impl PhysicsConfig {
    /// Override the collision-resolution pass limit.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Override the ground probe distance.
    #[must_use]
    pub fn with_ground_epsilon(mut self, ground_epsilon: f32) -> Self {
        self.ground_epsilon = ground_epsilon;
        self
    }

    /// Override the free substep bound.
    #[must_use]
    pub fn with_max_substeps(mut self, max_substeps: u32) -> Self {
        self.max_substeps = max_substeps;
        self
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_substep: 1.0,
            epsilon: 1e-4,
            ground_epsilon: 0.01,
            max_substeps: 4096,
        }
    }
}
