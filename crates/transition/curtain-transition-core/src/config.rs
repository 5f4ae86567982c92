//! Engine-wide configuration.

use serde::{Deserialize, Serialize};

/// Configuration for one engine (one independent simulation).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Samples per segment when measuring bezier segment lengths.
    pub dynamic_path_sampling: usize,

    /// How many times a single tick may re-enter an item's update through
    /// immediate-close loop modes before it is treated as misconfigured.
    pub max_loop_reentrancy: u32,

    /// Remaining delay below this is treated as expired.
    pub delay_epsilon: f32,

    /// Seed for the `random` chain direction.
    pub random_seed: u64,

    /// Emit closed-state effect values when an item is added.
    pub emit_initial_effects: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dynamic_path_sampling: 25,
            max_loop_reentrancy: 8,
            delay_epsilon: 1e-5,
            random_seed: 0x5eed,
            emit_initial_effects: true,
        }
    }
}
