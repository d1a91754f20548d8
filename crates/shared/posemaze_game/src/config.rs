use serde::{Deserialize, Serialize};

use crate::error::GameError;

fn default_confidence_threshold() -> f32 {
    0.7
}

fn default_stability_frames() -> usize {
    3
}

fn default_move_interval_ms() -> u64 {
    400
}

fn default_goal_reset_delay_ms() -> u64 {
    100
}

/// Tunables for the prediction-to-move pipeline.
///
/// Grid size and wall layout are compile-time constants in [`crate::maze`];
/// only the timing and gating knobs are configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Minimum probability a sample needs before it can be committed.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Size of the stability window (consecutive identical samples).
    #[serde(default = "default_stability_frames")]
    pub stability_frames: usize,

    /// Minimum wall-clock time between two accepted moves.
    #[serde(default = "default_move_interval_ms")]
    pub move_interval_ms: u64,

    /// Feedback pause between reaching the goal and the automatic reset.
    #[serde(default = "default_goal_reset_delay_ms")]
    pub goal_reset_delay_ms: u64,

    /// Host-side inference watchdog; 0 disables it.
    #[serde(default)]
    pub inference_timeout_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            stability_frames: default_stability_frames(),
            move_interval_ms: default_move_interval_ms(),
            goal_reset_delay_ms: default_goal_reset_delay_ms(),
            inference_timeout_ms: 0,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(GameError::Config(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.stability_frames == 0 {
            return Err(GameError::Config(
                "stability_frames must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
