//! Attention and gaze estimation
//!
//! Eye-landmark samples flow through four stages on every ingest:
//! - [`blink`]: eyelid closure counting with a refractory window
//! - [`segmentation`]: fixation/saccade segmentation of iris movement
//! - [`scoring`]: heuristic 0-100 attention score over a trailing window
//! - [`gaze`]: per-sample gaze direction
//!
//! [`AttentionEstimator`] owns the buffers and drives the stages in order.

pub mod blink;
pub mod estimator;
pub mod gaze;
pub mod scoring;
pub mod segmentation;

pub use blink::BlinkDetector;
pub use estimator::{AttentionEstimator, AttentionUpdate};
pub use gaze::estimate_gaze;
pub use scoring::{attention_score, smoothed_score, AttentionFeatures};
pub use segmentation::{MovementEvent, MovementSegmenter};

use crate::buffer::DEFAULT_EYE_CAPACITY;
use serde::{Deserialize, Serialize};

/// Attention estimator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionConfig {
    /// Eye buffer capacity (samples)
    pub buffer_capacity: usize,
    /// Average openness below which the eyes count as closed
    pub blink_threshold: f64,
    /// Minimum time between two counted blinks (ms)
    pub blink_refractory_ms: f64,
    /// Mean iris displacement above which movement is a saccade
    pub saccade_threshold: f64,
    /// Maximum gap for a sample to extend the current fixation (ms)
    pub fixation_gap_ms: f64,
    /// Reserved minimum fixation duration (ms); segmentation does not apply it
    pub min_duration_ms: f64,
    /// Trailing window used for scoring (ms)
    pub scoring_window_ms: f64,
    /// Minimum buffered samples before scoring
    pub min_samples_to_score: usize,
    /// Minimum recorded fixations before scoring
    pub min_fixations_to_score: usize,
    pub max_fixations: usize,
    pub max_saccades: usize,
    /// Attention history length
    pub max_history: usize,
    /// History entries averaged into the emitted score
    pub smoothing_window: usize,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_EYE_CAPACITY,
            blink_threshold: 0.2,
            blink_refractory_ms: 500.0,
            saccade_threshold: 0.01,
            fixation_gap_ms: 100.0,
            min_duration_ms: 100.0,
            scoring_window_ms: 5000.0,
            min_samples_to_score: 30,
            min_fixations_to_score: 2,
            max_fixations: 20,
            max_saccades: 20,
            max_history: 30,
            smoothing_window: 5,
        }
    }
}

impl AttentionConfig {
    /// Blink-count multiplier extrapolating the scoring window to a minute
    pub fn blinks_per_minute_factor(&self) -> f64 {
        if self.scoring_window_ms > 0.0 {
            60_000.0 / self.scoring_window_ms
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_extrapolates_by_twelve() {
        assert_eq!(AttentionConfig::default().blinks_per_minute_factor(), 12.0);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AttentionConfig =
            serde_json::from_str(r#"{"blink_threshold": 0.3}"#).unwrap();
        assert_eq!(config.blink_threshold, 0.3);
        assert_eq!(config.max_history, 30);
    }
}
