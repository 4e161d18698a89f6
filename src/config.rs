//! Processor configuration
//!
//! Every field has a default, so a partial JSON document only overrides the
//! values it names:
//!
//! ```json
//! {"heart_rate": {"sampling_frequency_hz": 25.0}, "attention": {"blink_threshold": 0.25}}
//! ```

use crate::attention::AttentionConfig;
use crate::dsp;
use crate::error::ComputeError;
use crate::heart_rate::HeartRateConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub heart_rate: HeartRateConfig,
    pub attention: AttentionConfig,
}

fn require(condition: bool, message: &str) -> Result<(), ComputeError> {
    if condition {
        Ok(())
    } else {
        Err(ComputeError::ConfigError(message.to_string()))
    }
}

impl VisionConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: VisionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that intervals, capacities and ranges are usable
    pub fn validate(&self) -> Result<(), ComputeError> {
        let hr = &self.heart_rate;
        require(hr.buffer_capacity > 0, "heart_rate.buffer_capacity must be positive")?;
        require(
            hr.min_samples_to_score <= hr.buffer_capacity,
            "heart_rate.min_samples_to_score cannot exceed buffer_capacity",
        )?;
        require(
            hr.processing_interval_ms >= 0.0,
            "heart_rate.processing_interval_ms must not be negative",
        )?;
        require(
            hr.measurement_interval_ms > 0.0,
            "heart_rate.measurement_interval_ms must be positive",
        )?;
        require(
            hr.sampling_frequency_hz > 0.0,
            "heart_rate.sampling_frequency_hz must be positive",
        )?;
        require(
            hr.low_cutoff_hz > 0.0 && hr.low_cutoff_hz < hr.high_cutoff_hz,
            "heart_rate cutoffs must satisfy 0 < low_cutoff_hz < high_cutoff_hz",
        )?;
        require(
            dsp::highpass_half_width(hr.sampling_frequency_hz, hr.low_cutoff_hz)
                <= hr.buffer_capacity,
            "heart_rate filter window (fs / low_cutoff_hz * 2) cannot exceed buffer_capacity",
        )?;
        require(
            hr.min_bpm > 0.0 && hr.min_bpm < hr.max_bpm,
            "heart_rate must satisfy 0 < min_bpm < max_bpm",
        )?;
        require(
            hr.fallback_min_bpm <= hr.fallback_max_bpm
                && hr.fallback_min_bpm >= hr.min_bpm
                && hr.fallback_max_bpm <= hr.max_bpm,
            "heart_rate fallback range must lie within [min_bpm, max_bpm]",
        )?;

        let at = &self.attention;
        require(at.buffer_capacity > 0, "attention.buffer_capacity must be positive")?;
        require(
            at.min_samples_to_score <= at.buffer_capacity,
            "attention.min_samples_to_score cannot exceed buffer_capacity",
        )?;
        require(
            at.scoring_window_ms > 0.0,
            "attention.scoring_window_ms must be positive",
        )?;
        require(
            at.blink_refractory_ms >= 0.0 && at.fixation_gap_ms >= 0.0,
            "attention intervals must not be negative",
        )?;
        require(
            at.saccade_threshold >= 0.0,
            "attention.saccade_threshold must not be negative",
        )?;
        require(
            at.max_fixations > 0 && at.max_saccades > 0 && at.max_history > 0,
            "attention histories must hold at least one entry",
        )?;
        require(
            at.smoothing_window > 0,
            "attention.smoothing_window must be positive",
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_valid() {
        assert!(VisionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let config = VisionConfig::from_json(
            r#"{"heart_rate": {"sampling_frequency_hz": 25.0}}"#,
        )
        .unwrap();
        assert_eq!(config.heart_rate.sampling_frequency_hz, 25.0);
        assert_eq!(config.heart_rate.buffer_capacity, 150);
        assert_eq!(config.attention, AttentionConfig::default());
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(VisionConfig::from_json("{}").unwrap(), VisionConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let json = VisionConfig::default().to_json().unwrap();
        assert_eq!(VisionConfig::from_json(&json).unwrap(), VisionConfig::default());
    }

    #[test]
    fn test_rejects_inverted_bpm_range() {
        let result =
            VisionConfig::from_json(r#"{"heart_rate": {"min_bpm": 200.0, "max_bpm": 40.0}}"#);
        assert!(matches!(result, Err(ComputeError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_filter_window_longer_than_buffer() {
        let mut config = VisionConfig::default();
        config.heart_rate.low_cutoff_hz = 1e-30;
        assert!(matches!(config.validate(), Err(ComputeError::ConfigError(_))));

        let mut config = VisionConfig::default();
        config.heart_rate.sampling_frequency_hz = 1e300;
        config.heart_rate.high_cutoff_hz = 1e301;
        assert!(matches!(config.validate(), Err(ComputeError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_zero_window() {
        let mut config = VisionConfig::default();
        config.attention.scoring_window_ms = 0.0;
        assert!(matches!(config.validate(), Err(ComputeError::ConfigError(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            VisionConfig::from_json("{not json"),
            Err(ComputeError::JsonError(_))
        ));
    }
}
