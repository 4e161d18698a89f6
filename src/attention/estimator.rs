//! Streaming attention estimator

use super::blink::BlinkDetector;
use super::gaze::estimate_gaze;
use super::scoring::{attention_score, smoothed_score, AttentionFeatures};
use super::segmentation::MovementSegmenter;
use super::AttentionConfig;
use crate::buffer::SampleBuffer;
use crate::types::{
    AttentionMetrics, AttentionSample, BlinkState, EyeSample, Fixation, GazeReading, Saccade,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Outputs produced by one ingested sample
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AttentionUpdate {
    /// Present when the sample completed a valid scoring window
    pub metrics: Option<AttentionMetrics>,
    /// Present when a gaze direction could be determined
    pub gaze: Option<GazeReading>,
}

/// Attention and gaze estimator for a single eye-landmark stream
#[derive(Debug, Clone)]
pub struct AttentionEstimator {
    config: AttentionConfig,
    buffer: SampleBuffer<EyeSample>,
    blinks: BlinkDetector,
    segmenter: MovementSegmenter,
    history: SampleBuffer<AttentionSample>,
}

impl Default for AttentionEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl AttentionEstimator {
    pub fn new() -> Self {
        Self::with_config(AttentionConfig::default())
    }

    pub fn with_config(config: AttentionConfig) -> Self {
        Self {
            buffer: SampleBuffer::new(config.buffer_capacity),
            blinks: BlinkDetector::new(config.blink_threshold, config.blink_refractory_ms),
            segmenter: MovementSegmenter::new(
                config.saccade_threshold,
                config.fixation_gap_ms,
                config.max_fixations,
                config.max_saccades,
            ),
            history: SampleBuffer::new(config.max_history),
            config,
        }
    }

    /// Buffer a sample and run blink detection, segmentation, scoring and gaze
    ///
    /// Samples without landmarks are buffered but produce no events. Samples
    /// with a non-finite timestamp are dropped.
    pub fn ingest_sample(&mut self, sample: EyeSample) -> AttentionUpdate {
        if !sample.t.is_finite() {
            warn!("dropping eye sample with non-finite timestamp");
            return AttentionUpdate::default();
        }

        let t = sample.t;
        let gaze = estimate_gaze(&sample).map(|gaze_direction| GazeReading {
            gaze_direction,
            timestamp: t,
        });

        if self.buffer.push(sample).is_some() {
            trace!("eye buffer full, evicted oldest");
        }

        if let Some(latest) = self.buffer.latest() {
            self.blinks.observe(latest);
        }
        self.segmenter.observe(&self.buffer);

        let metrics = self.score(t);
        AttentionUpdate { metrics, gaze }
    }

    /// Score the trailing window ending at `now`, appending to the history
    fn score(&mut self, now: f64) -> Option<AttentionMetrics> {
        if !self.can_score() {
            return None;
        }

        let features = self.features(now);
        let raw = attention_score(&features);
        self.history.push(AttentionSample {
            timestamp: now,
            score: raw,
        });

        let attention_score = smoothed_score(
            self.history.iter().map(|s| s.score),
            self.config.smoothing_window,
        )?;
        debug!(raw, smoothed = attention_score, "attention scored");

        Some(Self::metrics(attention_score, &features, now))
    }

    /// Windowed metrics at `now` without touching the history
    ///
    /// Smooths over the existing history plus the fresh raw score. `None`
    /// until enough samples and fixations have been collected.
    pub fn current_metrics(&self, now: f64) -> Option<AttentionMetrics> {
        if !self.can_score() {
            return None;
        }

        let features = self.features(now);
        let raw = attention_score(&features);
        let scores: Vec<f64> = self
            .history
            .iter()
            .map(|s| s.score)
            .chain(std::iter::once(raw))
            .collect();
        let attention_score = smoothed_score(scores, self.config.smoothing_window)?;

        Some(Self::metrics(attention_score, &features, now))
    }

    fn can_score(&self) -> bool {
        self.buffer.len() >= self.config.min_samples_to_score
            && self.segmenter.fixations().len() >= self.config.min_fixations_to_score
    }

    fn features(&self, now: f64) -> AttentionFeatures {
        let window = self.config.scoring_window_ms;

        let (fixation_count, total_duration) = self
            .segmenter
            .fixations()
            .within_window(now, window)
            .fold((0usize, 0.0), |(count, total), f| (count + 1, total + f.duration));
        let avg_fixation_duration = if fixation_count > 0 {
            total_duration / fixation_count as f64
        } else {
            0.0
        };

        let saccade_count = self.segmenter.saccades().within_window(now, window).count();
        let blink_rate =
            self.blinks.blink_count() as f64 * self.config.blinks_per_minute_factor();

        AttentionFeatures {
            fixation_count,
            avg_fixation_duration,
            saccade_count,
            blink_rate,
        }
    }

    fn metrics(attention_score: u8, features: &AttentionFeatures, now: f64) -> AttentionMetrics {
        AttentionMetrics {
            attention_score,
            fixation_count: features.fixation_count,
            avg_fixation_duration: features.avg_fixation_duration,
            saccade_count: features.saccade_count,
            blink_rate: features.blink_rate,
            timestamp: now,
        }
    }

    /// Clear samples, events, blink counters and history; keeps configuration
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.blinks.reset();
        self.segmenter.reset();
        self.history.clear();
    }

    pub fn blink_state(&self) -> BlinkState {
        self.blinks.state()
    }

    pub fn fixations(&self) -> &SampleBuffer<Fixation> {
        self.segmenter.fixations()
    }

    pub fn saccades(&self) -> &SampleBuffer<Saccade> {
        self.segmenter.saccades()
    }

    pub fn attention_history(&self) -> &SampleBuffer<AttentionSample> {
        &self.history
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn config(&self) -> &AttentionConfig {
        &self.config
    }
}
