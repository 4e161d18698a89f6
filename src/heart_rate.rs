//! Heart rate estimation (rPPG)
//!
//! Streaming estimator that turns per-frame color samples into beats per
//! minute: buffer → green channel → normalization → moving-average high-pass
//! → peak detection → peak spacing → BPM, with a flagged fallback when the
//! peaks are inconclusive.
//!
//! The estimator never reads the wall clock. Capture cadence and measurement
//! cadence are driven by the caller through [`HeartRateEstimator::should_sample`]
//! and [`HeartRateEstimator::tick`].

use crate::buffer::{SampleBuffer, DEFAULT_COLOR_CAPACITY};
use crate::dsp;
use crate::error::ComputeError;
use crate::types::{ColorSample, HeartRateReading};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Number of recent measured readings used to steady the fallback
const FALLBACK_HISTORY: usize = 5;

/// Heart rate estimator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartRateConfig {
    /// Color buffer capacity (samples)
    pub buffer_capacity: usize,
    /// Minimum time between processed frames (ms)
    pub processing_interval_ms: f64,
    /// Time between heart rate computations (ms)
    pub measurement_interval_ms: f64,
    /// Minimum buffered samples before a reading is attempted
    pub min_samples_to_score: usize,
    /// Nominal capture rate (Hz)
    pub sampling_frequency_hz: f64,
    /// Lower edge of the heart-rate band (Hz)
    pub low_cutoff_hz: f64,
    /// Upper edge of the heart-rate band (Hz)
    pub high_cutoff_hz: f64,
    /// Minimum normalized amplitude of an accepted peak
    pub peak_amplitude_floor: f64,
    /// Minimum time between accepted peaks (s)
    pub min_peak_spacing_sec: f64,
    /// Plausible range of a measured reading (BPM)
    pub min_bpm: f64,
    pub max_bpm: f64,
    /// Range of the fallback estimate (BPM)
    pub fallback_min_bpm: f64,
    pub fallback_max_bpm: f64,
}

impl Default for HeartRateConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_COLOR_CAPACITY,
            processing_interval_ms: 200.0,
            measurement_interval_ms: 2000.0,
            min_samples_to_score: 60,
            sampling_frequency_hz: 30.0,
            low_cutoff_hz: 0.75,
            high_cutoff_hz: 4.0,
            peak_amplitude_floor: 0.1,
            min_peak_spacing_sec: 0.3,
            min_bpm: 40.0,
            max_bpm: 200.0,
            fallback_min_bpm: 60.0,
            fallback_max_bpm: 100.0,
        }
    }
}

/// Producer of color samples (the frame sampler)
pub trait ColorSampleSource {
    /// Whether the source is attached and delivering frames
    fn is_ready(&self) -> bool;

    /// Next available sample, if a frame is ready
    fn next_sample(&mut self) -> Option<ColorSample>;
}

/// Source fed by the host: samples are pushed in and pulled by the estimator
#[derive(Debug, Default)]
pub struct ExternalFeed {
    pending: Option<ColorSample>,
}

impl ExternalFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer the latest frame; replaces any frame not yet consumed
    pub fn offer(&mut self, sample: ColorSample) {
        self.pending = Some(sample);
    }
}

impl ColorSampleSource for ExternalFeed {
    fn is_ready(&self) -> bool {
        true
    }

    fn next_sample(&mut self) -> Option<ColorSample> {
        self.pending.take()
    }
}

/// Streaming rPPG heart rate estimator
#[derive(Debug, Clone)]
pub struct HeartRateEstimator {
    config: HeartRateConfig,
    buffer: SampleBuffer<ColorSample>,
    is_running: bool,
    last_processed_time: Option<f64>,
    last_measurement_time: Option<f64>,
    measured_history: SampleBuffer<u32>,
}

impl Default for HeartRateEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl HeartRateEstimator {
    /// Create an estimator with default settings
    pub fn new() -> Self {
        Self::with_config(HeartRateConfig::default())
    }

    pub fn with_config(config: HeartRateConfig) -> Self {
        Self {
            buffer: SampleBuffer::new(config.buffer_capacity),
            config,
            is_running: false,
            last_processed_time: None,
            last_measurement_time: None,
            measured_history: SampleBuffer::new(FALLBACK_HISTORY),
        }
    }

    /// Reset the buffer and start accepting samples from `source`
    ///
    /// Fails with [`ComputeError::NotReady`] when the source is not attached.
    pub fn initialize(&mut self, source: &dyn ColorSampleSource) -> Result<(), ComputeError> {
        if !source.is_ready() {
            return Err(ComputeError::NotReady(
                "no color sample source attached".to_string(),
            ));
        }

        self.buffer.clear();
        self.last_processed_time = None;
        self.last_measurement_time = None;
        self.is_running = true;
        debug!(
            capacity = self.buffer.capacity(),
            "heart rate estimator initialized"
        );
        Ok(())
    }

    /// Halt ingestion and scoring; buffered samples are kept
    pub fn stop(&mut self) {
        self.is_running = false;
        self.last_measurement_time = None;
        debug!(buffered = self.buffer.len(), "heart rate estimator stopped");
    }

    /// Clear all buffered state; configuration is kept
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.measured_history.clear();
        self.last_processed_time = None;
        self.last_measurement_time = None;
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffer(&self) -> &SampleBuffer<ColorSample> {
        &self.buffer
    }

    pub fn config(&self) -> &HeartRateConfig {
        &self.config
    }

    /// Capture-side throttle: true at most once per `processing_interval_ms`
    ///
    /// Records `now` as the last processed time when it returns true.
    pub fn should_sample(&mut self, now: f64) -> bool {
        let due = match self.last_processed_time {
            Some(last) => now - last >= self.config.processing_interval_ms,
            None => true,
        };
        if due {
            self.last_processed_time = Some(now);
        }
        due
    }

    /// Pull one sample from `source` if the capture throttle allows it
    pub fn poll_source(&mut self, source: &mut dyn ColorSampleSource, now: f64) -> bool {
        if !self.is_running || !self.should_sample(now) {
            return false;
        }
        match source.next_sample() {
            Some(sample) => self.ingest_sample(sample),
            None => false,
        }
    }

    /// Append a sample to the buffer
    ///
    /// No-op while stopped. Samples with non-finite values are dropped.
    /// Returns whether the sample was buffered.
    pub fn ingest_sample(&mut self, sample: ColorSample) -> bool {
        if !self.is_running {
            return false;
        }
        if !sample.is_finite() {
            warn!(t = sample.t, "dropping non-finite color sample");
            return false;
        }
        if let Some(evicted) = self.buffer.push(sample) {
            trace!(evicted_t = evicted.t, "color buffer full, evicted oldest");
        }
        true
    }

    /// Scheduler tick: computes a reading at most once per
    /// `measurement_interval_ms`
    ///
    /// The first tick after start anchors the cadence. A due slot with fewer
    /// than `min_samples_to_score` samples is consumed without a reading.
    pub fn tick(&mut self, now: f64) -> Option<HeartRateReading> {
        if !self.is_running {
            return None;
        }

        match self.last_measurement_time {
            None => {
                self.last_measurement_time = Some(now);
                return None;
            }
            Some(last) if now - last < self.config.measurement_interval_ms => return None,
            Some(_) => self.last_measurement_time = Some(now),
        }

        if self.buffer.len() < self.config.min_samples_to_score {
            trace!(buffered = self.buffer.len(), "skipping heart rate slot");
            return None;
        }

        Some(self.compute_heart_rate())
    }

    /// Compute a heart rate reading from the buffered samples
    pub fn compute_heart_rate(&mut self) -> HeartRateReading {
        let latest_t = self.buffer.latest().map(|s| s.t).unwrap_or(0.0);

        if self.buffer.len() < self.config.min_samples_to_score {
            return HeartRateReading::not_ready(latest_t);
        }

        let green = dsp::green_channel(self.buffer.iter());
        let normalized = dsp::normalize(&green);
        let fs = self.config.sampling_frequency_hz;
        let half_width = dsp::highpass_half_width(fs, self.config.low_cutoff_hz);
        let filtered = dsp::moving_average_highpass(&normalized, half_width);
        let min_distance = dsp::min_peak_distance(fs, self.config.min_peak_spacing_sec);
        let peaks = dsp::find_peaks(&filtered, self.config.peak_amplitude_floor, min_distance);

        let peak_times: Vec<f64> = peaks
            .iter()
            .filter_map(|&i| self.buffer.get(i).map(|s| s.t))
            .collect();

        match dsp::bpm_from_peak_times(&peak_times) {
            Some(bpm) if bpm >= self.config.min_bpm && bpm <= self.config.max_bpm => {
                let bpm = bpm.round() as u32;
                self.measured_history.push(bpm);
                debug!(bpm, peaks = peaks.len(), "heart rate measured");
                HeartRateReading::measured(bpm, latest_t, peaks.len())
            }
            candidate => {
                let bpm = self.fallback_bpm(latest_t);
                debug!(
                    ?candidate,
                    peaks = peaks.len(),
                    fallback = bpm,
                    "peak estimate inconclusive, using fallback"
                );
                HeartRateReading::fallback(bpm, latest_t, peaks.len())
            }
        }
    }

    /// Low-confidence estimate within the resting range
    ///
    /// Mean of the recent measured readings when there are any, otherwise a
    /// slow oscillation around 80 BPM keyed on the sample clock.
    fn fallback_bpm(&self, latest_t: f64) -> u32 {
        let estimate = if self.measured_history.is_empty() {
            80.0 + 10.0 * (latest_t / 1000.0).sin()
        } else {
            self.measured_history.iter().map(|&b| b as f64).sum::<f64>()
                / self.measured_history.len() as f64
        };

        let estimate = if estimate.is_finite() { estimate } else { 80.0 };
        estimate
            .clamp(self.config.fallback_min_bpm, self.config.fallback_max_bpm)
            .round() as u32
    }
}
