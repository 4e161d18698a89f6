//! Pipeline orchestration
//!
//! [`VisionProcessor`] is the composition root: it owns one heart rate
//! estimator, one attention estimator and the sink their metrics go to.
//! Record routing:
//! 1. Color records feed the heart rate estimator
//! 2. Eye records feed the attention estimator (gaze, then attention)
//! 3. `tick(now)` runs the heart rate measurement cadence

use crate::attention::AttentionEstimator;
use crate::config::VisionConfig;
use crate::emitter::{CollectingSink, MetricSink};
use crate::encoder::MetricEncoder;
use crate::error::ComputeError;
use crate::heart_rate::{ExternalFeed, HeartRateEstimator};
use crate::schema::{FrameReader, FrameRecord};
use crate::types::{HeartRateReading, MetricEvent};
use tracing::{debug, info};

/// Run an NDJSON frame stream through a fresh processor.
///
/// The heart rate cadence is driven by the capture time of each color
/// record. Returns one encoded metric envelope per line, in emission order.
///
/// # Example
/// ```ignore
/// let lines = samples_to_metrics(ndjson)?;
/// ```
pub fn samples_to_metrics(ndjson: &str) -> Result<Vec<String>, ComputeError> {
    let records = FrameReader::parse_ndjson(ndjson)?;
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let mut processor = VisionProcessor::with_defaults();
    processor.start()?;
    for record in records {
        processor.process_and_tick(record)?;
    }
    processor.drain_encoded()
}

/// Stateful processor for streaming frame records.
pub struct VisionProcessor {
    config: VisionConfig,
    heart_rate: HeartRateEstimator,
    attention: AttentionEstimator,
    sink: Box<dyn MetricSink>,
    encoder: MetricEncoder,
}

impl Default for VisionProcessor {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl VisionProcessor {
    /// Create a processor that delivers metrics to `sink`
    pub fn new(config: VisionConfig, sink: Box<dyn MetricSink>) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self::build(config, sink))
    }

    /// Default configuration, metrics held until drained
    pub fn with_defaults() -> Self {
        Self::build(VisionConfig::default(), Box::new(CollectingSink::new()))
    }

    fn build(config: VisionConfig, sink: Box<dyn MetricSink>) -> Self {
        Self {
            heart_rate: HeartRateEstimator::with_config(config.heart_rate.clone()),
            attention: AttentionEstimator::with_config(config.attention.clone()),
            config,
            sink,
            encoder: MetricEncoder::new(),
        }
    }

    /// Start accepting color samples
    pub fn start(&mut self) -> Result<(), ComputeError> {
        self.heart_rate.initialize(&ExternalFeed::new())?;
        info!("vision processor started");
        Ok(())
    }

    /// Validate and route one record, emitting any metrics it completes
    pub fn process_record(&mut self, record: FrameRecord) -> Result<(), ComputeError> {
        record
            .validate()
            .map_err(|e| ComputeError::InvalidSample(e.to_string()))?;

        match record {
            FrameRecord::Color(sample) => {
                self.heart_rate.ingest_sample(sample);
            }
            FrameRecord::Eye(sample) => {
                let update = self.attention.ingest_sample(sample);
                if let Some(gaze) = update.gaze {
                    self.sink.emit(MetricEvent::Gaze(gaze));
                }
                if let Some(metrics) = update.metrics {
                    self.sink.emit(MetricEvent::Attention(metrics));
                }
            }
        }
        Ok(())
    }

    /// Process a record, then tick the heart rate cadence at its capture time
    /// when it is a color record
    pub fn process_and_tick(&mut self, record: FrameRecord) -> Result<(), ComputeError> {
        let color_time = match &record {
            FrameRecord::Color(sample) => Some(sample.t),
            FrameRecord::Eye(_) => None,
        };
        self.process_record(record)?;
        if let Some(now) = color_time {
            self.tick(now);
        }
        Ok(())
    }

    /// Heart rate scheduler tick; emits and returns a reading when one is due
    pub fn tick(&mut self, now: f64) -> Option<HeartRateReading> {
        let reading = self.heart_rate.tick(now)?;
        debug!(bpm = reading.bpm, status = ?reading.status, "heart rate emitted");
        self.sink.emit(MetricEvent::HeartRate(reading));
        Some(reading)
    }

    /// Stop heart rate ingestion; buffered state is kept
    pub fn stop(&mut self) {
        self.heart_rate.stop();
        info!("vision processor stopped");
    }

    /// Clear both estimators; configuration and run state are kept
    pub fn reset(&mut self) {
        self.heart_rate.reset();
        self.attention.reset();
    }

    /// Take the metrics held by the sink
    pub fn drain_events(&mut self) -> Vec<MetricEvent> {
        self.sink.drain()
    }

    /// Take the held metrics as encoded envelope lines
    pub fn drain_encoded(&mut self) -> Result<Vec<String>, ComputeError> {
        self.drain_events()
            .into_iter()
            .map(|event| self.encoder.encode_to_json(event))
            .collect()
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    pub fn heart_rate(&self) -> &HeartRateEstimator {
        &self.heart_rate
    }

    pub fn attention(&self) -> &AttentionEstimator {
        &self.attention
    }

    pub fn encoder(&self) -> &MetricEncoder {
        &self.encoder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::ChannelSink;
    use crate::types::{ColorSample, EyeSample, EyeState, MeasurementStatus, Point3};
    use std::f64::consts::PI;

    fn color(i: usize) -> FrameRecord {
        let g = 128.0 + 10.0 * (2.0 * PI * 1.2 * i as f64 / 30.0).sin();
        FrameRecord::Color(ColorSample::new(100.0, g, 90.0, i as f64 * 1000.0 / 30.0))
    }

    fn eye(i: usize) -> FrameRecord {
        let eye = EyeState::open(Point3::new(0.5, 0.5, 0.0), Point3::new(0.51, 0.5, 0.0));
        FrameRecord::Eye(EyeSample::new(eye, eye, i as f64 * 1000.0 / 30.0))
    }

    fn sample_ndjson(frames: usize) -> String {
        (0..frames)
            .flat_map(|i| [color(i), eye(i)])
            .map(|record| serde_json::to_string(&record).unwrap())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_heart_rate_emitted_on_cadence() {
        let mut processor = VisionProcessor::with_defaults();
        processor.start().unwrap();
        for i in 0..150 {
            processor.process_and_tick(color(i)).unwrap();
        }

        let readings: Vec<HeartRateReading> = processor
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                MetricEvent::HeartRate(reading) => Some(reading),
                _ => None,
            })
            .collect();

        // 5 seconds of frames, one measurement every 2 seconds
        assert_eq!(readings.len(), 2);
        for reading in readings {
            assert_eq!(reading.status, MeasurementStatus::Measured);
            assert!((reading.bpm as i64 - 72).abs() <= 10, "bpm was {}", reading.bpm);
        }
    }

    #[test]
    fn test_gaze_emitted_per_eye_record() {
        let mut processor = VisionProcessor::with_defaults();
        for i in 0..5 {
            processor.process_record(eye(i)).unwrap();
        }
        let events = processor.drain_events();
        assert_eq!(events.len(), 5);
        assert!(events.iter().all(|event| event.name() == "gaze"));
    }

    #[test]
    fn test_color_ignored_before_start() {
        let mut processor = VisionProcessor::with_defaults();
        processor.process_record(color(0)).unwrap();
        assert_eq!(processor.heart_rate().buffer_len(), 0);
    }

    #[test]
    fn test_invalid_record_rejected() {
        let mut processor = VisionProcessor::with_defaults();
        let record = FrameRecord::Color(ColorSample::new(1.0, f64::NAN, 1.0, 0.0));
        assert!(matches!(
            processor.process_record(record),
            Err(ComputeError::InvalidSample(_))
        ));
    }

    #[test]
    fn test_channel_sink_receives_metrics() {
        let (sink, rx) = ChannelSink::new();
        let mut processor =
            VisionProcessor::new(VisionConfig::default(), Box::new(sink)).unwrap();
        processor.process_record(eye(0)).unwrap();

        assert_eq!(rx.try_iter().count(), 1);
        // Forwarding sinks hold nothing
        assert!(processor.drain_events().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = VisionConfig::default();
        config.heart_rate.measurement_interval_ms = 0.0;
        assert!(VisionProcessor::new(config, Box::new(CollectingSink::new())).is_err());
    }

    #[test]
    fn test_reset_then_restart() {
        let mut processor = VisionProcessor::with_defaults();
        processor.start().unwrap();
        for i in 0..40 {
            processor.process_and_tick(color(i)).unwrap();
            processor.process_record(eye(i)).unwrap();
        }
        processor.stop();
        processor.reset();
        assert_eq!(processor.heart_rate().buffer_len(), 0);
        assert_eq!(processor.attention().buffer_len(), 0);

        processor.start().unwrap();
        assert!(processor.heart_rate().is_running());
    }

    #[test]
    fn test_samples_to_metrics() {
        let lines = samples_to_metrics(&sample_ndjson(150)).unwrap();
        assert!(!lines.is_empty());

        let metrics: Vec<String> = lines
            .iter()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                assert_eq!(value["schema_version"], "vision.metric.v1");
                value["event"]["metric"].as_str().unwrap().to_string()
            })
            .collect();

        assert!(metrics.iter().any(|m| m == "heart_rate"));
        assert_eq!(metrics.iter().filter(|m| *m == "gaze").count(), 150);
    }

    #[test]
    fn test_samples_to_metrics_empty_and_malformed() {
        assert!(samples_to_metrics("").unwrap().is_empty());
        assert!(matches!(
            samples_to_metrics("not json"),
            Err(ComputeError::ParseError(_))
        ));
    }
}
