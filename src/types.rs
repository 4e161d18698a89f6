//! Core types for the Synheart Vision estimators
//!
//! This module defines the data structures that flow through each stage of the
//! two estimators: sampler input (color and eye samples), derived events
//! (fixations, saccades, blinks) and the metric payloads handed to the emitter.
//!
//! All timestamps are monotonic capture times in milliseconds.

use serde::{Deserialize, Serialize};

/// A point in landmark space (normalized image coordinates plus relative depth)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

/// A direction vector; shares the layout of [`Point3`]
pub type Vector3 = Point3;

impl Point3 {
    pub const ZERO: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in 3-D
    pub fn distance(&self, other: &Point3) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn sub(&self, other: &Point3) -> Point3 {
        Point3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn add(&self, other: &Point3) -> Point3 {
        Point3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn scale(&self, factor: f64) -> Point3 {
        Point3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction; the zero vector when the magnitude
    /// is zero or not finite
    pub fn normalized(&self) -> Vector3 {
        let magnitude = self.magnitude();
        if magnitude == 0.0 || !magnitude.is_finite() {
            return Point3::ZERO;
        }
        self.scale(1.0 / magnitude)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Channel-averaged pixel intensities from the face sub-region of one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorSample {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    /// Capture time (ms)
    pub t: f64,
}

impl ColorSample {
    pub fn new(r: f64, g: f64, b: f64, t: f64) -> Self {
        Self { r, g, b, t }
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.t.is_finite()
    }
}

/// Landmark-derived state of a single eye
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EyeState {
    /// Eye center (mean of the eye contour)
    #[serde(default)]
    pub center: Option<Point3>,
    /// Iris center
    #[serde(default)]
    pub iris: Option<Point3>,
    /// Normalized eyelid gap; below 1 means partially or fully closed
    #[serde(default)]
    pub openness: f64,
}

impl EyeState {
    pub fn open(center: Point3, iris: Point3) -> Self {
        Self {
            center: Some(center),
            iris: Some(iris),
            openness: 1.0,
        }
    }

    /// True when the landmark producer located this eye at all
    pub fn is_observed(&self) -> bool {
        self.center.is_some() || self.iris.is_some()
    }
}

/// One eye-landmark observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EyeSample {
    #[serde(default)]
    pub left_eye: EyeState,
    #[serde(default)]
    pub right_eye: EyeState,
    /// Producer-supplied gaze vector, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaze_direction: Option<Vector3>,
    /// Capture time (ms)
    pub t: f64,
}

impl EyeSample {
    pub fn new(left_eye: EyeState, right_eye: EyeState, t: f64) -> Self {
        Self {
            left_eye,
            right_eye,
            gaze_direction: None,
            t,
        }
    }

    /// A sample with no face: both eyes unobserved
    pub fn absent(t: f64) -> Self {
        Self::new(EyeState::default(), EyeState::default(), t)
    }

    /// Mean openness of both eyes
    pub fn average_openness(&self) -> f64 {
        (self.left_eye.openness + self.right_eye.openness) / 2.0
    }

    /// True when at least one eye was located
    pub fn has_face(&self) -> bool {
        self.left_eye.is_observed() || self.right_eye.is_observed()
    }
}

/// A maximal run of low-movement iris positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixation {
    pub start_time: f64,
    pub end_time: f64,
    /// `end_time - start_time` (ms)
    pub duration: f64,
    pub positions: Vec<Point3>,
}

impl Fixation {
    pub fn start(t: f64, iris: Point3) -> Self {
        Self {
            start_time: t,
            end_time: t,
            duration: 0.0,
            positions: vec![iris],
        }
    }

    /// Extend the fixation to `t`, recording the iris position when present
    pub fn extend(&mut self, t: f64, iris: Option<Point3>) {
        self.end_time = t;
        self.duration = self.end_time - self.start_time;
        if let Some(position) = iris {
            self.positions.push(position);
        }
    }
}

/// A single detected rapid-movement event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Saccade {
    pub timestamp: f64,
    /// Mean iris displacement over the detection window
    pub magnitude: f64,
}

/// One scored attention observation (before smoothing)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionSample {
    pub timestamp: f64,
    pub score: f64,
}

/// Blink counters of one attention estimator
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BlinkState {
    pub last_blink_time: f64,
    pub blink_count: u32,
}

/// How a heart-rate reading was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementStatus {
    /// Derived from detected pulse peaks
    Measured,
    /// Low-confidence approximation; not a measurement
    Fallback,
    /// Not enough buffered samples yet
    NotReady,
}

/// Heart-rate payload delivered to the emitter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateReading {
    /// Beats per minute; 0 when not ready
    pub bpm: u32,
    pub is_fallback: bool,
    pub status: MeasurementStatus,
    /// Time of the newest sample used (ms)
    pub timestamp: f64,
    /// Number of accepted pulse peaks
    pub peak_count: usize,
}

impl HeartRateReading {
    pub fn not_ready(timestamp: f64) -> Self {
        Self {
            bpm: 0,
            is_fallback: false,
            status: MeasurementStatus::NotReady,
            timestamp,
            peak_count: 0,
        }
    }

    pub fn measured(bpm: u32, timestamp: f64, peak_count: usize) -> Self {
        Self {
            bpm,
            is_fallback: false,
            status: MeasurementStatus::Measured,
            timestamp,
            peak_count,
        }
    }

    pub fn fallback(bpm: u32, timestamp: f64, peak_count: usize) -> Self {
        Self {
            bpm,
            is_fallback: true,
            status: MeasurementStatus::Fallback,
            timestamp,
            peak_count,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status != MeasurementStatus::NotReady
    }
}

/// Attention payload delivered to the emitter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionMetrics {
    /// Smoothed attention score (0-100)
    pub attention_score: u8,
    pub fixation_count: usize,
    /// Mean fixation duration in the scoring window (ms)
    pub avg_fixation_duration: f64,
    pub saccade_count: usize,
    /// Blinks per minute
    pub blink_rate: f64,
    pub timestamp: f64,
}

/// Per-sample gaze payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeReading {
    /// Unit vector, or zero when undetermined
    pub gaze_direction: Vector3,
    pub timestamp: f64,
}

/// A metric value pushed to the emitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum MetricEvent {
    HeartRate(HeartRateReading),
    Attention(AttentionMetrics),
    Gaze(GazeReading),
}

impl MetricEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MetricEvent::HeartRate(_) => "heart_rate",
            MetricEvent::Attention(_) => "attention",
            MetricEvent::Gaze(_) => "gaze",
        }
    }

    pub fn timestamp(&self) -> f64 {
        match self {
            MetricEvent::HeartRate(r) => r.timestamp,
            MetricEvent::Attention(m) => m.timestamp,
            MetricEvent::Gaze(g) => g.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance_is_three_dimensional() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 2.0, 2.0);
        assert!((a.distance(&b) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(Point3::ZERO.normalized(), Point3::ZERO);

        let unit = Point3::new(3.0, 4.0, 0.0).normalized();
        assert!((unit.magnitude() - 1.0).abs() < 1e-12);
        assert!((unit.x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_fixation_extend_updates_duration() {
        let mut fixation = Fixation::start(1000.0, Point3::ZERO);
        fixation.extend(1033.0, Some(Point3::new(0.001, 0.0, 0.0)));
        fixation.extend(1066.0, None);

        assert_eq!(fixation.duration, 66.0);
        assert_eq!(fixation.positions.len(), 2);
        assert_eq!(fixation.positions[1], Point3::new(0.001, 0.0, 0.0));
    }

    #[test]
    fn test_eye_sample_deserializes_without_landmarks() {
        let sample: EyeSample = serde_json::from_str(r#"{"t": 42.0}"#).unwrap();
        assert!(!sample.has_face());
        assert_eq!(sample.average_openness(), 0.0);
    }

    #[test]
    fn test_metric_event_is_tagged() {
        let event = MetricEvent::HeartRate(HeartRateReading::measured(72, 5000.0, 6));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["metric"], "heart_rate");
        assert_eq!(json["bpm"], 72);
        assert_eq!(json["is_fallback"], false);
        assert_eq!(json["status"], "measured");
    }

    #[test]
    fn test_not_ready_is_distinguishable() {
        let reading = HeartRateReading::not_ready(0.0);
        assert!(!reading.is_ready());
        assert_eq!(reading.bpm, 0);
        assert!(HeartRateReading::fallback(80, 0.0, 1).is_ready());
    }
}
