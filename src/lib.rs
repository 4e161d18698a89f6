//! Synheart Vision - On-device biometric inference from camera-derived samples
//!
//! Vision turns per-frame face samples into physiological and attentional
//! metrics through two independent streaming estimators:
//!
//! - **Heart rate (rPPG)**: color samples → green channel → normalization →
//!   band limiting → peak detection → BPM, with a flagged fallback
//! - **Attention**: eye-landmark samples → blinks, fixations, saccades →
//!   smoothed attention score, plus a per-sample gaze direction
//!
//! Estimators never read the wall clock; all time comes from sample
//! timestamps and explicit `tick(now)` calls.

pub mod attention;
pub mod buffer;
pub mod config;
pub mod dsp;
pub mod emitter;
pub mod encoder;
pub mod error;
pub mod heart_rate;
pub mod pipeline;
pub mod schema;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use attention::{AttentionConfig, AttentionEstimator, AttentionUpdate};
pub use config::VisionConfig;
pub use emitter::{ChannelSink, CollectingSink, MetricSink, NullSink};
pub use encoder::{MetricEncoder, MetricEnvelope, METRIC_SCHEMA_VERSION};
pub use error::ComputeError;
pub use heart_rate::{ColorSampleSource, ExternalFeed, HeartRateConfig, HeartRateEstimator};
pub use pipeline::{samples_to_metrics, VisionProcessor};

// Schema exports
pub use schema::{FrameReader, FrameRecord, ValidationError, SCHEMA_VERSION};

/// Vision version embedded in all metric envelopes
pub const VISION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for metric envelopes
pub const PRODUCER_NAME: &str = "synheart-vision";
