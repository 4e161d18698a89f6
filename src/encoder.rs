//! Metric encoding
//!
//! Wraps each emitted metric in a vision.metric.v1 envelope carrying producer
//! metadata and the computation time.

use crate::error::ComputeError;
use crate::types::MetricEvent;
use crate::{PRODUCER_NAME, VISION_VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current output schema version
pub const METRIC_SCHEMA_VERSION: &str = "vision.metric.v1";

/// Producer metadata stamped on every envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Output record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEnvelope {
    pub schema_version: String,
    pub producer: MetricProducer,
    /// Wall-clock time of encoding (RFC 3339)
    pub computed_at_utc: String,
    pub event: MetricEvent,
}

/// Encoder for metric envelopes
pub struct MetricEncoder {
    instance_id: String,
}

impl Default for MetricEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn encode(&self, event: MetricEvent) -> MetricEnvelope {
        MetricEnvelope {
            schema_version: METRIC_SCHEMA_VERSION.to_string(),
            producer: MetricProducer {
                name: PRODUCER_NAME.to_string(),
                version: VISION_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            event,
        }
    }

    /// Encode to a single JSON line
    pub fn encode_to_json(&self, event: MetricEvent) -> Result<String, ComputeError> {
        serde_json::to_string(&self.encode(event))
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttentionMetrics, HeartRateReading};
    use chrono::DateTime;

    #[test]
    fn test_envelope_fields() {
        let encoder = MetricEncoder::with_instance_id("test-instance");
        let envelope = encoder.encode(MetricEvent::HeartRate(HeartRateReading::fallback(
            80, 4000.0, 1,
        )));

        assert_eq!(envelope.schema_version, METRIC_SCHEMA_VERSION);
        assert_eq!(envelope.producer.name, PRODUCER_NAME);
        assert_eq!(envelope.producer.version, VISION_VERSION);
        assert_eq!(envelope.producer.instance_id, "test-instance");
        assert!(DateTime::parse_from_rfc3339(&envelope.computed_at_utc).is_ok());
    }

    #[test]
    fn test_encode_to_json_is_single_line() {
        let encoder = MetricEncoder::new();
        let json = encoder
            .encode_to_json(MetricEvent::Attention(AttentionMetrics {
                attention_score: 64,
                fixation_count: 4,
                avg_fixation_duration: 280.0,
                saccade_count: 3,
                blink_rate: 12.0,
                timestamp: 5000.0,
            }))
            .unwrap();

        assert!(!json.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["event"]["metric"], "attention");
        assert_eq!(value["event"]["attention_score"], 64);
    }

    #[test]
    fn test_instance_ids_are_unique() {
        assert_ne!(MetricEncoder::new().instance_id(), MetricEncoder::new().instance_id());
    }
}
