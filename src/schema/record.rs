//! vision.frame.v1 record definition
//!
//! One record per sampler observation:
//! - `{"kind": "color", "r": .., "g": .., "b": .., "t": ..}`
//! - `{"kind": "eye", "left_eye": {..}, "right_eye": {..}, "gaze_direction": {..}, "t": ..}`
//!
//! Eye fields other than `t` are optional; a record without landmarks stands
//! for a frame in which no face was found.

use crate::types::{ColorSample, EyeSample, EyeState, Point3};
use serde::{Deserialize, Serialize};

/// Current input schema version
pub const SCHEMA_VERSION: &str = "vision.frame.v1";

/// A single sampler observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameRecord {
    Color(ColorSample),
    Eye(EyeSample),
}

impl FrameRecord {
    /// Capture time (ms)
    pub fn timestamp(&self) -> f64 {
        match self {
            FrameRecord::Color(sample) => sample.t,
            FrameRecord::Eye(sample) => sample.t,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FrameRecord::Color(_) => "color",
            FrameRecord::Eye(_) => "eye",
        }
    }

    /// Validate the record
    pub fn validate(&self) -> Result<(), ValidationError> {
        let t = self.timestamp();
        if !t.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "t".to_string(),
            });
        }
        if t < 0.0 {
            return Err(ValidationError::NegativeTimestamp { t });
        }

        match self {
            FrameRecord::Color(sample) => {
                for (field, value) in [("r", sample.r), ("g", sample.g), ("b", sample.b)] {
                    if !value.is_finite() {
                        return Err(ValidationError::NonFiniteValue {
                            field: field.to_string(),
                        });
                    }
                }
                Ok(())
            }
            FrameRecord::Eye(sample) => {
                check_eye("left_eye", &sample.left_eye)?;
                check_eye("right_eye", &sample.right_eye)?;
                if let Some(direction) = sample.gaze_direction {
                    check_point("gaze_direction", &direction)?;
                }
                Ok(())
            }
        }
    }
}

fn check_point(field: &str, point: &Point3) -> Result<(), ValidationError> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFiniteValue {
            field: field.to_string(),
        })
    }
}

fn check_eye(name: &str, eye: &EyeState) -> Result<(), ValidationError> {
    if let Some(center) = eye.center {
        check_point(&format!("{name}.center"), &center)?;
    }
    if let Some(iris) = eye.iris {
        check_point(&format!("{name}.iris"), &iris)?;
    }
    if !eye.openness.is_finite() {
        return Err(ValidationError::NonFiniteValue {
            field: format!("{name}.openness"),
        });
    }
    if eye.openness < 0.0 {
        return Err(ValidationError::NegativeOpenness {
            eye: name.to_string(),
            openness: eye.openness,
        });
    }
    Ok(())
}

impl From<ColorSample> for FrameRecord {
    fn from(sample: ColorSample) -> Self {
        FrameRecord::Color(sample)
    }
}

impl From<EyeSample> for FrameRecord {
    fn from(sample: EyeSample) -> Self {
        FrameRecord::Eye(sample)
    }
}

/// Validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Non-finite value in field {field}")]
    NonFiniteValue { field: String },

    #[error("Negative openness {openness} for {eye}")]
    NegativeOpenness { eye: String, openness: f64 },

    #[error("Negative timestamp {t}")]
    NegativeTimestamp { t: f64 },
}
