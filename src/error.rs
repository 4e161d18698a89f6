//! Error types for Synheart Vision
//!
//! Only API edges fail. Inside the estimators every path has a defined,
//! finite output: insufficient data is reported as a `NotReady` reading,
//! degenerate numerics are neutralized and out-of-range rates take the
//! fallback path.

use thiserror::Error;

/// Errors that can occur at the public API boundary
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Estimator not ready: {0}")]
    NotReady(String),

    #[error("Failed to parse sample stream: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
