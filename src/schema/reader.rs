//! Parsing of vision.frame.v1 streams

use crate::error::ComputeError;
use crate::schema::record::{FrameRecord, ValidationError};

/// Reader for frame record streams
pub struct FrameReader;

impl FrameReader {
    /// Parse a JSON string containing an array of records
    pub fn parse_array(json: &str) -> Result<Vec<FrameRecord>, ComputeError> {
        let records: Vec<FrameRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON) containing records
    ///
    /// Blank lines are skipped; the first malformed line aborts with its
    /// 1-based line number.
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<FrameRecord>, ComputeError> {
        ndjson
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(line_num, line)| Self::parse_line(line, line_num + 1))
            .collect()
    }

    /// Parse one NDJSON line
    pub fn parse_line(line: &str, line_num: usize) -> Result<FrameRecord, ComputeError> {
        serde_json::from_str::<FrameRecord>(line.trim()).map_err(|e| {
            ComputeError::ParseError(format!("Failed to parse line {line_num}: {e}"))
        })
    }

    /// Validate a batch of records, returning only the failures
    pub fn validate_records(records: &[FrameRecord]) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                record.validate().err().map(|error| ValidationResult {
                    index,
                    kind: record.kind(),
                    error,
                })
            })
            .collect()
    }
}

/// A failed record validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub index: usize,
    pub kind: &'static str,
    pub error: ValidationError,
}
