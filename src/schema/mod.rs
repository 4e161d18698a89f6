//! vision.frame.v1 input schema
//!
//! Tagged records carrying the sampler's color and eye observations, with
//! validation and NDJSON/array readers.

mod reader;
mod record;

pub use reader::*;
pub use record::*;
