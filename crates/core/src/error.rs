//! Error types for the strata layout library.

use thiserror::Error;

/// Primary error type for geometry, layout and table operations.
///
/// Empty input is never an error: empty glyph or word sets produce empty
/// results.
#[derive(Error, Debug)]
pub enum StrataError {
    #[error("invalid bounding box ({x0}, {top}, {x1}, {bottom}): {reason}")]
    InvalidBoundingBox {
        x0: f64,
        top: f64,
        x1: f64,
        bottom: f64,
        reason: &'static str,
    },

    #[error("{kind} index {index} out of range (valid: {min}..={max})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        min: usize,
        max: usize,
    },

    #[error("invalid setting {name} = {value}: must be finite and non-negative")]
    InvalidSetting { name: &'static str, value: f64 },

    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(
        "bounding box ({x0}, {top}, {x1}, {bottom}) is not fully within page {page_number} bbox"
    )]
    BBoxOutsidePage {
        page_number: usize,
        x0: f64,
        top: f64,
        x1: f64,
        bottom: f64,
    },
}

/// Convenience Result type alias for StrataError.
pub type Result<T> = std::result::Result<T, StrataError>;
