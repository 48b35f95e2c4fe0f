//! Error type shared by the numeric core.

use crate::cache::Fingerprint;
use crate::precision::IntPrecision;

/// Result alias for fallible core operations.
pub type TinctResult<T> = Result<T, TinctError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TinctError {
    #[error("invalid domain-range scale {0:?}, expected one of \"Reference\", \"1\", \"100\"")]
    InvalidScaleMode(String),

    #[error("cache {cache:?} has no entry for fingerprint {key}")]
    KeyNotFound { cache: String, key: Fingerprint },

    #[error("bit depth {0} outside 1..=64")]
    InvalidBitDepth(u32),

    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("value {value} cannot be represented with {precision} precision")]
    PrecisionOverflow { value: f64, precision: IntPrecision },

    #[error("invalid method {method:?}, expected one of {valid:?}")]
    InvalidMethod {
        method: String,
        valid: Vec<&'static str>,
    },

    #[error("no key holds the value {0}")]
    NoKeyForValue(String),

    #[error("index {index} out of range for axis of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("array has no finite samples to fill from")]
    NoFiniteSamples,
}

impl TinctError {
    pub(crate) fn shape_mismatch(expected: &[usize], found: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}
