//! Error types for the cache and swap subsystems.

use crate::payload::SampleType;
use thiserror::Error;

/// Cache-related errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during swap operations
    #[error("swap I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Eviction threshold outside the valid [0, 1] range
    #[error("eviction threshold out of range [0, 1]: {value}")]
    InvalidThreshold { value: f64 },

    /// Sample buffer type does not match the declared layout
    #[error("sample buffer does not match layout: expected {expected:?}, got {actual:?}")]
    LayoutMismatch {
        expected: SampleType,
        actual: SampleType,
    },

    /// Swapped data could not be decoded
    #[error("corrupt swap data: {0}")]
    Corrupt(String),
}
