//! Error types for the erasure coding comparison

use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the engine, the cluster and the scenario layer
#[derive(Error, Debug)]
pub enum Error {
    /// Scheme or run parameters that cannot work together.
    /// Raised before any encode attempt.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Fewer fragments survive than the scheme's minimum
    #[error("insufficient fragments: have {available}, need {required}")]
    InsufficientFragments { available: usize, required: usize },

    /// The erasure pattern exceeds the active code's correction capacity
    #[error("uncorrectable erasure: {erasures} erased positions, code corrects at most {capacity}")]
    UncorrectableErasure { erasures: usize, capacity: usize },

    /// Encoding requires at least one payload byte
    #[error("cannot encode an empty payload")]
    EmptyPayload,

    /// The backing linear erasure code reported a failure
    #[error("linear code failure: {0}")]
    Codec(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Result file (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error means the payload could not be rebuilt from the
    /// surviving fragments (as opposed to a setup or I/O problem)
    pub fn is_data_loss(&self) -> bool {
        matches!(
            self,
            Error::InsufficientFragments { .. } | Error::UncorrectableErasure { .. }
        )
    }
}
