//! Storage errors.

use thiserror::Error;

/// Errors raised by record and blob backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record or blob does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// A blob key that cannot be used as a storage name.
    #[error("invalid blob key: {0}")]
    InvalidKey(String),
    /// Filesystem failure.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The record file could not be encoded or decoded.
    #[error("record file is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
