//! Error codes and request validation errors.
//!
//! Every client-visible failure carries one [`ErrorCode`] so callers can
//! branch on a stable string instead of parsing messages.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error codes returned in `{ok: false, code}` bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Subscriber key missing or blank.
    #[serde(rename = "MISSING_KEY")]
    MissingKey,
    /// Event type missing or blank.
    #[serde(rename = "MISSING_TYPE")]
    MissingType,
    /// Some other required field missing or invalid.
    #[serde(rename = "INVALID_PARAMS")]
    InvalidParams,
    /// Request body could not be parsed.
    #[serde(rename = "INVALID_BODY")]
    InvalidBody,
    /// Referenced record or blob does not exist.
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// Record or blob storage failed.
    #[serde(rename = "STORAGE_ERROR")]
    StorageError,
    /// Anything else.
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl ErrorCode {
    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingKey => "MISSING_KEY",
            Self::MissingType => "MISSING_TYPE",
            Self::InvalidParams => "INVALID_PARAMS",
            Self::InvalidBody => "INVALID_BODY",
            Self::NotFound => "NOT_FOUND",
            Self::StorageError => "STORAGE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request failed validation at the endpoint boundary.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was absent or blank after trimming.
    #[error("{field} is required")]
    Missing {
        /// Field name as it appears on the wire.
        field: &'static str,
    },
    /// A field was present but unusable.
    #[error("invalid {field}: {message}")]
    Invalid {
        /// Field name as it appears on the wire.
        field: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

impl ValidationError {
    /// Error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Missing { field: "key" } => ErrorCode::MissingKey,
            Self::Missing { field: "type" } => ErrorCode::MissingType,
            Self::Missing { .. } | Self::Invalid { .. } => ErrorCode::InvalidParams,
        }
    }
}
