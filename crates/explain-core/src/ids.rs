//! Identifier newtypes.
//!
//! [`SubscriberKey`] is the partition key a channel is addressed by (an
//! employee/agent number in practice). It is opaque to the relay beyond the
//! non-blank requirement. [`ConnectionId`] names one open subscriber stream
//! and is a UUID v7 generated via [`uuid::Uuid::now_v7`].

use std::borrow::Borrow;
use std::fmt;

use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::errors::ValidationError;

/// Channel partition key.
///
/// Always non-empty; surrounding whitespace is trimmed on construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberKey(String);

impl SubscriberKey {
    /// Validate and wrap a raw key.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Missing { field: "key" });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Validate an optional raw key (absent is reported the same as blank).
    pub fn parse_opt(raw: Option<&str>) -> Result<Self, ValidationError> {
        raw.map_or(Err(ValidationError::Missing { field: "key" }), Self::parse)
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume self and return the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SubscriberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SubscriberKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SubscriberKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SubscriberKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl Serialize for SubscriberKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Unique ID of one subscriber connection (UUID v7, time-ordered).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a fresh connection ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Return the inner string as a slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}
