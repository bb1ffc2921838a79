//! The event envelope pushed to subscribers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ValidationError;

/// An event as delivered to subscribers: a required `type` tag plus optional
/// opaque `data`.
///
/// The relay never looks inside `data`; interpreting `type` (`"image"`,
/// `"reset"`, ...) is up to the subscriber.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelayEvent {
    /// Event type tag.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Arbitrary payload; omitted from the wire when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RelayEvent {
    /// Build an event, rejecting a blank type tag.
    pub fn new(event_type: &str, data: Option<Value>) -> Result<Self, ValidationError> {
        let trimmed = event_type.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Missing { field: "type" });
        }
        Ok(Self {
            event_type: trimmed.to_owned(),
            data,
        })
    }
}
