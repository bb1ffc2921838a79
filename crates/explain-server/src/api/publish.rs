//! `POST /api/send`: publish one event to every stream open under a key.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use explain_core::{RelayEvent, SubscriberKey};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::error::ApiError;
use super::scalar_to_string;
use crate::server::AppState;

/// Ingress request body.
#[derive(Debug, Default, Deserialize)]
pub struct SendRequest {
    /// Target channel; `empNo` is accepted as an alias.
    #[serde(default, alias = "empNo")]
    pub key: Option<Value>,
    /// Event type tag.
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    /// Opaque payload forwarded verbatim.
    #[serde(default)]
    pub data: Option<Value>,
}

impl SendRequest {
    /// Validate into a target key and event. The key is checked first.
    pub fn into_event(self) -> Result<(SubscriberKey, RelayEvent), ApiError> {
        let key = SubscriberKey::parse_opt(scalar_to_string(self.key.as_ref()).as_deref())?;
        let event = RelayEvent::new(self.event_type.as_deref().unwrap_or_default(), self.data)?;
        Ok((key, event))
    }
}

/// Handle `POST /api/send`.
///
/// Fire-and-forget: success only means the request was well formed. Whether
/// anyone was listening is not reported.
pub async fn send_event(
    State(state): State<AppState>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let (key, event) = request.into_event()?;
    let outcome = state.broadcaster.publish(key.as_str(), &event);
    debug!(
        key = %key,
        event_type = %event.event_type,
        recipients = outcome.recipients,
        "send accepted"
    );
    Ok(Json(json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use explain_core::ErrorCode;

    fn parse(body: Value) -> Result<(SubscriberKey, RelayEvent), ApiError> {
        serde_json::from_value::<SendRequest>(body).unwrap().into_event()
    }

    #[test]
    fn valid_request() {
        let (key, event) = parse(json!({"key": "E1", "type": "image", "data": "abc"})).unwrap();
        assert_eq!(key.as_str(), "E1");
        assert_eq!(event.event_type, "image");
        assert_eq!(event.data, Some(json!("abc")));
    }

    #[test]
    fn emp_no_alias_and_numeric_key() {
        let (key, _) = parse(json!({"empNo": 1001, "type": "reset"})).unwrap();
        assert_eq!(key.as_str(), "1001");
    }

    #[test]
    fn data_is_optional() {
        let (_, event) = parse(json!({"key": "E1", "type": "reset"})).unwrap();
        assert!(event.data.is_none());
    }

    #[test]
    fn missing_key_rejected() {
        let err = parse(json!({"type": "image"})).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingKey);
    }

    #[test]
    fn blank_key_rejected() {
        let err = parse(json!({"key": "   ", "type": "image"})).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingKey);
    }

    #[test]
    fn missing_type_rejected() {
        let err = parse(json!({"key": "E1", "data": 1})).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingType);
    }

    #[test]
    fn key_checked_before_type() {
        let err = parse(json!({})).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingKey);
    }

    #[test]
    fn structured_data_preserved() {
        let data = json!({"page": 3, "strokes": [[1, 2], [3, 4]]});
        let (_, event) = parse(json!({"key": "E1", "type": "draw", "data": data.clone()})).unwrap();
        assert_eq!(event.data, Some(data));
    }
}
