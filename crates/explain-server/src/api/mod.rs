//! HTTP handlers.
//!
//! - `publish`: `POST /api/send` ingress
//! - `subscribe`: `GET /subscribe/{key}` event stream
//! - `customers`: customer records, image upload and download
//!
//! Every failure is an [`ApiError`] rendered as `{ok: false, error, code}`.

pub mod customers;
pub mod error;
pub mod publish;
pub mod subscribe;

pub use error::ApiError;

/// Render a JSON scalar (string or number) as a string.
///
/// Keys arrive from clients as either `"1001"` or `1001`; both address the
/// same channel. Anything else is treated as absent.
pub(crate) fn scalar_to_string(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
