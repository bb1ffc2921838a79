//! `GET /subscribe/{key}`: open a server-sent event stream.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use explain_core::SubscriberKey;

use super::error::ApiError;
use crate::server::AppState;

/// Handle `GET /subscribe/{key}` (also mounted at `/events/{key}`).
///
/// The connection is registered before the response head is returned. The
/// body stays open until the client disconnects or the server shuts down.
pub async fn subscribe(
    State(state): State<AppState>,
    Path(raw_key): Path<String>,
) -> Result<Response, ApiError> {
    let key = SubscriberKey::parse(&raw_key)?;
    let stream = state.subscriptions.open(key);
    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            // HTTP/1.1 only; hyper strips connection headers on HTTP/2
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
