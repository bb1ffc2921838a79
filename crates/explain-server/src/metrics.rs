//! Prometheus metrics recorder and `/metrics` endpoint handler.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Fails if a global recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across crates.

/// Subscriptions opened total (counter).
pub const RELAY_SUBSCRIPTIONS_TOTAL: &str = "relay_subscriptions_total";
/// Subscriptions closed total (counter).
pub const RELAY_SUBSCRIPTIONS_CLOSED_TOTAL: &str = "relay_subscriptions_closed_total";
/// Open subscriptions (gauge).
pub const RELAY_SUBSCRIPTIONS_ACTIVE: &str = "relay_subscriptions_active";
/// Events published total, including those with no recipients (counter).
pub const RELAY_EVENTS_PUBLISHED_TOTAL: &str = "relay_events_published_total";
/// Event frames dropped on full or closed queues (counter).
pub const RELAY_FRAMES_DROPPED_TOTAL: &str = "relay_frames_dropped_total";
/// Keep-alive frames written (counter).
pub const RELAY_KEEPALIVES_TOTAL: &str = "relay_keepalives_total";
