//! Periodic keep-alive frames for idle subscriber streams.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::connection::SubscriberConnection;
use super::frame::Frame;
use crate::metrics::RELAY_KEEPALIVES_TOTAL;

/// Outcome of the keep-alive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveResult {
    /// The connection's token was cancelled.
    Cancelled,
    /// The connection closed or its reader went away.
    Closed,
}

/// Write a keep-alive frame every `interval` until cancelled.
///
/// The first frame goes out one full interval after start. A closed
/// connection or gone reader ends the loop.
pub async fn run_keepalive(
    connection: Arc<SubscriberConnection>,
    interval: Duration,
    cancel: CancellationToken,
) -> KeepaliveResult {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return KeepaliveResult::Cancelled;
            }
            _ = ticker.tick() => {
                if connection.is_closed() || !connection.send(Frame::KeepAlive) {
                    return KeepaliveResult::Closed;
                }
                counter!(RELAY_KEEPALIVES_TOTAL).increment(1);
                trace!(conn_id = %connection.id, "keep-alive sent");
            }
        }
    }
}
