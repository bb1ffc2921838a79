//! Subscription lifecycle: open, stream, and exactly-once teardown.
//!
//! A subscription is torn down when any of these happens first: the client
//! disconnects (the response body is dropped), the server shuts down (the
//! parent token is cancelled), or [`SubscriptionManager::close`] is called.
//! Every path funnels through [`close_connection`], which acts only once.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use explain_core::SubscriberKey;
use futures::{FutureExt, Stream};
use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::{debug, info};

use super::connection::SubscriberConnection;
use super::frame::Frame;
use super::keepalive::run_keepalive;
use super::registry::ChannelRegistry;
use crate::metrics::{
    RELAY_SUBSCRIPTIONS_ACTIVE, RELAY_SUBSCRIPTIONS_CLOSED_TOTAL, RELAY_SUBSCRIPTIONS_TOTAL,
};

/// Opens subscriptions and owns their shared settings.
pub struct SubscriptionManager {
    registry: Arc<ChannelRegistry>,
    keepalive_interval: Duration,
    shutdown: CancellationToken,
}

impl SubscriptionManager {
    /// Create a manager. Every subscription's token is a child of `shutdown`.
    pub fn new(
        registry: Arc<ChannelRegistry>,
        keepalive_interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            keepalive_interval,
            shutdown,
        }
    }

    /// Open a subscription under `key`.
    ///
    /// The connection is registered before this returns, so an event
    /// published afterwards reaches it. The returned stream yields encoded
    /// frames and tears the subscription down when dropped.
    pub fn open(&self, key: SubscriberKey) -> SubscriptionStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = self.shutdown.child_token();
        let connection = Arc::new(SubscriberConnection::new(key, tx, cancel.clone()));
        let _ = self.registry.register(connection.clone());

        counter!(RELAY_SUBSCRIPTIONS_TOTAL).increment(1);
        gauge!(RELAY_SUBSCRIPTIONS_ACTIVE).increment(1.0);
        info!(conn_id = %connection.id, key = %connection.key(), "subscriber connected");

        let keepalive_conn = connection.clone();
        let keepalive_cancel = cancel.clone();
        let interval = self.keepalive_interval;
        drop(tokio::spawn(async move {
            let result = run_keepalive(keepalive_conn, interval, keepalive_cancel).await;
            debug!(?result, "keep-alive loop ended");
        }));

        SubscriptionStream {
            connection,
            registry: self.registry.clone(),
            rx,
            cancelled: Box::pin(cancel.cancelled_owned()),
        }
    }

    /// Tear down a subscription. Returns `false` if it was already closed.
    pub fn close(&self, connection: &SubscriberConnection) -> bool {
        close_connection(&self.registry, connection)
    }
}

/// Tear down a connection exactly once.
///
/// Stops its keep-alive, deregisters it, and ends its stream. Later calls
/// return `false` and do nothing.
pub fn close_connection(registry: &ChannelRegistry, connection: &SubscriberConnection) -> bool {
    if !connection.mark_closed() {
        return false;
    }
    connection.cancel_token().cancel();
    let _ = registry.deregister(connection.key().as_str(), &connection.id);

    counter!(RELAY_SUBSCRIPTIONS_CLOSED_TOTAL).increment(1);
    gauge!(RELAY_SUBSCRIPTIONS_ACTIVE).decrement(1.0);
    info!(
        conn_id = %connection.id,
        key = %connection.key(),
        duration_secs = connection.age().as_secs(),
        dropped_frames = connection.drop_count(),
        "subscriber disconnected"
    );
    true
}

/// Frame stream backing one subscriber's HTTP response body.
///
/// Ends when the connection is cancelled; dropping it closes the
/// subscription.
pub struct SubscriptionStream {
    connection: Arc<SubscriberConnection>,
    registry: Arc<ChannelRegistry>,
    rx: mpsc::UnboundedReceiver<Frame>,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
}

impl SubscriptionStream {
    /// The connection this stream drains.
    pub fn connection(&self) -> &Arc<SubscriberConnection> {
        &self.connection
    }
}

impl Stream for SubscriptionStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.cancelled.poll_unpin(cx).is_ready() {
            return Poll::Ready(None);
        }
        this.rx
            .poll_recv(cx)
            .map(|frame| frame.map(|f| Ok(f.encode())))
    }
}

impl Drop for SubscriptionStream {
    fn drop(&mut self) {
        let _ = close_connection(&self.registry, &self.connection);
    }
}

impl std::fmt::Debug for SubscriptionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionStream")
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}
