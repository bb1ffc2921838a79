//! Subscriber connection state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use explain_core::{ConnectionId, SubscriberKey};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::frame::Frame;

/// One open subscriber stream.
///
/// Frames are queued on an unbounded channel drained by the HTTP response
/// body, so writing never waits on the network and a slow reader never loses
/// frames while it stays connected.
pub struct SubscriberConnection {
    /// Unique connection ID.
    pub id: ConnectionId,
    key: SubscriberKey,
    tx: mpsc::UnboundedSender<Frame>,
    /// Cancelled on teardown or server shutdown; stops keep-alive and ends
    /// the response stream.
    cancel: CancellationToken,
    closed: AtomicBool,
    /// When this connection was established.
    pub connected_at: Instant,
    /// Count of frames dropped because the reader was gone.
    pub dropped_frames: AtomicU64,
}

impl SubscriberConnection {
    /// Create a new connection.
    pub fn new(key: SubscriberKey, tx: mpsc::UnboundedSender<Frame>, cancel: CancellationToken) -> Self {
        Self {
            id: ConnectionId::new(),
            key,
            tx,
            cancel,
            closed: AtomicBool::new(false),
            connected_at: Instant::now(),
            dropped_frames: AtomicU64::new(0),
        }
    }

    /// The key this connection is subscribed under.
    pub fn key(&self) -> &SubscriberKey {
        &self.key
    }

    /// Queue a frame without waiting.
    ///
    /// Returns `false` when the connection is closed or the reader is gone;
    /// the dropped counter is incremented in the latter case.
    pub fn send(&self, frame: Frame) -> bool {
        if self.is_closed() {
            return false;
        }
        if self.tx.send(frame).is_ok() {
            true
        } else {
            let _ = self.dropped_frames.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Mark the connection closed. Returns `true` only for the call that
    /// performed the transition.
    pub fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    /// Whether teardown has started.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Whether the stream reader has been dropped.
    pub fn is_disconnected(&self) -> bool {
        self.tx.is_closed()
    }

    /// The connection's cancellation token.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Total frames dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl std::fmt::Debug for SubscriberConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberConnection")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
