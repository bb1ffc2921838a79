//! Event fan-out to every connection open under a key.

use std::sync::Arc;

use explain_core::RelayEvent;
use metrics::counter;
use tracing::{debug, warn};

use super::frame::Frame;
use super::registry::ChannelRegistry;
use crate::metrics::{RELAY_EVENTS_PUBLISHED_TOTAL, RELAY_FRAMES_DROPPED_TOTAL};

/// Result of one publish.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Connections registered under the key when the snapshot was taken.
    pub recipients: usize,
    /// Frames queued successfully.
    pub delivered: usize,
    /// Frames dropped (gone reader or connection closing).
    pub dropped: usize,
}

/// Delivers events to the connections of a channel.
pub struct EventBroadcaster {
    registry: Arc<ChannelRegistry>,
}

impl EventBroadcaster {
    /// Create a broadcaster over a registry.
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self { registry }
    }

    /// Publish an event to every connection under `key`.
    ///
    /// The event is encoded once and the frame shared. A failed write to one
    /// connection is logged and never affects the others. Publishing to a key
    /// with no connections is a silent no-op.
    pub fn publish(&self, key: &str, event: &RelayEvent) -> PublishOutcome {
        let frame = match Frame::event(event) {
            Ok(f) => f,
            Err(e) => {
                warn!(event_type = %event.event_type, error = %e, "failed to serialize event");
                return PublishOutcome::default();
            }
        };

        let connections = self.registry.get(key);
        let mut outcome = PublishOutcome {
            recipients: connections.len(),
            ..PublishOutcome::default()
        };
        counter!(RELAY_EVENTS_PUBLISHED_TOTAL).increment(1);
        if connections.is_empty() {
            debug!(key, event_type = %event.event_type, "no subscribers for key");
            return outcome;
        }

        for conn in &connections {
            if conn.send(frame.clone()) {
                outcome.delivered += 1;
            } else {
                outcome.dropped += 1;
                warn!(conn_id = %conn.id, key, event_type = %event.event_type, "failed to send event to subscriber");
            }
        }
        if outcome.dropped > 0 {
            counter!(RELAY_FRAMES_DROPPED_TOTAL).increment(outcome.dropped as u64);
        }
        debug!(
            key,
            event_type = %event.event_type,
            recipients = outcome.recipients,
            delivered = outcome.delivered,
            "published event"
        );
        outcome
    }
}
