//! Channel registry: subscriber key → open connections.

use std::collections::HashMap;
use std::sync::Arc;

use explain_core::{ConnectionId, SubscriberKey};
use parking_lot::RwLock;
use tracing::warn;

use super::connection::SubscriberConnection;

/// Maps each subscriber key to its live connections.
///
/// A single lock guards the whole map, so register, deregister, and lookup
/// never observe a half-applied change. Channels are created on first
/// register and removed when their last connection leaves.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: RwLock<HashMap<SubscriberKey, Vec<Arc<SubscriberConnection>>>>,
}

impl ChannelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection under its own key.
    ///
    /// Returns `false` (and leaves the channel unchanged) if a connection
    /// with the same ID is already registered there.
    pub fn register(&self, connection: Arc<SubscriberConnection>) -> bool {
        let mut channels = self.channels.write();
        let channel = channels.entry(connection.key().clone()).or_default();
        if channel.iter().any(|c| c.id == connection.id) {
            warn!(key = %connection.key(), conn_id = %connection.id, "connection already registered");
            return false;
        }
        channel.push(connection);
        true
    }

    /// Remove a connection. Unknown keys and IDs are a no-op returning `false`.
    pub fn deregister(&self, key: &str, connection_id: &ConnectionId) -> bool {
        let mut channels = self.channels.write();
        let Some(channel) = channels.get_mut(key) else {
            return false;
        };
        let before = channel.len();
        channel.retain(|c| &c.id != connection_id);
        let removed = channel.len() < before;
        if channel.is_empty() {
            let _ = channels.remove(key);
        }
        removed
    }

    /// Snapshot of the connections currently registered under `key`.
    pub fn get(&self, key: &str) -> Vec<Arc<SubscriberConnection>> {
        self.channels.read().get(key).cloned().unwrap_or_default()
    }

    /// Number of connections under `key`.
    pub fn channel_len(&self, key: &str) -> usize {
        self.channels.read().get(key).map_or(0, Vec::len)
    }

    /// Total connections across all channels.
    pub fn connection_count(&self) -> usize {
        self.channels.read().values().map(Vec::len).sum()
    }

    /// Number of keys with at least one connection.
    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }
}
