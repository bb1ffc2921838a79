//! Server configuration.

use std::time::Duration;

use explain_settings::ServerSettings;
use serde::{Deserialize, Serialize};

/// Configuration for the relay server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Keep-alive period for idle subscriber streams, in milliseconds.
    pub keepalive_interval_ms: u64,
    /// Max request body size in bytes.
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Build from loaded settings.
    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            keepalive_interval_ms: settings.keepalive_interval_ms,
            max_body_bytes: settings.max_body_bytes,
        }
    }

    /// Keep-alive period as a `Duration`.
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            keepalive_interval_ms: 30_000,
            max_body_bytes: 20 * 1024 * 1024, // 20 MB
        }
    }
}
