//! Settings types.
//!
//! All structs use camelCase on disk and `#[serde(default)]`, so a settings
//! file only needs the keys it changes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExplainSettings {
    /// HTTP server and relay tunables.
    pub server: ServerSettings,
    /// Customer record and image storage.
    pub storage: StorageSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl ExplainSettings {
    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.keepalive_interval_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "server.keepaliveIntervalMs must be greater than 0".into(),
            ));
        }
        if self.server.max_body_bytes == 0 {
            return Err(SettingsError::InvalidValue(
                "server.maxBodyBytes must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Server network and relay settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port (`0` picks a free port).
    pub port: u16,
    /// Interval between keep-alive comment frames on each subscriber stream.
    pub keepalive_interval_ms: u64,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5785,
            keepalive_interval_ms: 30_000,
            max_body_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Which record/blob backend to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; lost on restart.
    Memory,
    /// A JSON file for records and a directory for images.
    #[default]
    File,
}

impl StorageBackend {
    /// Parse the lowercase name used in settings and env vars.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "file" => Some(Self::File),
            _ => None,
        }
    }
}

/// Storage settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Backend selection.
    pub backend: StorageBackend,
    /// Data directory for the file backend (default `~/.explain/data`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

impl StorageSettings {
    /// File name of the customer record file inside the data directory.
    pub const RECORDS_FILE: &'static str = "customers.json";
    /// Sub-directory holding uploaded images.
    pub const IMAGES_DIR: &'static str = "images";

    /// Effective data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .as_ref()
            .map_or_else(default_data_dir, PathBuf::from)
    }

    /// Path of the customer record file.
    pub fn records_path(&self) -> PathBuf {
        self.data_dir().join(Self::RECORDS_FILE)
    }

    /// Directory for uploaded images.
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir().join(Self::IMAGES_DIR)
    }
}

fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".explain").join("data")
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `tracing` filter directive, e.g. `info` or `explain_server=debug`.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
