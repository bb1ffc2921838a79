//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ExplainSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{ExplainSettings, StorageBackend};

/// Resolve the default settings file path (`~/.explain/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".explain").join("settings.json")
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<ExplainSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Defaults merged with the settings file, without env overrides.
fn load_file_layer(path: &Path) -> Result<ExplainSettings> {
    let defaults = serde_json::to_value(ExplainSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut ExplainSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Invalid values are ignored with a warning (file/default value stays).
/// `PORT` is honoured for compatibility but `EXPLAIN_PORT` wins when both
/// are set.
pub fn apply_overrides_from<F>(settings: &mut ExplainSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env.string("EXPLAIN_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env.u16_in("PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.u16_in("EXPLAIN_PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.u64_in("EXPLAIN_KEEPALIVE_MS", 1_000, 600_000) {
        settings.server.keepalive_interval_ms = v;
    }
    if let Some(v) = env.usize_in("EXPLAIN_MAX_BODY_BYTES", 1_024, 1_073_741_824) {
        settings.server.max_body_bytes = v;
    }

    // ── Storage ─────────────────────────────────────────────────────
    if let Some(v) = env.string("EXPLAIN_STORAGE") {
        match StorageBackend::parse(&v) {
            Some(backend) => settings.storage.backend = backend,
            None => tracing::warn!(key = "EXPLAIN_STORAGE", value = %v, "unknown storage backend, ignoring"),
        }
    }
    if let Some(v) = env.string("EXPLAIN_DATA_DIR") {
        settings.storage.data_dir = Some(v);
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("EXPLAIN_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    fn u16_in(&self, name: &str, min: u16, max: u16) -> Option<u16> {
        let val = self.string(name)?;
        let result = parse_u16_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
        }
        result
    }

    fn u64_in(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }

    fn usize_in(&self, name: &str, min: usize, max: usize) -> Option<usize> {
        let val = self.string(name)?;
        let result = parse_usize_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"server": {"port": 5785, "host": "0.0.0.0"}});
        let source = serde_json::json!({"server": {"port": 9090}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["port"], 9090);
        assert_eq!(merged["server"]["host"], "0.0.0.0");
    }

    #[test]
    fn merge_null_preserves_target() {
        let merged = deep_merge(
            serde_json::json!({"a": 1, "b": 2}),
            serde_json::json!({"a": null}),
        );
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_array_replace() {
        let merged = deep_merge(
            serde_json::json!({"items": [1, 2, 3]}),
            serde_json::json!({"items": [4]}),
        );
        assert_eq!(merged["items"], serde_json::json!([4]));
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let merged = deep_merge(
            serde_json::json!({"a": {"nested": true}}),
            serde_json::json!({"a": 42}),
        );
        assert_eq!(merged["a"], 42);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let settings = load_file_layer(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings.server.port, 5785);
        assert_eq!(settings.storage.backend, StorageBackend::File);
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"server": {"keepaliveIntervalMs": 15000}, "storage": {"backend": "memory"}}"#,
        )
        .unwrap();

        let settings = load_file_layer(&path).unwrap();
        assert_eq!(settings.server.keepalive_interval_ms, 15_000);
        assert_eq!(settings.server.port, 5785);
        assert_eq!(settings.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result.unwrap_err(), SettingsError::Json(_)));
    }

    #[test]
    fn load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server": {"maxBodyBytes": 0}}"#).unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result.unwrap_err(), SettingsError::InvalidValue(_)));
    }

    // ── env overrides ───────────────────────────────────────────────

    #[test]
    fn env_overrides_server_values() {
        let mut settings = ExplainSettings::default();
        apply_overrides_from(
            &mut settings,
            lookup_from(&[
                ("EXPLAIN_HOST", "127.0.0.1"),
                ("EXPLAIN_PORT", "8088"),
                ("EXPLAIN_KEEPALIVE_MS", "15000"),
                ("EXPLAIN_MAX_BODY_BYTES", "4096"),
            ]),
        );
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8088);
        assert_eq!(settings.server.keepalive_interval_ms, 15_000);
        assert_eq!(settings.server.max_body_bytes, 4096);
    }

    #[test]
    fn legacy_port_applies_when_alone() {
        let mut settings = ExplainSettings::default();
        apply_overrides_from(&mut settings, lookup_from(&[("PORT", "7000")]));
        assert_eq!(settings.server.port, 7000);
    }

    #[test]
    fn explain_port_wins_over_legacy_port() {
        let mut settings = ExplainSettings::default();
        apply_overrides_from(
            &mut settings,
            lookup_from(&[("PORT", "7000"), ("EXPLAIN_PORT", "7001")]),
        );
        assert_eq!(settings.server.port, 7001);
    }

    #[test]
    fn invalid_env_values_ignored() {
        let mut settings = ExplainSettings::default();
        apply_overrides_from(
            &mut settings,
            lookup_from(&[
                ("EXPLAIN_PORT", "not-a-port"),
                ("EXPLAIN_KEEPALIVE_MS", "10"),
                ("EXPLAIN_STORAGE", "sqlite"),
                ("EXPLAIN_HOST", "   "),
            ]),
        );
        assert_eq!(settings.server.port, 5785);
        assert_eq!(settings.server.keepalive_interval_ms, 30_000);
        assert_eq!(settings.storage.backend, StorageBackend::File);
        assert_eq!(settings.server.host, "0.0.0.0");
    }

    #[test]
    fn env_overrides_storage_and_logging() {
        let mut settings = ExplainSettings::default();
        apply_overrides_from(
            &mut settings,
            lookup_from(&[
                ("EXPLAIN_STORAGE", "memory"),
                ("EXPLAIN_DATA_DIR", "/var/lib/explain"),
                ("EXPLAIN_LOG_LEVEL", "debug"),
            ]),
        );
        assert_eq!(settings.storage.backend, StorageBackend::Memory);
        assert_eq!(settings.storage.data_dir.as_deref(), Some("/var/lib/explain"));
        assert_eq!(settings.logging.level, "debug");
    }

    // ── parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_u16_bounds() {
        assert_eq!(parse_u16_range("9090", 1, 65535), Some(9090));
        assert_eq!(parse_u16_range("0", 1, 65535), None);
        assert_eq!(parse_u16_range("99999", 1, 65535), None);
        assert_eq!(parse_u16_range("abc", 1, 65535), None);
    }

    #[test]
    fn parse_u64_bounds() {
        assert_eq!(parse_u64_range("30000", 1_000, 600_000), Some(30_000));
        assert_eq!(parse_u64_range("500", 1_000, 600_000), None);
        assert_eq!(parse_u64_range("700000", 1_000, 600_000), None);
    }

    #[test]
    fn parse_usize_bounds() {
        assert_eq!(parse_usize_range(" 50 ", 1, 10_000), Some(50));
        assert_eq!(parse_usize_range("0", 1, 10_000), None);
    }
}
