//! # explain-relay
//!
//! Relay server binary: loads settings, opens the stores, and serves the
//! HTTP endpoints until Ctrl-C.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use explain_server::config::ServerConfig;
use explain_server::server::ExplainServer;
use explain_settings::{ExplainSettings, StorageBackend, StorageSettings};
use explain_store::{
    BlobStore, FsBlobStore, InMemoryBlobStore, InMemoryRecordStore, JsonFileRecordStore,
    RecordStore,
};

/// Explain relay server.
#[derive(Parser, Debug)]
#[command(name = "explain-relay", about = "Per-key server-sent event relay")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Settings file (default `~/.explain/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory for the file storage backend.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level or `tracing` filter directive.
    #[arg(long)]
    log_level: Option<String>,

    /// Storage backend: `memory` or `file`.
    #[arg(long, value_parser = parse_backend)]
    storage: Option<StorageBackend>,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings.
    fn apply(&self, settings: &mut ExplainSettings) {
        if let Some(ref host) = self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(ref dir) = self.data_dir {
            settings.storage.data_dir = Some(dir.to_string_lossy().into_owned());
        }
        if let Some(ref level) = self.log_level {
            settings.logging.level.clone_from(level);
        }
        if let Some(backend) = self.storage {
            settings.storage.backend = backend;
        }
    }
}

fn parse_backend(value: &str) -> std::result::Result<StorageBackend, String> {
    StorageBackend::parse(value).ok_or_else(|| format!("unknown storage backend `{value}`"))
}

/// Open the record and blob stores for the configured backend.
async fn open_stores(
    storage: &StorageSettings,
) -> Result<(Arc<dyn RecordStore>, Arc<dyn BlobStore>)> {
    match storage.backend {
        StorageBackend::Memory => Ok((
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryBlobStore::new()),
        )),
        StorageBackend::File => {
            let records_path = storage.records_path();
            let records = JsonFileRecordStore::open(&records_path)
                .await
                .with_context(|| format!("Failed to open records: {}", records_path.display()))?;
            Ok((
                Arc::new(records),
                Arc::new(FsBlobStore::new(storage.images_dir())),
            ))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings_path = args
        .config
        .clone()
        .unwrap_or_else(explain_settings::settings_path);
    let mut settings = explain_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("Failed to load settings: {}", settings_path.display()))?;
    args.apply(&mut settings);

    explain_core::logging::init_subscriber(&settings.logging.level);

    let (records, blobs) = open_stores(&settings.storage).await?;

    let mut server = ExplainServer::new(ServerConfig::from_settings(&settings.server), records, blobs);
    match explain_server::metrics::install_recorder() {
        Ok(handle) => server = server.with_metrics(handle),
        Err(e) => tracing::warn!(error = %e, "metrics recorder unavailable, /metrics disabled"),
    }

    let (addr, handle) = server.listen().await.context("Failed to bind server")?;
    tracing::info!(
        storage = ?settings.storage.backend,
        data_dir = %settings.storage.data_dir().display(),
        "Explain relay listening on http://{addr}"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server.shutdown().graceful_shutdown(vec![handle], None).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
