//! `ExplainServer`: Axum HTTP server wiring the relay and customer endpoints.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use explain_store::{BlobStore, RecordStore};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::api::{customers, publish, subscribe};
use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::metrics;
use crate::relay::{ChannelRegistry, EventBroadcaster, SubscriptionManager};
use crate::shutdown::ShutdownCoordinator;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Key → connections map.
    pub registry: Arc<ChannelRegistry>,
    /// Event fan-out.
    pub broadcaster: Arc<EventBroadcaster>,
    /// Opens subscriber streams.
    pub subscriptions: Arc<SubscriptionManager>,
    /// Customer records.
    pub records: Arc<dyn RecordStore>,
    /// Uploaded images.
    pub blobs: Arc<dyn BlobStore>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// The relay server.
pub struct ExplainServer {
    config: ServerConfig,
    state: AppState,
}

impl ExplainServer {
    /// Create a new server over the given stores.
    pub fn new(
        config: ServerConfig,
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let registry = Arc::new(ChannelRegistry::new());
        let shutdown = Arc::new(ShutdownCoordinator::new());
        let subscriptions = Arc::new(SubscriptionManager::new(
            registry.clone(),
            config.keepalive_interval(),
            shutdown.child_token(),
        ));
        let state = AppState {
            broadcaster: Arc::new(EventBroadcaster::new(registry.clone())),
            registry,
            subscriptions,
            records,
            blobs,
            shutdown,
            start_time: Instant::now(),
            metrics: None,
        };
        Self { config, state }
    }

    /// Serve `/metrics` from this handle.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.state.metrics = Some(handle);
        self
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/api/send", post(publish::send_event))
            .route("/subscribe/{key}", get(subscribe::subscribe))
            .route("/events/{key}", get(subscribe::subscribe))
            .route("/api/customer", post(customers::create_customer))
            .route("/api/customer/{key}", get(customers::list_customers))
            .route("/api/upload", post(customers::upload_image))
            .route("/api/image/{filename}", get(customers::get_image));
        if self.state.metrics.is_some() {
            router = router.route("/metrics", get(metrics_handler));
        }
        router
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Bind and serve in a background task until shutdown is requested.
    ///
    /// Returns the bound address (useful with port 0) and the serve task.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;
        let app = self.router();
        let token = self.state.shutdown.token();

        info!(
            %addr,
            keepalive_ms = self.config.keepalive_interval_ms,
            records = self.state.records.backend_name(),
            blobs = self.state.blobs.backend_name(),
            "relay server listening"
        );

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!(error = %e, "server error");
            }
            info!("relay server stopped");
        });
        Ok((addr, handle))
    }

    /// Get the channel registry.
    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.state.registry
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let resp = health::health_check(
        state.start_time,
        state.registry.connection_count(),
        state.registry.channel_count(),
    );
    Json(resp)
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.metrics.as_ref().map(metrics::render).unwrap_or_default();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}
