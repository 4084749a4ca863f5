//! Metrics Server
//!
//! HTTP endpoint serving the registry in the Prometheus text format, plus a
//! small health document.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// `None` when identity resolution is disabled
    pub identity_synced: Option<bool>,
}

/// Reports whether the identity directory has finished its first listing.
pub type SyncProbe = Arc<dyn Fn() -> bool + Send + Sync>;

/// Metrics server state.
#[derive(Clone)]
pub struct MetricsState {
    pub registry: Registry,
    pub sync_probe: Option<SyncProbe>,
}

impl MetricsState {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            sync_probe: None,
        }
    }

    pub fn with_sync_probe(mut self, probe: SyncProbe) -> Self {
        self.sync_probe = Some(probe);
        self
    }
}

/// Metrics HTTP server.
pub struct MetricsServer {
    listen_addr: String,
    state: MetricsState,
}

impl MetricsServer {
    pub fn new(listen_addr: String, state: MetricsState) -> Self {
        Self { listen_addr, state }
    }

    /// Build the router.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the metrics server.
    ///
    /// The final Ok(()) is excluded from coverage since axum::serve runs forever.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(&self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("metrics endpoint listening on {}", self.listen_addr);

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

// Handler functions

/// GET /metrics - Prometheus text format.
///
/// Gathering runs the collectors, which block on the stat command, so it is
/// moved off the async workers.
async fn metrics_handler(State(state): State<MetricsState>) -> impl IntoResponse {
    let registry = state.registry.clone();
    let families = match tokio::task::spawn_blocking(move || registry.gather()).await {
        Ok(families) => families,
        Err(e) => {
            tracing::error!("spawn_blocking error: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain".to_string())],
                "gather error".to_string(),
            );
        }
    };

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        tracing::error!("encoding metrics: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain".to_string())],
            "encoding error".to_string(),
        );
    }

    match String::from_utf8(buffer) {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, encoder.format_type().to_string())],
            text,
        ),
        Err(e) => {
            tracing::error!("converting metrics to string: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain".to_string())],
                "encoding error".to_string(),
            )
        }
    }
}

/// GET /health
async fn health_handler(State(state): State<MetricsState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        identity_synced: state.sync_probe.as_ref().map(|probe| probe()),
    })
}
