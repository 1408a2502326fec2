//! HTTP server for the Prometheus metrics endpoint.
//!
//! Runs on a separate tokio task and serves `/metrics` for scraping and
//! `/healthz` for liveness probes.

use crate::config::MetricsConfig;
use axum::{Router, routing::get};

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn router() -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(health_handler))
}

/// Run the HTTP server for Prometheus metrics.
///
/// This is a long-running task that should be spawned in the background.
pub async fn run_http_server(config: MetricsConfig) {
    let addr = format!("{}:{}", config.bind, config.port);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind metrics endpoint");
            return;
        }
    };
    tracing::info!(addr = %addr, "Metrics endpoint listening");

    if let Err(e) = axum::serve(listener, router()).await {
        tracing::error!(error = %e, "Metrics endpoint error");
    }
}
