// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::detect::detect_handler;
use super::health::health_handler;
use crate::config::NodeConfig;
use crate::vision::{Detector, PredictParams};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Detector loaded once at startup
    pub detector: Arc<dyn Detector>,
    /// Inference settings applied to every request
    pub params: PredictParams,
}

impl AppState {
    pub fn new(detector: Arc<dyn Detector>, params: PredictParams) -> Self {
        Self { detector, params }
    }
}

/// Build the router
///
/// `body_limit` of `None` accepts request bodies of any size.
pub fn create_app(state: AppState, body_limit: Option<usize>) -> Router {
    let limit = match body_limit {
        Some(bytes) => DefaultBodyLimit::max(bytes),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        // Plate detection
        .route("/detect", post(detect_handler))
        // Health check
        .route("/health", get(health_handler))
        .layer(limit)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: &NodeConfig, state: AppState) -> anyhow::Result<()> {
    let mut app = create_app(state, config.body_limit);
    if config.debug {
        app = app.layer(TraceLayer::new_for_http());
    }

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Detection server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Detection server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
