// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use lumen_config::model::ServerConfig;
use lumen_core::{ImageProvider, LumenError};

use crate::error::handle_panic;
use crate::handlers;

/// Largest accepted request body. Leaves room above the 10 MiB image cap so
/// oversized files reach the file check instead of the transport limit.
pub const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub provider: Arc<dyn ImageProvider>,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(provider: Arc<dyn ImageProvider>) -> Self {
        Self {
            provider,
            start_time: Instant::now(),
        }
    }
}

/// Builds the gateway router:
/// - POST /api/generate
/// - POST /api/image-to-image
/// - POST /api/optimize-prompt
/// - GET /health
pub fn build_router(state: GatewayState) -> Router {
    let api_routes = Router::new()
        .route("/api/generate", post(handlers::post_generate))
        .route("/api/image-to-image", post(handlers::post_image_to_image))
        .route("/api/optimize-prompt", post(handlers::post_optimize_prompt))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves the gateway on an already-bound listener until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), LumenError> {
    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| LumenError::Internal(format!("gateway server error: {e}")))?;
    tracing::info!("gateway server stopped");
    Ok(())
}

/// Binds `host:port` from config and serves until `shutdown` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), LumenError> {
    let listener = bind(config).await?;
    serve(listener, state, shutdown).await
}

/// Binds the configured address. Port 0 picks a free port.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, LumenError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| LumenError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;
    let local: Option<SocketAddr> = listener.local_addr().ok();
    tracing::info!(addr = ?local, "gateway server listening");
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_port_zero_picks_free_port() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        let listener = bind(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn bind_reports_bad_address() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        let err = bind(&config).await.unwrap_err();
        assert!(err.to_string().contains("failed to bind gateway"));
    }
}
