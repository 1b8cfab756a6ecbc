// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lumen serve` command implementation.
//!
//! Builds the image provider from config and runs the HTTP gateway until
//! SIGINT or SIGTERM.

use std::sync::Arc;

use lumen_config::LumenConfig;
use lumen_core::{ImageProvider, LumenError, PluginAdapter};
use lumen_gateway::GatewayState;
use lumen_lifecycle::install_signal_handler;
use lumen_openai::OpenAiImageProvider;
use tracing::{info, warn};

/// Runs the `lumen serve` command.
pub async fn run_serve(config: LumenConfig) -> Result<(), LumenError> {
    init_tracing(&config.server.log_level);

    info!(
        host = %config.server.host,
        port = config.server.port,
        mode = ?config.runtime.mode,
        "starting lumen serve"
    );

    let provider = Arc::new(OpenAiImageProvider::new(&config)?);
    match provider.health_check().await {
        Ok(status) => info!(provider = provider.name(), status = status.label(), "provider ready"),
        Err(e) => warn!(error = %e, "provider health check failed"),
    }

    let shutdown = install_signal_handler();
    let state = GatewayState::new(provider.clone() as Arc<dyn ImageProvider>);
    let result = lumen_gateway::start_server(&config.server, state, shutdown).await;

    if let Err(e) = provider.shutdown().await {
        warn!(error = %e, "provider shutdown failed");
    }
    info!("lumen serve stopped");
    result
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lumen={log_level},warn")));

    // A second init (tests) is not an error worth reporting.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init();
}
