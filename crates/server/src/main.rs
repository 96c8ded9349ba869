//! House price prediction server
//!
//! Resolves the trained model artifact exactly once at startup, then serves
//! predictions over HTTP. A failed resolution leaves the server running in a
//! degraded state: health and liveness stay reachable, predictions return 503.

use anyhow::Result;
use serving_lib::{FileStore, PredictionService, ServiceStatus, ServingMetrics, StructuredLogger};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting price-server");

    // Load configuration once; changing it requires a restart
    let config = config::ServerConfig::load()?;
    let strategy = config.strategy()?;

    let logger = StructuredLogger::new("price-server");
    logger.log_startup(SERVER_VERSION, &strategy.to_string());

    // One-time blocking resolution, completed before the listener binds so no
    // request can observe a partially-initialized state
    let store = FileStore::new(&config.mlruns_root);
    let service = Arc::new(PredictionService::initialize(&strategy, &store));

    let metrics = ServingMetrics::new();
    match service.status() {
        ServiceStatus::Ready => {
            logger.log_model_resolved(&strategy.to_string());
            metrics.set_model_info(&strategy.to_string(), "ready");
        }
        _ => {
            let detail = service.resolution_error().unwrap_or("unknown");
            logger.log_resolution_failed(detail);
            metrics.set_model_info(&strategy.to_string(), "degraded");
        }
    }

    let app_state = Arc::new(api::AppState::new(service, metrics, logger.clone()));

    // Start the HTTP server
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            logger.log_shutdown("SIGINT received");
        }
        result = api_handle => {
            result??;
        }
    }
    info!("Shutting down");

    Ok(())
}
