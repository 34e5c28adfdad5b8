//! Model server - mock ML prediction service
//!
//! Serves a prediction endpoint backed by an ONNX artifact when one is
//! available on disk, and by a deterministic fallback classifier otherwise,
//! alongside health and metrics endpoints.

use anyhow::Result;
use server_lib::{api, ModelAdapter, PredictionService, ServiceLogger, ServiceMetrics};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::ServerConfig::load()?;

    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_lowercase())),
        )
        .with(fmt::layer().json())
        .init();

    info!(environment = %config.environment, "Starting model-server");

    // Load the model, falling back to the synthetic classifier when no
    // artifact is present
    let adapter = Arc::new(ModelAdapter::load(
        &config.model_path,
        &config.api_version,
        config.n_features,
    ));
    let model_info = adapter.info();

    // Initialize metrics
    let metrics = ServiceMetrics::new();
    metrics.set_model_version(&config.api_version, &model_info.model_type);

    // Initialize structured logger
    let logger = ServiceLogger::new(config.environment.as_str());
    logger.log_startup(SERVER_VERSION, &config.api_version);

    // Create shared application state
    let service = PredictionService::new(adapter, metrics.clone(), logger.clone());
    let state = Arc::new(api::AppState::new(
        service,
        config.api_version.as_str(),
        metrics,
    ));

    // Start the HTTP server
    let host = config.host.clone();
    tokio::spawn(async move { api::serve(&host, config.port, state).await });

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
