//! Duration Prediction Service - Main Entry Point
//!
//! Loads the trained vectorizer and model, then serves `POST /predict`.
//! An optional configuration file path may be given as the first argument.

use anyhow::Result;
use duration_prediction::{
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, ServiceMetrics},
    models::inference::InferenceEngine,
    server::{self, AppState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };

    init_logging(&config.logging)?;
    info!("Starting Duration Prediction Service");
    info!(
        artifact = %config.model.artifact_path.display(),
        "Configuration loaded successfully"
    );

    let engine = Arc::new(InferenceEngine::new(&config)?);
    let metrics = Arc::new(ServiceMetrics::new());

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let addr = config.server.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;

    let state = AppState::new(engine, metrics.clone());
    server::serve(listener, state, server::shutdown_signal()).await?;

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn")
            .add_directive(format!("duration_prediction={}", logging.level).parse()?),
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }

    Ok(())
}
