mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use labtrack_core::{
    load_config, validate_config, BatchScheduler, CommandExtractor, Extractor, FsSessionResolver,
    SessionResolver, StatusReporter,
};

use api::create_router;
use state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("LABTRACK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Extractor program: {}", config.extractor.program);
    info!(
        "Scheduler: max {} cores per job, {} reserved",
        config.scheduler.max_job_cores, config.scheduler.reserved_cores
    );

    // Wire up the scheduler and reporter
    let resolver: Arc<dyn SessionResolver> = Arc::new(FsSessionResolver::new());
    let extractor: Arc<dyn Extractor> =
        Arc::new(CommandExtractor::new(config.extractor.clone()));

    let scheduler = Arc::new(BatchScheduler::new(
        config.scheduler.clone(),
        resolver.clone(),
        extractor,
    ));
    let reporter = StatusReporter::new(resolver, scheduler.clone());
    info!("Batch scheduler initialized");

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), scheduler.clone(), reporter));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop the batch manager loop; in-flight sessions run to completion
    info!("Server shutting down...");
    scheduler.stop();

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
