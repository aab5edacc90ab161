use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docforge_core::{
    config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH},
    load_config, validate_config, CleanupScheduler, JobOrchestrator, ProgressTracker,
    StorageManager, StrategyRegistry,
};
use docforge_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
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
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Originals directory: {:?}", config.storage.originals_dir);
    info!("Processed directory: {:?}", config.storage.processed_dir);

    // Storage roots
    let storage = Arc::new(
        StorageManager::init(&config.storage)
            .await
            .context("Failed to initialize storage")?,
    );

    // Strategies, in resolution order
    let registry = Arc::new(StrategyRegistry::with_defaults(&config.tools));
    info!(
        conversions = ?registry.conversion_names(),
        compressions = ?registry.compression_names(),
        "Strategy registry initialized"
    );
    for (name, reason) in registry.validate_all().await {
        warn!(strategy = %name, "Strategy unavailable: {}", reason);
    }

    let tracker = Arc::new(ProgressTracker::new());

    let orchestrator = Arc::new(JobOrchestrator::new(
        Arc::clone(&storage),
        registry,
        Arc::clone(&tracker),
        &config.jobs,
        &config.upload,
    ));
    info!(
        max_concurrent = config.jobs.max_concurrent_jobs,
        "Job orchestrator initialized"
    );

    // Expiry sweep
    let scheduler = CleanupScheduler::new(
        storage,
        tracker,
        &config.storage,
        config.jobs.snapshot_retention(),
    );
    scheduler.start();
    info!("Cleanup scheduler started");

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), orchestrator));

    // Create router
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

    info!("Server shutting down...");
    scheduler.stop();
    info!("Cleanup scheduler stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
