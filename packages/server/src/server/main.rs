// Main entry point for API server and job workers

use std::sync::Arc;

use anyhow::{Context, Result};
use materials_core::domains::catalog::CatalogJobHandler;
use materials_core::kernel::jobs::{JobWorkerConfig, WorkerPool};
use materials_core::kernel::ServerDeps;
use materials_core::{server::build_app, Config};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,materials_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting materials spec pipeline");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        workers = config.worker_concurrency,
        llm = config.openai_api_key.is_some(),
        consensus_mode = config.consensus_mode,
        "Configuration loaded"
    );

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let deps = ServerDeps::from_config(pool, &config)?;

    // Job workers
    let shutdown = CancellationToken::new();
    let workers = WorkerPool::spawn(
        config.worker_concurrency,
        deps.jobs.clone(),
        Arc::new(CatalogJobHandler::new(deps.clone())),
        JobWorkerConfig::default(),
        shutdown.clone(),
    );

    // Build application
    let app = build_app(deps, config.admin_api_key, &config.allowed_origins);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await
        .context("Server error")?;

    // Let in-flight jobs finish
    shutdown.cancel();
    workers.join().await;
    tracing::info!("Workers stopped");

    Ok(())
}
