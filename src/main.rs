use search_poller::{Config, HttpServer, SearchScheduler};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "search_poller=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting search poller");

    // Load configuration from environment
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {e}");
        e
    })?;

    config.validate().map_err(|e| {
        error!("Configuration validation failed: {e}");
        e
    })?;

    info!("Configuration loaded successfully");
    info!("Redis URL: {}", config.redis_url);
    info!("Search API: {}", config.search_api_url);
    info!("Result store: {}", config.store_url);
    info!(
        "Accounts: {}, rate limit: {} per {}ms",
        config.accounts.len(),
        config.rate_limit,
        config.rate_window_ms
    );

    // Create scheduler
    let scheduler = Arc::new(SearchScheduler::from_config(config.clone()).await.map_err(|e| {
        error!("Failed to create scheduler: {e}");
        e
    })?);

    // Start HTTP server for health checks and metrics
    let http_server = HttpServer::new(scheduler.clone(), config.http_port);
    let http_handle = tokio::spawn(async move {
        if let Err(e) = http_server.start().await {
            error!("HTTP server error: {e}");
        }
    });

    // Set up graceful shutdown
    let shutdown_scheduler = scheduler.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl-c");
        warn!("Received Ctrl-C, initiating graceful shutdown...");

        if let Err(e) = shutdown_scheduler.stop().await {
            error!("Error during shutdown: {e}");
        }
    });

    // Run the worker fleet; returns once every worker has stopped
    let result = scheduler.start().await;

    http_handle.abort();

    match result {
        Ok(()) => {
            info!("Scheduler shut down gracefully");
            Ok(())
        }
        Err(e) => {
            error!("Scheduler error: {e}");
            Err(e.into())
        }
    }
}
