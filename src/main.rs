use redfish_aggregator::{utils::config::Config, Application};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; RUST_LOG overrides the configured default
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_level(true)
        .init();

    info!("Starting Redfish Aggregator v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::new().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    // Initialize application
    let app = Application::new(config).await.map_err(|e| {
        error!("Failed to initialize application: {}", e);
        e
    })?;

    // Start the API server
    app.start().await.map_err(|e| {
        error!("Failed to start application: {}", e);
        e
    })?;

    // Wait for shutdown signal
    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(err) => error!("Failed to listen for shutdown signal: {}", err),
    }

    // Perform graceful shutdown
    if let Err(e) = app.shutdown().await {
        error!("Error during shutdown: {}", e);
    }

    info!("Application shutdown complete");
    Ok(())
}
