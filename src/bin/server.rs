use anyhow::Result;
use clap::Parser;
use csvdock::config::AppConfig;
use csvdock::http::app_server::AppServer;
use csvdock::telemetry::{init_telemetry, shutdown_telemetry};
use csvdock::CsvEngine;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "csvdock-server", about = "CSV upload and projection HTTP server")]
struct Cli {
    /// Path to config file. Environment variables prefixed with CSVDOCK_ are applied on top.
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let now = Instant::now();
    init_telemetry().map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let cli = Cli::parse();

    tracing::info!("Starting csvdock HTTP server");

    // Load configuration
    let config = AppConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match &cli.config {
        Some(path) => tracing::info!("Configuration '{}' loaded successfully", path),
        None => tracing::info!("Configuration loaded from defaults and environment"),
    }

    let engine = CsvEngine::from_config(&config).await?;

    let app = AppServer::new(engine);
    let engine = app.engine.clone();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server started in {}ms", now.elapsed().as_millis());
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown())
        .await?;

    // Explicitly shutdown engine to close catalog connection
    if let Err(e) = engine.shutdown().await {
        tracing::error!("Error during engine shutdown: {}", e);
    }

    tracing::info!("Server shutdown complete");
    shutdown_telemetry();

    Ok(())
}

async fn shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
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

    tracing::info!("Shutdown signal received, stopping server...");
}
