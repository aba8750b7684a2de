// src/main.rs
use anyhow::{Context, Result};
use rust_tcp_server::{config, logging::LoggingContext, ServerBuilder, ServerConfig};
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration; fall back to defaults when no path is given
    let config = match std::env::args().nth(1) {
        Some(path) => config::load_config(&path)
            .await
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => ServerConfig::default(),
    };

    // Initialize logging
    LoggingContext::new(&config.logging)
        .init_global()
        .context("Failed to install logger")?;

    let mut server = ServerBuilder::new(config).build();
    let addr = server.start().await.context("Server failed to start")?;
    info!("Accepting connections on {}", addr);

    shutdown_signal().await;

    server.stop().await;
    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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

    info!("Shutdown signal received");
}
