use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eps_proxy_rs::{EpsClient, Settings, build_app};

#[tokio::main]
async fn main() -> Result<()> {
    // Read configuration from environment
    let settings = Arc::new(Settings::from_env());

    // Initialize tracing/logging; RUST_LOG overrides the LOG_LEVEL setting
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting EPS proxy service");

    // Missing credentials degrade the service but do not prevent startup;
    // /health surfaces the gap as env_configured: false.
    let missing = settings.missing_credentials();
    if missing.is_empty() {
        tracing::info!("All EPS env variables loaded successfully");
    } else {
        tracing::error!("Missing EPS env variables: {}", missing.join(", "));
    }

    let client = EpsClient::new(settings.clone()).context("Failed to initialize EPS client")?;

    // Build axum app with routes
    let app = build_app(client, settings.clone());

    // Bind server
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down EPS proxy service");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}
