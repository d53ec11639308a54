//! # Keel ERP API Server
//!
//! REST API for the Keel small-business ERP.
//!
//! ```text
//! Client ───► HTTP (8080) ───► /api/<module>/... ───► SQLite
//! ```

use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::EnvFilter;

use keel_api::routes::api_router;
use keel_api::{ApiConfig, AppState};
use keel_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting Keel ERP API server...");

    // Load configuration
    let config = ApiConfig::load()?;
    info!(
        port = config.http_port,
        database = %config.database_path,
        "Configuration loaded"
    );

    // Connect to the database and run migrations
    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    info!("Database ready");

    // Build shared state and router
    let port = config.http_port;
    let state = AppState::new(db, config);
    let app = api_router().with_state(state);

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!(%addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
