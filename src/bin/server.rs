//! Cookbook REST server
//!
//! Serves CRUD and search endpoints for recipes, ingredients, steps and
//! techniques under `/api`.
//!
//! # Configuration
//!
//! Read from `COOKBOOK_CONFIG` (default: `<config_dir>/cookbook/config.yaml`),
//! overridden by `COOKBOOK_DATABASE_PATH`, `COOKBOOK_SEARCH_BACKEND`,
//! `COOKBOOK_SEARCH_PATH`, `COOKBOOK_PORT` and `COOKBOOK_APP_NAME`.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint
//! - `/api/{recipes,ingredients,steps,techniques}[/{id}]`: entity CRUD
//! - `GET /api/_search/{plural}?query=`: free-text search

use std::net::SocketAddr;
use std::path::PathBuf;

use cookbook::{server, Config, Services};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cookbook=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config_path = std::env::var("COOKBOOK_CONFIG").ok().map(PathBuf::from);
    let config = Config::load(config_path)?;

    tracing::info!("Database: {}", config.database_path.value.display());
    tracing::info!(
        "Search index: {} ({})",
        config.search.backend.value,
        config.search.path.value.display()
    );

    let services = Services::from_config(&config).await?;
    let app = server::router(&services, &config.app_name.value);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port.value));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::warn!("Failed to install signal handler: {}", e);
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
