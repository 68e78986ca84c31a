//! Standalone REST API server binary.
//!
//! ## Purpose
//! Serves the read API over an existing quotes database without running the ingestion loop.
//!
//! ## Intended use
//! Useful for development, or for running extra read replicas next to one writer. The
//! workspace's main `quotes-run` binary serves the same routes and also ingests.

use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use quotes_core::{config::db_path_from_env_value, QuoteStore};

/// Main entry point for the quotes REST API server
///
/// # Environment Variables
/// - `QUOTES_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `QUOTES_DB`: SQLite database path (default: "quotes.db")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the database cannot be opened or its schema ensured,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("QUOTES_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let db_path: PathBuf = db_path_from_env_value(std::env::var("QUOTES_DB").ok());

    tracing::info!("-- Starting quotes REST API on {}", addr);
    tracing::info!("-- Reading quotes from {}", db_path.display());

    let store = QuoteStore::open(&db_path)?;
    store.init()?;
    let app = router(AppState::new(Arc::new(store)));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
