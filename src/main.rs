use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use quotes_core::{CoreConfig, HttpQuoteSource, IngestionLoop, QuoteStore};

/// Main entry point for the quotes application
///
/// Runs the ingestion loop as a background task and serves the read API:
/// - the loop polls the upstream source every `QUOTES_POLL_INTERVAL_SECS` and stores new quotes
/// - the REST server answers on port 3000 (configurable via QUOTES_REST_ADDR)
///
/// The loop and the REST layer each open their own handle on the database.
///
/// # Environment Variables
/// - `QUOTES_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `QUOTES_DB`: SQLite database path (default: "quotes.db")
/// - `QUOTES_SOURCE_URL`: upstream endpoint (default: "https://zenquotes.io/api/quotes")
/// - `QUOTES_POLL_INTERVAL_SECS`: seconds between cycles (default: 50)
/// - `QUOTES_FETCH_TIMEOUT_SECS`: upstream request timeout (default: 30)
/// - `QUOTES_SHUTDOWN_GRACE_SECS`: how long shutdown waits for the loop (default: 5)
///
/// # Returns
/// * `Ok(())` - If the server ran and shut down cleanly
/// * `Err(anyhow::Error)` - If configuration, storage or server startup fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quotes_run=info".parse()?)
                .add_directive("quotes_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CoreConfig::from_env_values(
        std::env::var("QUOTES_DB").ok(),
        std::env::var("QUOTES_SOURCE_URL").ok(),
        std::env::var("QUOTES_POLL_INTERVAL_SECS").ok(),
        std::env::var("QUOTES_FETCH_TIMEOUT_SECS").ok(),
        std::env::var("QUOTES_SHUTDOWN_GRACE_SECS").ok(),
    )?;
    let rest_addr = std::env::var("QUOTES_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let rest_addr: SocketAddr = match rest_addr.parse() {
        Ok(addr) => addr,
        Err(e) => anyhow::bail!("invalid QUOTES_REST_ADDR '{}': {}", rest_addr, e),
    };

    tracing::info!("++ Using database {}", cfg.db_path().display());
    tracing::info!(
        "++ Polling {} every {}s",
        cfg.source_url(),
        cfg.poll_interval().as_secs()
    );

    let api_store = QuoteStore::open(cfg.db_path())?;
    api_store.init()?;
    let loop_store = QuoteStore::open(cfg.db_path())?;

    let source = HttpQuoteSource::new(cfg.source_url(), cfg.fetch_timeout())?;
    let ingestion = IngestionLoop::new(Arc::new(loop_store), source, cfg.poll_interval()).spawn();
    tracing::info!("++ Ingestion loop started");

    let rest_app = router(AppState::new(Arc::new(api_store)));
    tracing::info!("++ Starting quotes REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    let served = axum::serve(listener, rest_app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if ingestion.shutdown(cfg.shutdown_grace()).await {
        tracing::info!("-- Ingestion loop stopped");
    } else {
        tracing::warn!("-- Ingestion loop aborted after grace period");
    }

    served?;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("failed to listen for SIGTERM: {}", e);
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

    tracing::info!("-- Shutdown signal received");
}
