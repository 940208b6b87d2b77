//! URLhaus Proxy server binary
//!
//! Loads configuration, wires the in-memory stores, and serves the API until
//! SIGINT/SIGTERM.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use urlhaus_proxy::{create_router, spawn_cleanup_task, Config, InMemoryBackend};

/// Main entry point for the URLhaus proxy.
///
/// # Startup Sequence
/// 1. Load `.env` if present
/// 2. Initialize tracing subscriber for logging
/// 3. Load configuration from environment variables
/// 4. Build the cache and counter stores, limiters and upstream client
/// 5. Start background expiry sweeps for both stores
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "urlhaus_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting URLhaus proxy");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, upstream={}, strict={}/{}ms, general={}/{}ms, fail_closed={}",
        config.server_port,
        config.urlhaus_api_url,
        config.rate_limit_max_requests,
        config.rate_limit_window_ms,
        config.general_rate_limit_max_requests,
        config.general_rate_limit_window_ms,
        config.rate_limit_fail_closed
    );

    let backend =
        InMemoryBackend::from_config(&config).context("failed to build URLhaus client")?;

    let sweeps = vec![
        spawn_cleanup_task(backend.cache_store.clone(), "cache", config.cleanup_interval),
        spawn_cleanup_task(backend.counter_store.clone(), "counters", config.cleanup_interval),
    ];
    info!("Background expiry sweeps started");

    let app = create_router(backend.state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(sweeps))
    .await
    .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweeps.
async fn shutdown_signal(sweeps: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for sweep in sweeps {
        sweep.abort();
    }
    warn!("Expiry sweeps aborted");
}
