//! Bill Audit API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin bill-audit-api
//!
//! # Run with environment variables
//! AUDIT_PORT=9000 AUDIT_SESSION_TTL_SECS=900 cargo run --bin bill-audit-api
//! ```
//!
//! # Environment Variables
//!
//! * `AUDIT_HOST` - Server host (default: 0.0.0.0)
//! * `AUDIT_PORT` - Server port (default: 8080)
//! * `AUDIT_LOG_LEVEL` - Log level when RUST_LOG is unset (default: info)
//! * `AUDIT_SESSION_TTL_SECS` - How long reports stay retrievable (default: 3600)
//! * `AUDIT_SWEEP_INTERVAL_SECS` - How often expired reports are purged (default: 60)
//! * `AUDIT_MAX_BODY_BYTES` - Largest accepted request body (default: 2 MiB)

use std::net::SocketAddr;

use anyhow::Context;
use chrono::Utc;
use interface_api::{config::ApiConfig, create_router, AppState, ReportStore};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = load_config();
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        session_ttl_secs = config.session_ttl().num_seconds(),
        "Starting Bill Audit API Server"
    );

    let state = AppState::new(config.clone());
    let sweeper = tokio::spawn(sweep_expired_reports(
        state.sessions.clone(),
        config.sweep_interval(),
    ));

    let app = create_router(state);
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads configuration from the environment, falling back to defaults
fn load_config() -> ApiConfig {
    match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Tracing is not installed yet
            eprintln!("Invalid configuration ({}), using defaults", e);
            ApiConfig::default()
        }
    }
}

/// Initializes the tracing subscriber for structured logging
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Purges expired reports on a fixed interval
async fn sweep_expired_reports(sessions: ReportStore, every: std::time::Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let removed = sessions.sweep_expired(Utc::now()).await;
        if removed > 0 {
            tracing::debug!(removed, "Expired reports purged");
        }
    }
}

/// Waits for Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed the error is logged and that signal is
/// ignored, so the server keeps running.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
