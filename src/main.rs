// src/main.rs
use anyhow::Context;
use dotenv::dotenv;
use reqwest::Client;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod accounts;
mod app;
mod auth;
mod common;
mod cors_middleware;
mod health;
mod logging_middleware;
mod rate_limit_middleware;
mod recovery_middleware;
mod security_headers_middleware;
mod services;
mod session;
mod timeout_middleware;
mod users;

#[cfg(test)]
mod test_support;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use common::{AppConfig, AppState};
use services::GoogleService;

/// How often expired rate-limit windows are evicted
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Logging comes up before configuration so config warnings are visible
    let debug = env::var("DEBUG")
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    let default_level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let config = Arc::new(AppConfig::from_env().context("invalid configuration")?);
    info!(
        port = config.server.port,
        debug = config.server.debug,
        rate_limit_enabled = config.security.rate_limit_enabled,
        "Configuration loaded"
    );

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    let database_url = &config.database.url;
    if let Some(path_part) = database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid DATABASE_URL: {}", database_url))?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_open_conns)
        .max_lifetime(config.database.conn_max_lifetime)
        .connect_with(connect_options)
        .await
        .context("failed to connect to database")?;

    // Run database migrations
    common::migrations::run_migrations(&pool, config.database.reset)
        .await
        .context("database migration failed")?;

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let http_client = Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()?;

    let google_service = Arc::new(GoogleService::new(http_client, config.oauth.clone()));

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let app_state = AppState::new(pool.clone(), config.clone(), google_service);

    let shutdown = CancellationToken::new();
    let cleanup_task = app_state
        .rate_limit_service
        .clone()
        .start_cleanup_task(RATE_LIMIT_CLEANUP_INTERVAL, shutdown.clone());
    info!("Rate limit cleanup task started");

    let app = app::build_router(app_state);

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    tokio::spawn(watch_shutdown_signals(shutdown.clone()));

    let graceful = shutdown.clone();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { graceful.cancelled().await });
    let mut server_task = tokio::spawn(async move { server.await });

    tokio::select! {
        joined = &mut server_task => {
            joined.context("server task failed")?.context("server error")?;
        }
        _ = shutdown.cancelled() => {
            info!(
                timeout_secs = config.server.shutdown_timeout.as_secs(),
                "Shutting down server"
            );
            match tokio::time::timeout(config.server.shutdown_timeout, &mut server_task).await {
                Ok(joined) => joined.context("server task failed")?.context("server error")?,
                Err(_) => {
                    warn!("Graceful shutdown timed out; dropping remaining connections");
                    server_task.abort();
                }
            }
        }
    }

    shutdown.cancel();
    if let Err(e) = cleanup_task.await {
        error!(error = %e, "Rate limit cleanup task failed");
    }
    pool.close().await;

    info!("Server exited");
    Ok(())
}

/// Cancels `shutdown` on SIGINT or SIGTERM
async fn watch_shutdown_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }

    shutdown.cancel();
}
