//! divelogd - dive log HTTP service
//!
//! Startup owns the store handle: one pool is built here, the schema is
//! applied, and the handle is passed to the router. Nothing else holds
//! a global connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use divelog_config::{AppConfig, LogFormat};
use divelog_db::{DbClient, DbConnectionBuilder, PoolSettings};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = AppConfig::load().context("Failed to load configuration")?;

    divelog_obs::init("divelogd", cfg.log.format == LogFormat::Json);

    let db = &cfg.database;
    let opts = DbConnectionBuilder::new(db.name.as_str())
        .host(db.host.as_str())
        .port(db.port)
        .username(db.user.as_str())
        .password(db.password.as_str())
        .statement_timeout(Duration::from_millis(db.statement_timeout_ms))
        .build();
    let settings = PoolSettings {
        max_connections: db.max_connections,
        acquire_timeout: Duration::from_secs(db.acquire_timeout_secs),
    };

    let client = DbClient::with_options(opts, settings)
        .await
        .context("Failed to connect to database")?;
    info!(host = %db.host, port = db.port, database = %db.name, "Connected to database");

    client
        .init_schema()
        .await
        .context("Failed to initialise schema")?;

    let (app, state) = divelog_api::build_app(Arc::new(client.clone()))?;

    let addr: SocketAddr = cfg
        .http_bind()
        .parse()
        .with_context(|| format!("Invalid HTTP bind address '{}'", cfg.http_bind()))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    // Mark ready just before serving
    divelog_api::set_ready(&state, true);

    info!(%addr, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    divelog_api::set_ready(&state, false);
    client.close().await;
    info!("divelogd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
