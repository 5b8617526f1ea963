//! HTTP server: router assembly, layers and lifecycle.

pub mod api;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use api::AppState;

/// Build the full application router with tracing (and CORS in dev mode).
pub fn build_router(state: Arc<AppState>) -> Router {
    let dev_mode = state.config.dev_mode;
    let mut app = api::api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if dev_mode {
        app = app.layer(CorsLayer::permissive());
    }
    app
}

/// Start the luigi server and run until Ctrl+C.
pub async fn start_server(config: Config) -> Result<()> {
    config.ensure_directories()?;
    if config.jira.credentials.is_none() {
        tracing::warn!("Jira credentials not configured; /jira endpoints will fail");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::from_config(config)?);
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!(
        addr = %local_addr,
        repos = %state.config.repos_dir.display(),
        "luigi listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
