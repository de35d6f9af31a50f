//! HTTP boundary: JSON over axum, delegating every operation to [`AccountService`].

mod error;
mod handlers;
mod types;

pub use types::*;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use tracing::{info, warn};

use crate::application::AccountService;
use crate::config::ServerConfig;

/// Build the application router.
pub fn router(service: AccountService) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/accounts", post(handlers::create_account))
        .route("/accounts/{id}", get(handlers::get_account))
        .route(
            "/transactions",
            post(handlers::transfer).get(handlers::list_transfers),
        )
        .fallback(handlers::not_found)
        .with_state(service)
}

/// Serve the API until Ctrl-C. In-flight requests are drained on shutdown;
/// a dropped request drops its transaction, which rolls back.
pub async fn serve(service: AccountService, config: &ServerConfig) -> Result<()> {
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!(%address, "Server listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
