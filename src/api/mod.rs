//! Status server: health and auth debugging endpoints.

pub mod handlers;

use crate::watchdog::{AuthFlagSource, StatusHandle, WatchdogCommander};
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::watch};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Everything the handlers need to describe and poke the watchdog.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn AuthFlagSource>,
    pub context: Arc<dyn AuthFlagSource>,
    pub status: StatusHandle,
    pub commander: WatchdogCommander,
}

#[must_use]
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/debug/auth", get(handlers::debug::auth_state))
        .route("/debug/auth/fix", post(handlers::debug::fix))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(state)),
        )
}

/// Serve the status API until `shutdown` flips to true.
///
/// # Errors
/// Returns an error if the port cannot be bound or the server fails.
pub async fn serve(port: u16, state: ApiState, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("failed to bind status port {port}"))?;

    info!("status server listening on port {port}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await?;

    Ok(())
}
