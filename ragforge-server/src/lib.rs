//! HTTP surface for the Ingestion and Retrieval Orchestrators (§6).
//!
//! [`build_app`] wires the routes onto a shared [`AppState`]; [`serve`]
//! binds a listener and drives the server through SIGTERM/SIGINT drain.

pub mod error;
pub mod routes;
pub mod shutdown;
pub mod state;

pub use error::ApiError;
pub use shutdown::ShutdownCoordinator;
pub use state::AppState;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the axum `Router` serving every endpoint in §6's API surface.
#[must_use]
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/ingest", post(routes::ingest::ingest))
        .route("/v1/documents/:id", put(routes::ingest::update_document))
        .route("/v1/documents/:id", delete(routes::ingest::delete_document))
        .route("/v1/collections", post(routes::collections::create_collection))
        .route("/v1/collections/:name", delete(routes::collections::delete_collection))
        .route("/v1/retrieve", post(routes::retrieve::retrieve))
        .route("/health", get(routes::health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `state.config.server.bind_addr` and serve until a SIGTERM/SIGINT
/// triggers graceful drain (§6). Returns once the drain completes.
///
/// # Errors
///
/// Returns an error if the bind address cannot be parsed or the listener
/// cannot be bound.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let bind_addr = state.config.server.bind_addr.clone();
    let shutdown = std::sync::Arc::clone(&state.shutdown);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(bind_addr, "ragforge-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_shutdown_signal(shutdown))
        .await?;

    Ok(())
}
