//! HTTP server for the download service.
//!
//! Provides endpoints for:
//! - Task submission (`/api/download`)
//! - Status polling (`/api/status/:task_id`)
//! - Artifact retrieval (`/download/:task_id/:filename`)
//! - Catalog search (`/api/search`)
//! - Health check (`/health`)
//! - Prometheus metrics (`/metrics`)

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod handlers;
pub mod responses;

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    // The bundled web page and the CLI may live on other origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // API routes
        .route("/api/download", post(handlers::submit_download))
        .route("/api/status/:task_id", get(handlers::get_status))
        .route("/api/search", post(handlers::search))
        // Artifact route
        .route("/download/:task_id/:filename", get(handlers::download_file))
        // Observability routes
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
