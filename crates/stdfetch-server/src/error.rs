//! Facade errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::catalog::CatalogError;

/// Errors surfaced by the download service facade.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Empty standard number or keyword.
    #[error("{0}")]
    InvalidInput(String),

    /// Unknown (or evicted) task id.
    #[error("Task not found")]
    TaskNotFound,

    /// Artifact missing, not ready, or the filename does not match.
    #[error("File not found")]
    ArtifactNotFound,

    /// The worker has stopped and no longer accepts tasks.
    #[error("Download queue is closed")]
    QueueClosed,

    /// Search against the catalog failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::TaskNotFound | Self::ArtifactNotFound => StatusCode::NOT_FOUND,
            Self::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
            Self::Catalog(ref e) => {
                error!(error = %e, "Catalog request failed");
                StatusCode::BAD_GATEWAY
            }
        };

        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
