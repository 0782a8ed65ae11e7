//! Task submission, status and artifact handlers.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tokio_util::io::ReaderStream;
use tracing::debug;

use stdfetch_core::{percent_encode, TaskId};

use crate::error::ServiceError;
use crate::http::responses::{DownloadRequest, DownloadResponse, ErrorResponse, StatusResponse};
use crate::state::AppState;

/// Queue a new download task.
pub async fn submit_download(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DownloadRequest>,
) -> Result<Json<DownloadResponse>, ServiceError> {
    let task_id = state.service.submit(&req.standard_num).await?;
    Ok(Json(DownloadResponse {
        success: true,
        task_id: Some(task_id.into_inner()),
        message: None,
    }))
}

/// Poll a task's status.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Response {
    match state.service.get_status(&TaskId::new(task_id)).await {
        Ok(record) => Json(StatusResponse::from(record)).into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "status": "not_found" })),
        )
            .into_response(),
    }
}

/// Stream a completed task's PDF.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path((task_id, filename)): Path<(String, String)>,
) -> Response {
    let id = TaskId::new(task_id);
    let artifact = match state.service.retrieve(&id, &filename).await {
        Ok(artifact) => artifact,
        Err(e) => {
            debug!(task_id = %id, filename = %filename, error = %e, "Artifact request refused");
            return not_found(e);
        }
    };

    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        percent_encode(&artifact.filename)
    );
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_LENGTH, artifact.len.to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    let body = Body::from_stream(ReaderStream::new(artifact.file));

    (headers, body).into_response()
}

fn not_found(err: ServiceError) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}
