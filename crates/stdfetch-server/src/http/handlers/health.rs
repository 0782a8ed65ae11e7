//! Liveness and Prometheus endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use stdfetch_core::TaskStatus;

use crate::state::AppState;

/// Worker liveness plus queue occupancy. 503 once the worker has stopped,
/// since submissions can no longer make progress.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let accepting = state.service.is_accepting();
    let counts = state.service.store().status_counts().await;
    let count_of = |wanted: &[TaskStatus]| -> u64 {
        counts
            .iter()
            .filter(|(status, _)| wanted.contains(status))
            .map(|(_, n)| n)
            .sum()
    };

    let (code, status, worker) = if accepting {
        (StatusCode::OK, "ok", "running")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable", "stopped")
    };

    let body = json!({
        "status": status,
        "worker": worker,
        "queued": count_of(&[TaskStatus::Pending]),
        "active": count_of(&[TaskStatus::Downloading, TaskStatus::Converting]),
    });
    (code, Json(body))
}

/// Task gauges in Prometheus text format.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::collect_metrics(&state).await,
    )
}
