//! Catalog search handler.

use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::info;

use crate::error::ServiceError;
use crate::http::responses::{SearchRequest, SearchResponse};
use crate::state::AppState;

/// Search the catalog by keyword.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ServiceError> {
    let hits = state.service.search(&req.keyword).await?;
    info!(keyword = %req.keyword.trim(), hits = hits.len(), "Search finished");

    let message = hits.is_empty().then(|| {
        format!(
            "No standards matched \"{}\". Try another keyword.",
            req.keyword.trim()
        )
    });

    Ok(Json(SearchResponse {
        success: true,
        results: Some(hits),
        message,
    }))
}
