//! HTTP request and response types.

use serde::{Deserialize, Serialize};

use stdfetch_core::{TaskRecord, TaskStatus};

use crate::catalog::SearchHit;

// ============================================================================
// Download types
// ============================================================================

/// Request body for the download endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadRequest {
    /// Standard identifier, e.g. `GB/T 19001-2016`.
    #[serde(default)]
    pub standard_num: String,
}

/// Response body for the download endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================================
// Status types
// ============================================================================

/// Response body for the status endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: TaskStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl From<TaskRecord> for StatusResponse {
    fn from(record: TaskRecord) -> Self {
        let (download_url, filename) = match record.result {
            Some(artifact) => (Some(artifact.download_url), Some(artifact.filename)),
            None => (None, None),
        };
        Self {
            status: record.status,
            progress: record.progress,
            message: record.message,
            download_url,
            filename,
        }
    }
}

// ============================================================================
// Search types
// ============================================================================

/// Request body for the search endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub keyword: String,
}

/// Response body for the search endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<SearchHit>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================================
// Error types
// ============================================================================

/// Error response for artifact retrieval.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use stdfetch_core::{Artifact, TaskId};

    #[test]
    fn test_status_response_omits_absent_fields() {
        let record = TaskRecord::pending(TaskId::new("t1"), "GB 1");
        let json = serde_json::to_value(StatusResponse::from(record)).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("progress").is_none());
        assert!(json.get("download_url").is_none());
    }

    #[test]
    fn test_status_response_flattens_artifact() {
        let id = TaskId::new("t1");
        let record = TaskRecord::pending(id.clone(), "GB/T 1")
            .downloading(100)
            .converting()
            .completed(Artifact::new(&id, "GBT 1.pdf"));
        let json = serde_json::to_value(StatusResponse::from(record)).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["filename"], "GBT 1.pdf");
        assert_eq!(json["download_url"], "/download/t1/GBT%201.pdf");
    }
}
