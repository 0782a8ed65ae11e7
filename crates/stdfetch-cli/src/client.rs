//! HTTP client for the download server's REST endpoints.

use std::path::{Path, PathBuf};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use stdfetch_core::TaskStatus;

use crate::error::ClientError;

/// Status record as returned by `/api/status/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusView {
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// One search hit as returned by `/api/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct HitView {
    pub standard_num: String,
    pub standard_name: String,
    pub release_date: String,
    pub status: String,
    #[serde(default)]
    pub page_count: String,
}

#[derive(Debug, Deserialize)]
struct SubmitReply {
    success: bool,
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchReply {
    success: bool,
    #[serde(default)]
    results: Vec<HitView>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the download server.
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Queue a download and return the task id.
    pub async fn submit(&self, standard: &str) -> Result<String, ClientError> {
        let reply: SubmitReply = self
            .post_json("/api/download", json!({ "standard_num": standard }))
            .await?;
        match (reply.success, reply.task_id) {
            (true, Some(task_id)) => Ok(task_id),
            _ => Err(ClientError::Rejected(
                reply.message.unwrap_or_else(|| "no task id returned".to_string()),
            )),
        }
    }

    /// Fetch a task's current status.
    pub async fn status(&self, task_id: &str) -> Result<StatusView, ClientError> {
        let path = format!("/api/status/{task_id}");
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET request");

        let response = self.inner.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(format!("task {task_id}")));
        }
        let response = response.error_for_status()?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))
    }

    /// Search the catalog.
    pub async fn search(&self, keyword: &str) -> Result<Vec<HitView>, ClientError> {
        let reply: SearchReply = self
            .post_json("/api/search", json!({ "keyword": keyword }))
            .await?;
        if !reply.success {
            return Err(ClientError::Rejected(
                reply.message.unwrap_or_else(|| "search failed".to_string()),
            ));
        }
        Ok(reply.results)
    }

    /// Stream an artifact into `out_dir`. Returns the written path.
    pub async fn download(
        &self,
        download_url: &str,
        filename: &str,
        out_dir: &Path,
    ) -> Result<PathBuf, ClientError> {
        let url = format!("{}{}", self.base_url, download_url);
        debug!(url = %url, "Downloading artifact");

        let mut response = self.inner.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(filename.to_string()));
        }
        response = response.error_for_status()?;

        let path = output_path(out_dir, filename);
        let mut file = tokio::fs::File::create(&path).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(path)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST request");

        // Validation failures come back as 400 with a JSON body worth reading.
        let response = self.inner.post(&url).json(&body).send().await?;
        if response.status().is_server_error() {
            return Err(ClientError::Rejected(format!(
                "HTTP {}: {}",
                response.status(),
                path
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))
    }
}

/// Destination for a downloaded artifact; only the final path component of
/// the server-provided name is used.
pub fn output_path(out_dir: &Path, filename: &str) -> PathBuf {
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "document.pdf".into());
    out_dir.join(name)
}
