//! Error types for the CLI client.

use thiserror::Error;

/// Errors that can occur when talking to the download server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Task or file not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server refused the request.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The task finished in the error state.
    #[error("download failed: {0}")]
    TaskFailed(String),

    /// Unexpected response body.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Writing the downloaded file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
