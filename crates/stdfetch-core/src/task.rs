//! Task status records and artifacts.

use crate::{TaskError, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// The produced document of a completed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// File name inside the task's working directory.
    pub filename: String,

    /// Retrieval path, `/download/{task_id}/{filename}` with the filename
    /// percent-encoded.
    pub download_url: String,
}

impl Artifact {
    /// Create the artifact descriptor for a task.
    pub fn new(task_id: &TaskId, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let download_url = format!(
            "/download/{}/{}",
            task_id.as_str(),
            percent_encode(&filename)
        );
        Self {
            filename,
            download_url,
        }
    }
}

/// Snapshot of a task's state as seen by pollers.
///
/// Records are never patched in place: every transition builds a new record
/// from the previous one and replaces it wholesale in the status table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique task identifier.
    pub id: TaskId,

    /// Standard identifier supplied by the caller.
    pub input: String,

    /// Current status.
    pub status: TaskStatus,

    /// Fetch progress in percent; only set while downloading.
    pub progress: Option<u8>,

    /// Human-readable detail.
    pub message: Option<String>,

    /// Only set once completed.
    pub result: Option<Artifact>,

    /// When the task was submitted.
    pub created_at: DateTime<Utc>,

    /// When the record was last replaced.
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Create the initial record for a freshly submitted task.
    pub fn pending(id: TaskId, input: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            input: input.into(),
            status: TaskStatus::Pending,
            progress: None,
            message: Some("Waiting in queue...".to_string()),
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn next(&self, status: TaskStatus) -> Self {
        Self {
            id: self.id.clone(),
            input: self.input.clone(),
            status,
            progress: None,
            message: None,
            result: None,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }

    /// Record for the download phase at the given progress.
    pub fn downloading(&self, progress: u8) -> Self {
        Self {
            progress: Some(progress.min(100)),
            message: Some("Downloading page images...".to_string()),
            ..self.next(TaskStatus::Downloading)
        }
    }

    /// Record for the assembly phase. No percentage is reported here.
    pub fn converting(&self) -> Self {
        Self {
            message: Some("Converting to PDF...".to_string()),
            ..self.next(TaskStatus::Converting)
        }
    }

    /// Terminal success record.
    pub fn completed(&self, artifact: Artifact) -> Self {
        Self {
            message: Some("Completed".to_string()),
            result: Some(artifact),
            ..self.next(TaskStatus::Completed)
        }
    }

    /// Terminal failure record.
    pub fn failed(&self, error: &TaskError) -> Self {
        Self {
            message: Some(error.to_string()),
            ..self.next(TaskStatus::Error)
        }
    }

    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Name of the PDF produced for a standard identifier.
///
/// Path separators are dropped so the name stays a single path component:
/// `GB/T 19001-2016` becomes `GBT 19001-2016.pdf`.
pub fn artifact_filename(input: &str) -> String {
    let stem: String = input
        .trim()
        .chars()
        .filter(|c| *c != '/' && *c != '\\')
        .collect();
    let stem = if stem.is_empty() || stem == "." || stem == ".." {
        "document".to_string()
    } else {
        stem
    };
    format!("{}.pdf", stem)
}

/// Everything outside the RFC 3986 unreserved set.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a single URL path segment (or RFC 5987 `filename*` value).
pub fn percent_encode(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}
