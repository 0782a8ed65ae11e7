//! Download service facade.
//!
//! The boundary the HTTP layer calls into: submit, poll, retrieve, search.
//! Owns the queue sender and the status table; the raw map never leaves
//! [`TaskStore`].

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use stdfetch_core::{TaskId, TaskRecord, TaskStatus};

use crate::catalog::{Catalog, SearchHit};
use crate::error::ServiceError;
use crate::fetcher::PageSource;
use crate::store::TaskStore;
use crate::worker::{QueuedTask, Worker};

/// An opened artifact ready to stream.
#[derive(Debug)]
pub struct ArtifactFile {
    pub filename: String,
    pub file: tokio::fs::File,
    pub len: u64,
}

/// Facade over the task store, queue and catalog.
#[derive(Clone)]
pub struct DownloadService {
    store: Arc<TaskStore>,
    queue: mpsc::UnboundedSender<QueuedTask>,
    catalog: Arc<dyn Catalog>,
    work_root: PathBuf,
}

impl DownloadService {
    /// Build the service and spawn its single background worker.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn(
        catalog: Arc<dyn Catalog>,
        source: Arc<dyn PageSource>,
        work_root: PathBuf,
    ) -> (Self, JoinHandle<()>) {
        let store = Arc::new(TaskStore::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Worker::new(
            store.clone(),
            catalog.clone(),
            source,
            work_root.clone(),
            rx,
        );
        let handle = tokio::spawn(worker.run());

        let service = Self {
            store,
            queue: tx,
            catalog,
            work_root,
        };
        (service, handle)
    }

    /// Shared status table (for metrics and the sweeper).
    pub fn store(&self) -> Arc<TaskStore> {
        self.store.clone()
    }

    /// Whether the background worker is still draining the queue.
    pub fn is_accepting(&self) -> bool {
        !self.queue.is_closed()
    }

    /// Root of the per-task working directories.
    pub fn work_root(&self) -> &PathBuf {
        &self.work_root
    }

    /// Accept a download request and queue it. Never runs pipeline work.
    pub async fn submit(&self, input: &str) -> Result<TaskId, ServiceError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Please enter a standard number".to_string(),
            ));
        }

        let id = TaskId::generate();
        // Visible to pollers before the worker can possibly see it.
        self.store.insert(TaskRecord::pending(id.clone(), input)).await;

        let queued = QueuedTask {
            id: id.clone(),
            input: input.to_string(),
        };
        if self.queue.send(queued).is_err() {
            warn!(task_id = %id, "Worker is gone, rejecting submission");
            self.store.remove(&id).await;
            return Err(ServiceError::QueueClosed);
        }

        info!(task_id = %id, standard = %input, "Task queued");
        Ok(id)
    }

    /// Current status record of a task.
    pub async fn get_status(&self, id: &TaskId) -> Result<TaskRecord, ServiceError> {
        self.store.get(id).await.ok_or(ServiceError::TaskNotFound)
    }

    /// Open a completed task's artifact.
    ///
    /// Not found unless the task is completed and `filename` is exactly the
    /// recorded artifact name.
    pub async fn retrieve(&self, id: &TaskId, filename: &str) -> Result<ArtifactFile, ServiceError> {
        if !id.is_path_safe() {
            return Err(ServiceError::ArtifactNotFound);
        }
        let record = self.store.get(id).await.ok_or(ServiceError::ArtifactNotFound)?;
        let artifact = match (&record.status, &record.result) {
            (TaskStatus::Completed, Some(artifact)) if artifact.filename == filename => artifact,
            _ => {
                debug!(task_id = %id, status = %record.status, "Artifact not available");
                return Err(ServiceError::ArtifactNotFound);
            }
        };

        let path = self.work_root.join(id.as_str()).join(&artifact.filename);
        let file = tokio::fs::File::open(&path).await.map_err(|e| {
            warn!(task_id = %id, path = %path.display(), error = %e, "Artifact missing on disk");
            ServiceError::ArtifactNotFound
        })?;
        let len = file
            .metadata()
            .await
            .map_err(|_| ServiceError::ArtifactNotFound)?
            .len();

        Ok(ArtifactFile {
            filename: artifact.filename.clone(),
            file,
            len,
        })
    }

    /// Search the catalog by keyword.
    pub async fn search(&self, keyword: &str) -> Result<Vec<SearchHit>, ServiceError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Please enter a search keyword".to_string(),
            ));
        }
        Ok(self.catalog.search(keyword).await?)
    }
}
