//! Background download worker.
//!
//! Exactly one worker drains the FIFO queue, so tasks run strictly one at a
//! time in submission order. Each task's pipeline runs in its own tokio task:
//! errors and panics both come back as a [`TaskError`] and the worker alone
//! writes the terminal record. Nothing a task does can stop the loop.

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use stdfetch_core::{artifact_filename, Artifact, TaskError, TaskId};

use crate::assembler;
use crate::catalog::Catalog;
use crate::fetcher::{self, PageSource, ProgressSink};
use crate::store::TaskStore;

/// Queue entry: a submitted task awaiting processing.
#[derive(Debug, Clone)]
pub struct QueuedTask {
    pub id: TaskId,
    pub input: String,
}

/// Everything a pipeline run needs; cheap to clone into a spawned task.
#[derive(Clone)]
struct PipelineContext {
    store: Arc<TaskStore>,
    catalog: Arc<dyn Catalog>,
    source: Arc<dyn PageSource>,
    work_root: PathBuf,
}

/// Single-consumer queue worker.
pub struct Worker {
    ctx: PipelineContext,
    rx: mpsc::UnboundedReceiver<QueuedTask>,
}

impl Worker {
    /// Create a new Worker.
    pub fn new(
        store: Arc<TaskStore>,
        catalog: Arc<dyn Catalog>,
        source: Arc<dyn PageSource>,
        work_root: PathBuf,
        rx: mpsc::UnboundedReceiver<QueuedTask>,
    ) -> Self {
        Self {
            ctx: PipelineContext {
                store,
                catalog,
                source,
                work_root,
            },
            rx,
        }
    }

    /// Run until every queue sender is dropped.
    pub async fn run(mut self) {
        info!(work_root = %self.ctx.work_root.display(), "Download worker started");

        while let Some(task) = self.rx.recv().await {
            self.process(task).await;
        }

        info!("Task queue closed, download worker exiting");
    }

    /// Drive one task to a terminal state.
    async fn process(&self, task: QueuedTask) {
        info!(task_id = %task.id, standard = %task.input, "Processing task");

        let handle = tokio::spawn(run_pipeline(self.ctx.clone(), task.clone()));
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) if join_err.is_panic() => {
                let message = panic_message(join_err.into_panic());
                error!(task_id = %task.id, panic = %message, "Pipeline panicked");
                Err(TaskError::Unhandled(message))
            }
            Err(join_err) => Err(TaskError::Unhandled(join_err.to_string())),
        };

        let Some(latest) = self.ctx.store.get(&task.id).await else {
            warn!(task_id = %task.id, "Task record vanished before completion");
            return;
        };

        let record = match outcome {
            Ok(artifact) => {
                info!(task_id = %task.id, filename = %artifact.filename, "Task completed");
                latest.completed(artifact)
            }
            Err(err) => {
                warn!(task_id = %task.id, error = %err, "Task failed");
                latest.failed(&err)
            }
        };

        if let Err(e) = self.ctx.store.publish(record).await {
            error!(task_id = %task.id, error = %e, "Failed to publish terminal status");
        }
    }
}

/// Publishes fetch progress for one task.
struct StoreProgress {
    store: Arc<TaskStore>,
    id: TaskId,
}

#[async_trait]
impl ProgressSink for StoreProgress {
    async fn report(&self, percent: u8) {
        if let Some(current) = self.store.get(&self.id).await {
            if let Err(e) = self.store.publish(current.downloading(percent)).await {
                warn!(task_id = %self.id, error = %e, "Progress update rejected");
            }
        }
    }
}

/// Resolve, fetch and assemble one task.
///
/// Publishes `downloading` and `converting`; the terminal record is left to
/// the caller.
async fn run_pipeline(ctx: PipelineContext, task: QueuedTask) -> Result<Artifact, TaskError> {
    let record = ctx
        .store
        .get(&task.id)
        .await
        .ok_or_else(|| TaskError::Unhandled(format!("unknown task {}", task.id)))?;

    let task_dir = ctx.work_root.join(task.id.as_str());
    let image_dir = task_dir.join("images");
    tokio::fs::create_dir_all(&image_dir)
        .await
        .map_err(|e| TaskError::Unhandled(format!("cannot create working directory: {e}")))?;

    ctx.store
        .publish(record.downloading(0))
        .await
        .map_err(|e| TaskError::Unhandled(e.to_string()))?;

    let pages = ctx.catalog.resolve(&task.input).await?;
    info!(task_id = %task.id, pages = pages.len(), "Fetching page images");

    let progress = StoreProgress {
        store: ctx.store.clone(),
        id: task.id.clone(),
    };
    let summary = fetcher::fetch_pages(ctx.source.as_ref(), &pages, &image_dir, &progress).await;
    info!(
        task_id = %task.id,
        fetched = summary.fetched.len(),
        failed = summary.failed.len(),
        "Fetch batch finished"
    );

    let files = assembler::list_page_files(&image_dir)
        .map_err(|e| TaskError::Unhandled(format!("cannot list page images: {e}")))?;
    if files.is_empty() {
        return Err(TaskError::NoContent);
    }

    let converting = ctx
        .store
        .get(&task.id)
        .await
        .ok_or_else(|| TaskError::Unhandled(format!("unknown task {}", task.id)))?
        .converting();
    ctx.store
        .publish(converting)
        .await
        .map_err(|e| TaskError::Unhandled(e.to_string()))?;

    let filename = artifact_filename(&task.input);
    let output = task_dir.join(&filename);
    let page_count = tokio::task::spawn_blocking(move || assembler::assemble(&files, &output))
        .await
        .map_err(|e| TaskError::Unhandled(format!("assembly task failed: {e}")))??;
    info!(task_id = %task.id, pages = page_count, filename = %filename, "Document assembled");

    Ok(Artifact::new(&task.id, filename))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("internal error: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("internal error: {s}")
    } else {
        "internal error".to_string()
    }
}
