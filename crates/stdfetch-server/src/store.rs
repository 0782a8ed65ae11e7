//! Task status table.
//!
//! The only shared mutable structure in the service. One writer (the worker,
//! one task at a time), many readers (pollers). Every write replaces a whole
//! [`TaskRecord`], so readers never see a half-updated record.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::warn;

use stdfetch_core::{CoreError, TaskId, TaskRecord, TaskStatus};

/// Lock-guarded map of task records.
#[derive(Default)]
pub struct TaskStore {
    tasks: RwLock<HashMap<TaskId, TaskRecord>>,
}

impl TaskStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly submitted record.
    pub async fn insert(&self, record: TaskRecord) {
        self.tasks.write().await.insert(record.id.clone(), record);
    }

    /// Snapshot of a task's current record.
    pub async fn get(&self, id: &TaskId) -> Option<TaskRecord> {
        self.tasks.read().await.get(id).cloned()
    }

    /// Remove a record outright (used when a submission cannot be queued).
    pub async fn remove(&self, id: &TaskId) -> Option<TaskRecord> {
        self.tasks.write().await.remove(id)
    }

    /// Replace a task's record, enforcing the state machine.
    ///
    /// Rejects transitions the state machine does not allow and progress
    /// that moves backwards within `downloading`.
    pub async fn publish(&self, record: TaskRecord) -> Result<(), CoreError> {
        let mut tasks = self.tasks.write().await;
        let current = tasks
            .get(&record.id)
            .ok_or_else(|| CoreError::TaskNotFound(record.id.to_string()))?;

        if !current.status.can_transition_to(record.status) {
            warn!(
                task_id = %record.id,
                from = %current.status,
                to = %record.status,
                "Rejected status regression"
            );
            return Err(CoreError::InvalidStateTransition {
                from: current.status.to_string(),
                to: record.status.to_string(),
            });
        }

        if let (TaskStatus::Downloading, TaskStatus::Downloading) = (current.status, record.status) {
            let from = current.progress.unwrap_or(0);
            let to = record.progress.unwrap_or(0);
            if to < from {
                return Err(CoreError::ProgressRegression { from, to });
            }
        }

        tasks.insert(record.id.clone(), record);
        Ok(())
    }

    /// Number of tracked tasks.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Count of tasks per status, in pipeline order.
    pub async fn status_counts(&self) -> Vec<(TaskStatus, u64)> {
        let tasks = self.tasks.read().await;
        TaskStatus::ALL
            .iter()
            .map(|status| {
                let count = tasks.values().filter(|t| t.status == *status).count() as u64;
                (*status, count)
            })
            .collect()
    }

    /// Drop terminal tasks last updated before `cutoff`. Returns their ids.
    pub async fn evict_terminal_before(&self, cutoff: DateTime<Utc>) -> Vec<TaskId> {
        let mut tasks = self.tasks.write().await;
        let expired: Vec<TaskId> = tasks
            .values()
            .filter(|t| t.is_terminal() && t.updated_at < cutoff)
            .map(|t| t.id.clone())
            .collect();
        for id in &expired {
            tasks.remove(id);
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stdfetch_core::{Artifact, TaskError};

    fn pending(id: &str) -> TaskRecord {
        TaskRecord::pending(TaskId::new(id), "GB/T 1")
    }

    #[tokio::test]
    async fn test_publish_follows_state_machine() {
        let store = TaskStore::new();
        let record = pending("t1");
        store.insert(record.clone()).await;

        let downloading = record.downloading(10);
        store.publish(downloading.clone()).await.unwrap();
        store.publish(downloading.downloading(50)).await.unwrap();

        let converting = downloading.converting();
        store.publish(converting.clone()).await.unwrap();

        let artifact = Artifact::new(&record.id, "GBT 1.pdf");
        store.publish(converting.completed(artifact)).await.unwrap();

        let stored = store.get(&record.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
        assert!(stored.result.is_some());
    }

    #[tokio::test]
    async fn test_terminal_state_is_final() {
        let store = TaskStore::new();
        let record = pending("t1");
        store.insert(record.clone()).await;
        store.publish(record.failed(&TaskError::NoContent)).await.unwrap();

        let err = store.publish(record.downloading(0)).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { .. }));
        assert_eq!(store.get(&record.id).await.unwrap().status, TaskStatus::Error);
    }

    #[tokio::test]
    async fn test_progress_cannot_go_backwards() {
        let store = TaskStore::new();
        let record = pending("t1");
        store.insert(record.clone()).await;
        store.publish(record.downloading(60)).await.unwrap();

        let err = store.publish(record.downloading(30)).await.unwrap_err();
        assert!(matches!(err, CoreError::ProgressRegression { from: 60, to: 30 }));
    }

    #[tokio::test]
    async fn test_publish_unknown_task() {
        let store = TaskStore::new();
        let err = store.publish(pending("ghost").downloading(0)).await.unwrap_err();
        assert!(matches!(err, CoreError::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn test_eviction_skips_active_tasks() {
        let store = TaskStore::new();
        let active = pending("active");
        let done = pending("done");
        store.insert(active.clone()).await;
        store.insert(done.clone()).await;
        store.publish(done.failed(&TaskError::NotFound)).await.unwrap();

        let evicted = store.evict_terminal_before(Utc::now() + chrono::Duration::seconds(1)).await;
        assert_eq!(evicted, vec![done.id.clone()]);
        assert!(store.get(&done.id).await.is_none());
        assert!(store.get(&active.id).await.is_some());
    }

    #[tokio::test]
    async fn test_status_counts() {
        let store = TaskStore::new();
        store.insert(pending("a")).await;
        store.insert(pending("b")).await;
        let counts = store.status_counts().await;
        assert_eq!(counts[0], (TaskStatus::Pending, 2));
        assert_eq!(counts.len(), TaskStatus::ALL.len());
    }
}
