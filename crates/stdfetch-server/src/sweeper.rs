//! Eviction of finished tasks.
//!
//! Finished tasks and their working directories would otherwise accumulate
//! for the life of the process. The sweeper drops terminal tasks whose last
//! update is older than the retention window. Active tasks are never touched.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::store::TaskStore;

/// Periodic TTL sweeper over the task store.
pub struct Sweeper {
    store: Arc<TaskStore>,
    work_root: PathBuf,
    retention: Duration,
    interval: Duration,
}

impl Sweeper {
    /// Create a new Sweeper.
    pub fn new(
        store: Arc<TaskStore>,
        work_root: PathBuf,
        retention: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            work_root,
            retention,
            interval,
        }
    }

    /// Sweep forever at the configured interval.
    pub async fn run(self) {
        info!(
            retention_secs = self.retention.as_secs(),
            interval_secs = self.interval.as_secs(),
            "Eviction sweeper started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately; nothing can be expired yet.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.sweep_at(Utc::now()).await;
        }
    }

    /// Evict everything that expired as of `now`. Returns how many tasks
    /// were dropped.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let retention = chrono::Duration::from_std(self.retention).unwrap_or(chrono::Duration::MAX);
        let cutoff = now.checked_sub_signed(retention).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let evicted = self.store.evict_terminal_before(cutoff).await;

        for id in &evicted {
            if !id.is_path_safe() {
                continue;
            }
            let dir = self.work_root.join(id.as_str());
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => debug!(task_id = %id, "Working directory removed"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(task_id = %id, error = %e, "Failed to remove working directory"),
            }
        }

        if !evicted.is_empty() {
            info!(evicted = evicted.len(), "Evicted expired tasks");
        }
        evicted.len()
    }
}
