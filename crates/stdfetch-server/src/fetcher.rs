//! Page image fetching.
//!
//! Pages are fetched one after another into the task's image directory.
//! A failed page is logged and skipped; the batch always runs to the end.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use thiserror::Error;
use tracing::{debug, warn};

use stdfetch_core::PageRef;

/// Errors fetching a single page image.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure or non-success status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The host answered with an empty body.
    #[error("empty response body")]
    EmptyBody,

    /// Writing the image to disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where page image bytes come from.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the raw bytes at `location`.
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError>;
}

/// Receives fetch progress as pages are attempted.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Called after every attempt, successful or not.
    async fn report(&self, percent: u8);
}

/// Plain HTTP GET page source.
pub struct HttpPageSource {
    client: reqwest::Client,
}

impl HttpPageSource {
    /// Create a new HttpPageSource with a per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(location)
            .header(USER_AGENT, "Mozilla/5.0")
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }
        Ok(bytes.to_vec())
    }
}

/// Outcome of a fetch batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Pages attempted.
    pub attempted: usize,

    /// Indices of pages written to disk.
    pub fetched: Vec<usize>,

    /// Indices of pages that failed.
    pub failed: Vec<usize>,
}

/// `floor(done * 100 / total)`, 100 for an empty batch.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}

/// Fetch every page into `dest`, named by [`PageRef::file_name`].
///
/// Each page is written to a `.part` file and renamed once complete, so a
/// failure never leaves a truncated image behind.
pub async fn fetch_pages(
    source: &dyn PageSource,
    pages: &[PageRef],
    dest: &Path,
    progress: &dyn ProgressSink,
) -> FetchSummary {
    let total = pages.len();
    let mut summary = FetchSummary::default();

    for (done, page) in pages.iter().enumerate() {
        match fetch_one(source, page, dest).await {
            Ok(()) => {
                debug!(page = page.index, "Page fetched");
                summary.fetched.push(page.index);
            }
            Err(e) => {
                warn!(page = page.index, location = %page.location, error = %e, "Page fetch failed, skipping");
                summary.failed.push(page.index);
            }
        }
        summary.attempted += 1;
        progress.report(progress_percent(done + 1, total)).await;
    }

    summary
}

async fn fetch_one(source: &dyn PageSource, page: &PageRef, dest: &Path) -> Result<(), FetchError> {
    let bytes = source.fetch(&page.location).await?;
    let final_path = dest.join(page.file_name());
    let part_path = dest.join(format!("{}.part", page.file_name()));

    let written = async {
        tokio::fs::write(&part_path, &bytes).await?;
        tokio::fs::rename(&part_path, &final_path).await
    }
    .await;

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&part_path).await;
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapSource(HashMap<String, Vec<u8>>);

    #[async_trait]
    impl PageSource for MapSource {
        async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
            self.0.get(location).cloned().ok_or(FetchError::EmptyBody)
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<u8>>);

    #[async_trait]
    impl ProgressSink for Recorder {
        async fn report(&self, percent: u8) {
            self.0.lock().unwrap().push(percent);
        }
    }

    #[test]
    fn test_progress_percent_floors() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 66);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(0, 0), 100);
    }

    #[tokio::test]
    async fn test_failures_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let source = MapSource(HashMap::from([
            ("p1".to_string(), vec![1u8]),
            ("p3".to_string(), vec![3u8]),
        ]));
        let pages = vec![
            PageRef::new(1, "p1"),
            PageRef::new(2, "p2"),
            PageRef::new(3, "p3"),
        ];
        let recorder = Recorder::default();

        let summary = fetch_pages(&source, &pages, dir.path(), &recorder).await;

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.fetched, vec![1, 3]);
        assert_eq!(summary.failed, vec![2]);
        assert_eq!(*recorder.0.lock().unwrap(), vec![33, 66, 100]);
        assert!(dir.path().join("00001.png").exists());
        assert!(!dir.path().join("00002.png").exists());
        assert!(!dir.path().join("00002.png.part").exists());
        assert_eq!(std::fs::read(dir.path().join("00003.png")).unwrap(), vec![3u8]);
    }
}
