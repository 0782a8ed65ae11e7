//! Shared application state.

use std::sync::Arc;

use crate::service::DownloadService;

/// State handed to every HTTP handler.
pub struct AppState {
    /// Facade over the queue, status table and catalog.
    pub service: DownloadService,
}

impl AppState {
    /// Create a new AppState wrapped in Arc.
    pub fn new(service: DownloadService) -> Arc<Self> {
        Arc::new(Self { service })
    }
}
