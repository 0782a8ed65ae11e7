//! stdfetch Server Library
//!
//! Resolves national-standard identifiers against the catalog, fetches the
//! scanned page images, assembles them into one PDF and reports progress to
//! pollers. A single background worker drains a FIFO queue; HTTP handlers
//! only touch the status table and the queue.

pub mod assembler;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod metrics;
pub mod service;
pub mod state;
pub mod store;
pub mod sweeper;
pub mod worker;

pub use catalog::{Catalog, CatalogError, HttpCatalog, SearchHit};
pub use config::{CatalogConfig, Config};
pub use error::ServiceError;
pub use fetcher::{FetchError, HttpPageSource, PageSource};
pub use service::{ArtifactFile, DownloadService};
pub use state::AppState;
pub use store::TaskStore;
pub use sweeper::Sweeper;
pub use worker::{QueuedTask, Worker};
