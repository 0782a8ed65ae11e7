//! Catalog lookup: standard identifier to page image locations, plus search.

mod http;
pub mod rewrite;
pub mod search;

use async_trait::async_trait;
use thiserror::Error;

use stdfetch_core::{PageRef, TaskError};

pub use self::http::HttpCatalog;
pub use search::SearchHit;

/// Errors from the catalog service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog reported no match for the identifier.
    #[error("standard not found: {0}")]
    NotFound(String),

    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("catalog returned HTTP {0}")]
    Status(u16),

    /// Response body could not be understood.
    #[error("malformed catalog response: {0}")]
    Parse(String),
}

impl From<CatalogError> for TaskError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => TaskError::NotFound,
            other => TaskError::Upstream(other.to_string()),
        }
    }
}

/// The external catalog the pipeline resolves documents against.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Resolve a standard identifier to its page images, in page order.
    async fn resolve(&self, standard_id: &str) -> Result<Vec<PageRef>, CatalogError>;

    /// Search the catalog by keyword.
    async fn search(&self, keyword: &str) -> Result<Vec<SearchHit>, CatalogError>;
}
