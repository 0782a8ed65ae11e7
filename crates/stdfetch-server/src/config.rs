//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Catalog endpoints and limits.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Page lookup endpoint; queried with `?stanNum=<id>`.
    pub lookup_url: String,

    /// Paginated search endpoint (GET).
    pub search_url: String,

    /// Non-paginated fallback search endpoint (POST form).
    pub fallback_search_url: String,

    /// Timeout for the page lookup call (seconds).
    pub lookup_timeout_secs: u64,

    /// Timeout for each search call (seconds).
    pub search_timeout_secs: u64,

    /// Page size requested from the paginated search endpoint.
    pub search_page_size: usize,

    /// Hard cap on aggregated search hits.
    pub max_search_results: usize,

    /// Skip TLS certificate verification for search endpoints.
    pub accept_invalid_certs: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            lookup_url:
                "http://www.njbz365.com/njbzb/stanThumbAndCut/getAllCutPageAndUrlForRead.do"
                    .to_string(),
            search_url: "https://www.njbz365.com/njbzb/solrData/search.do".to_string(),
            fallback_search_url:
                "https://www.njbz365.com/njbzb/memberShipManage/addSearchStringClick.do"
                    .to_string(),
            lookup_timeout_secs: 30,
            search_timeout_secs: 10,
            search_page_size: 50,
            max_search_results: 6666,
            accept_invalid_certs: false,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server bind address.
    pub bind_addr: String,

    /// Root under which each task gets a `{task_id}/` working directory.
    pub work_root: PathBuf,

    /// Catalog settings.
    pub catalog: CatalogConfig,

    /// Timeout for a single page image fetch (seconds).
    pub fetch_timeout_secs: u64,

    /// How long finished tasks are kept before eviction (seconds).
    pub retention_secs: u64,

    /// How often the eviction sweeper runs (seconds).
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            work_root: std::env::temp_dir().join("njbz_downloads"),
            catalog: CatalogConfig::default(),
            fetch_timeout_secs: 30,
            retention_secs: 24 * 60 * 60,
            sweep_interval_secs: 10 * 60,
        }
    }
}
