//! stdfetch Download Server

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stdfetch_server::{
    http, AppState, CatalogConfig, Config, DownloadService, HttpCatalog, HttpPageSource, Sweeper,
};

#[derive(Parser)]
#[command(name = "stdfetch-server")]
#[command(about = "Download national standards as PDF documents")]
struct Args {
    /// HTTP bind address
    #[arg(long, env = "STDFETCH_BIND", default_value = "127.0.0.1:5000")]
    bind: String,

    /// Directory holding per-task working directories
    #[arg(long, env = "STDFETCH_WORK_ROOT")]
    work_root: Option<PathBuf>,

    /// Catalog page lookup endpoint
    #[arg(long, env = "STDFETCH_LOOKUP_URL")]
    lookup_url: Option<String>,

    /// Catalog paginated search endpoint
    #[arg(long, env = "STDFETCH_SEARCH_URL")]
    search_url: Option<String>,

    /// Catalog fallback search endpoint
    #[arg(long, env = "STDFETCH_FALLBACK_SEARCH_URL")]
    fallback_search_url: Option<String>,

    /// Timeout for each page image fetch, in seconds
    #[arg(long, env = "STDFETCH_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout_secs: u64,

    /// Maximum number of search hits returned
    #[arg(long, env = "STDFETCH_MAX_SEARCH_RESULTS", default_value_t = 6666)]
    max_search_results: usize,

    /// Seconds a finished task is kept before eviction
    #[arg(long, env = "STDFETCH_RETENTION", default_value_t = 86400)]
    retention_secs: u64,

    /// Seconds between eviction sweeps
    #[arg(long, env = "STDFETCH_SWEEP_INTERVAL", default_value_t = 600)]
    sweep_interval_secs: u64,

    /// Skip TLS certificate verification for the search endpoints
    #[arg(long, env = "STDFETCH_ACCEPT_INVALID_CERTS")]
    accept_invalid_certs: bool,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let defaults = Config::default();
        let catalog_defaults = CatalogConfig::default();

        Self {
            bind_addr: args.bind,
            work_root: args.work_root.unwrap_or(defaults.work_root),
            catalog: CatalogConfig {
                lookup_url: args.lookup_url.unwrap_or(catalog_defaults.lookup_url),
                search_url: args.search_url.unwrap_or(catalog_defaults.search_url),
                fallback_search_url: args
                    .fallback_search_url
                    .unwrap_or(catalog_defaults.fallback_search_url),
                max_search_results: args.max_search_results,
                accept_invalid_certs: args.accept_invalid_certs,
                ..catalog_defaults
            },
            fetch_timeout_secs: args.fetch_timeout_secs,
            retention_secs: args.retention_secs,
            sweep_interval_secs: args.sweep_interval_secs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load config
    let config = Config::from(Args::parse());
    let http_addr: SocketAddr = config.bind_addr.parse()?;

    std::fs::create_dir_all(&config.work_root).map_err(|e| {
        format!(
            "Failed to create work root '{}': {}",
            config.work_root.display(),
            e
        )
    })?;

    let catalog = Arc::new(HttpCatalog::new(config.catalog.clone())?);
    let source = Arc::new(HttpPageSource::new(Duration::from_secs(
        config.fetch_timeout_secs,
    ))?);

    info!(
        http_addr = %http_addr,
        work_root = %config.work_root.display(),
        "Starting stdfetch server"
    );

    // Start the worker and the eviction sweeper
    let (service, _worker) = DownloadService::spawn(catalog, source, config.work_root.clone());
    let sweeper = Sweeper::new(
        service.store(),
        config.work_root.clone(),
        config.retention(),
        config.sweep_interval(),
    );
    tokio::spawn(sweeper.run());

    // Start HTTP server
    let state = AppState::new(service);
    let router = http::create_router(state);
    let listener = TcpListener::bind(http_addr).await?;

    info!("HTTP server listening on {}", http_addr);
    axum::serve(listener, router).await?;

    Ok(())
}
