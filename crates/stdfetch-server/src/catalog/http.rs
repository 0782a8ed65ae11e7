//! HTTP implementation of the catalog.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use stdfetch_core::PageRef;

use super::rewrite::rewrite_location;
use super::search::{self, SearchHit};
use super::{Catalog, CatalogError};
use crate::config::CatalogConfig;

const BROWSER_AGENT: &str = "Mozilla/5.0";

/// Envelope returned by the page lookup endpoint.
///
/// `content` stays untyped until the success flag has been checked: failed
/// lookups come back with `null` or half-filled entries.
#[derive(Debug, Deserialize)]
struct LookupEnvelope {
    #[serde(default)]
    success: Value,

    #[serde(default)]
    content: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct LookupEntry {
    #[serde(rename = "storagePath")]
    storage_path: String,
}

/// Catalog backed by the public njbz365 endpoints.
pub struct HttpCatalog {
    client: reqwest::Client,
    search_client: reqwest::Client,
    config: CatalogConfig,
}

impl HttpCatalog {
    /// Create a new HttpCatalog.
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.lookup_timeout_secs))
            .build()?;
        let search_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.search_timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            search_client,
            config,
        })
    }

    /// Parse a search response body. An empty body yields `None`.
    async fn read_json(response: reqwest::Response) -> Result<Option<Value>, CatalogError> {
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }

    /// Walk the paginated search endpoint until it runs dry or the cap is hit.
    async fn search_paginated(&self, keyword: &str) -> Vec<SearchHit> {
        let url = &self.config.search_url;
        let page_size = self.config.search_page_size.max(1);
        let cap = self.config.max_search_results;
        let mut hits = Vec::new();
        let mut start = 0usize;
        let mut page = 0usize;

        info!(url = %url, keyword = %keyword, "Searching catalog (paginated)");

        while hits.len() < cap {
            let mut params = vec![
                ("searchString", keyword.to_string()),
                ("isTilu", "true".to_string()),
                ("isContent", "true".to_string()),
            ];
            // The first page is requested without explicit bounds.
            if start > 0 {
                params.push(("start", start.to_string()));
                params.push(("count", page_size.to_string()));
            }

            let response = self
                .search_client
                .get(url)
                .query(&params)
                .header(USER_AGENT, BROWSER_AGENT)
                .send()
                .await;
            let data = match response {
                Ok(resp) => Self::read_json(resp).await,
                Err(e) => Err(e.into()),
            };
            let data = match data {
                Ok(Some(data)) => data,
                Ok(None) => break,
                Err(e) => {
                    warn!(url = %url, page, error = %e, "Search page failed");
                    break;
                }
            };

            if !search::is_success(&data) {
                warn!(url = %url, page, message = %search::upstream_message(&data), "Search rejected");
                break;
            }

            let items = search::extract_items(&data);
            if items.is_empty() {
                debug!(url = %url, page, "Empty page, stopping");
                break;
            }
            debug!(url = %url, page, items = items.len(), "Search page received");

            hits.extend(items.iter().filter_map(search::hit_from_item));

            if items.len() < page_size {
                break;
            }
            start += page_size;
            page += 1;
        }

        hits.truncate(cap);
        hits
    }

    /// Single-shot form POST against the fallback endpoint.
    async fn search_fallback(&self, keyword: &str) -> Result<Vec<SearchHit>, CatalogError> {
        let url = &self.config.fallback_search_url;
        info!(url = %url, keyword = %keyword, "Searching catalog (fallback)");

        let response = self
            .search_client
            .post(url)
            .form(&[("searchString", keyword)])
            .header(USER_AGENT, BROWSER_AGENT)
            .send()
            .await?;

        let Some(data) = Self::read_json(response).await? else {
            return Ok(Vec::new());
        };
        if !search::is_success(&data) {
            warn!(url = %url, message = %search::upstream_message(&data), "Search rejected");
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = search::extract_items(&data)
            .iter()
            .filter_map(search::hit_from_item)
            .collect();
        hits.truncate(self.config.max_search_results);
        Ok(hits)
    }
}

/// Page entries of a successful lookup. A missing or `null` list is empty.
fn decode_entries(content: Option<Value>) -> Result<Vec<LookupEntry>, CatalogError> {
    match content {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => {
            serde_json::from_value(value).map_err(|e| CatalogError::Parse(e.to_string()))
        }
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn resolve(&self, standard_id: &str) -> Result<Vec<PageRef>, CatalogError> {
        let url = &self.config.lookup_url;
        debug!(url = %url, standard = %standard_id, "Resolving standard");

        let response = self
            .client
            .get(url)
            .query(&[("stanNum", standard_id)])
            .header(USER_AGENT, BROWSER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        let envelope: LookupEnvelope = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        if !search::is_success_flag(&envelope.success) {
            return Err(CatalogError::NotFound(standard_id.to_string()));
        }

        let entries = decode_entries(envelope.content)?;
        let pages: Vec<PageRef> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| PageRef::new(i + 1, rewrite_location(&entry.storage_path)))
            .collect();

        info!(standard = %standard_id, pages = pages.len(), "Standard resolved");
        Ok(pages)
    }

    async fn search(&self, keyword: &str) -> Result<Vec<SearchHit>, CatalogError> {
        let hits = self.search_paginated(keyword).await;
        if !hits.is_empty() {
            info!(keyword = %keyword, hits = hits.len(), "Search finished");
            return Ok(hits);
        }

        match self.search_fallback(keyword).await {
            Ok(hits) => {
                info!(keyword = %keyword, hits = hits.len(), "Search finished");
                Ok(hits)
            }
            Err(e) => {
                warn!(keyword = %keyword, error = %e, "Fallback search failed");
                Ok(Vec::new())
            }
        }
    }
}
