//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use stdfetch_core::{PageRef, TaskId, TaskRecord};
use stdfetch_server::{Catalog, CatalogError, DownloadService, FetchError, PageSource, SearchHit};

/// Location that makes [`MockPageSource`] panic.
pub const PANIC_LOCATION: &str = "mock://panic";

/// How the mock catalog answers a lookup.
#[derive(Clone)]
pub enum Lookup {
    Pages(Vec<PageRef>),
    NotFound,
    Upstream,
}

/// In-memory catalog keyed by standard identifier.
#[derive(Default)]
pub struct MockCatalog {
    lookups: HashMap<String, Lookup>,
    hits: Vec<SearchHit>,
    pub resolved: Mutex<Vec<String>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, standard: &str, lookup: Lookup) -> Self {
        self.lookups.insert(standard.to_string(), lookup);
        self
    }

    pub fn with_hit(mut self, hit: SearchHit) -> Self {
        self.hits.push(hit);
        self
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn resolve(&self, standard_id: &str) -> Result<Vec<PageRef>, CatalogError> {
        self.resolved.lock().unwrap().push(standard_id.to_string());
        match self.lookups.get(standard_id) {
            Some(Lookup::Pages(pages)) => Ok(pages.clone()),
            Some(Lookup::Upstream) => Err(CatalogError::Status(502)),
            Some(Lookup::NotFound) | None => Err(CatalogError::NotFound(standard_id.to_string())),
        }
    }

    async fn search(&self, keyword: &str) -> Result<Vec<SearchHit>, CatalogError> {
        Ok(self
            .hits
            .iter()
            .filter(|h| h.standard_num.contains(keyword) || h.standard_name.contains(keyword))
            .cloned()
            .collect())
    }
}

/// In-memory page source; unknown locations fail.
#[derive(Default)]
pub struct MockPageSource {
    images: HashMap<String, Vec<u8>>,
    delay: Duration,
    pub fetched: Mutex<Vec<String>>,
}

impl MockPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, location: &str, bytes: Vec<u8>) -> Self {
        self.images.insert(location.to_string(), bytes);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.fetched.lock().unwrap().push(location.to_string());
        if location == PANIC_LOCATION {
            panic!("page source exploded");
        }
        self.images
            .get(location)
            .cloned()
            .ok_or(FetchError::EmptyBody)
    }
}

/// Encode a solid-colour PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([20, 40, 60]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Page references `mock://{name}/{n}` for n in 1..=count.
pub fn pages(name: &str, count: usize) -> Vec<PageRef> {
    (1..=count)
        .map(|n| PageRef::new(n, format!("mock://{name}/{n}")))
        .collect()
}

/// Spawn a service over the mocks rooted at `work_root`.
pub fn spawn_service(
    catalog: Arc<MockCatalog>,
    source: Arc<MockPageSource>,
    work_root: &Path,
) -> DownloadService {
    let (service, _worker) = DownloadService::spawn(catalog, source, work_root.to_path_buf());
    service
}

/// Poll until the task reaches a terminal state.
pub async fn wait_for_terminal(service: &DownloadService, id: &TaskId) -> TaskRecord {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let record = service.get_status(id).await.unwrap();
            if record.is_terminal() {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("task did not finish in time")
}

/// Widths of each page's MediaBox, in page order.
pub fn page_widths(pdf: &Path) -> Vec<f32> {
    let doc = lopdf::Document::load(pdf).unwrap();
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            media_box[2].as_float().unwrap()
        })
        .collect()
}
