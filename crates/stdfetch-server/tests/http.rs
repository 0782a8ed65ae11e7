//! Router tests driven through `tower::ServiceExt::oneshot`.

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use stdfetch_core::TaskId;
use stdfetch_server::{http::create_router, AppState, DownloadService, SearchHit};

use common::{pages, png_bytes, spawn_service, wait_for_terminal, Lookup, MockCatalog, MockPageSource};

fn hit(num: &str, name: &str) -> SearchHit {
    SearchHit {
        standard_num: num.to_string(),
        standard_name: name.to_string(),
        release_date: "2016-12-30".to_string(),
        status: "现行".to_string(),
        stan_status: "现行".to_string(),
        stan_category: String::new(),
        stan_year: Some(2016),
        page_count: "42".to_string(),
    }
}

fn setup(work_root: &std::path::Path) -> (Router, DownloadService) {
    let catalog = Arc::new(
        MockCatalog::new()
            .with("GB/T 19001-2016", Lookup::Pages(pages("qms", 2)))
            .with_hit(hit("GB/T 19001-2016", "质量管理体系 要求")),
    );
    let source = Arc::new(
        MockPageSource::new()
            .with_image("mock://qms/1", png_bytes(20, 20))
            .with_image("mock://qms/2", png_bytes(20, 20)),
    );
    let service = spawn_service(catalog, source, work_root);
    (create_router(AppState::new(service.clone())), service)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_download_flow_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let (router, service) = setup(dir.path());

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/download",
            json!({ "standard_num": "  GB/T 19001-2016 " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let task_id = body["task_id"].as_str().unwrap().to_string();

    wait_for_terminal(&service, &TaskId::new(task_id.clone())).await;

    let response = router
        .clone()
        .oneshot(get(&format!("/api/status/{task_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = body_json(response).await;
    assert_eq!(status["status"], "completed");
    assert_eq!(status["filename"], "GBT 19001-2016.pdf");
    let download_url = status["download_url"].as_str().unwrap().to_string();

    let response = router.clone().oneshot(get(&download_url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("GBT%2019001-2016.pdf"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_blank_download_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let (router, service) = setup(dir.path());

    let response = router
        .oneshot(post_json("/api/download", json!({ "standard_num": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
    assert!(service.store().is_empty().await);
}

#[tokio::test]
async fn test_missing_field_is_treated_as_blank() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _service) = setup(dir.path());

    let response = router
        .oneshot(post_json("/api/download", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_status_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _service) = setup(dir.path());

    let response = router.oneshot(get("/api/status/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({ "status": "not_found" }));
}

#[tokio::test]
async fn test_unknown_artifact_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _service) = setup(dir.path());

    let response = router
        .oneshot(get("/download/nope/GBT%201.pdf"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_search_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _service) = setup(dir.path());

    let response = router
        .clone()
        .oneshot(post_json("/api/search", json!({ "keyword": "19001" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["results"][0]["standard_num"], "GB/T 19001-2016");
    assert!(body.get("message").is_none());

    let response = router
        .clone()
        .oneshot(post_json("/api/search", json!({ "keyword": "zzz" })))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["results"], json!([]));
    assert!(body["message"].is_string());

    let response = router
        .oneshot(post_json("/api/search", json!({ "keyword": " " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let (router, service) = setup(dir.path());
    service.submit("GB/T 19001-2016").await.unwrap();

    let response = router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health = body_json(response).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["worker"], "running");
    let tracked = health["queued"].as_u64().unwrap() + health["active"].as_u64().unwrap();
    assert!(tracked <= 1);

    let response = router.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("stdfetch_tasks_total{status=\"pending\"}"));
    assert!(text.contains("stdfetch_tasks_total{status=\"error\"} 0"));
}

#[tokio::test]
async fn test_health_reports_stopped_worker() {
    let dir = tempfile::tempdir().unwrap();
    let (service, worker) = DownloadService::spawn(
        Arc::new(MockCatalog::new()),
        Arc::new(MockPageSource::new()),
        dir.path().to_path_buf(),
    );
    let router = create_router(AppState::new(service.clone()));

    worker.abort();
    let _ = worker.await;
    assert!(!service.is_accepting());

    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let health = body_json(response).await;
    assert_eq!(health["worker"], "stopped");

    let err = service.submit("GB/T 1").await.unwrap_err();
    assert!(matches!(err, stdfetch_server::ServiceError::QueueClosed));
    assert!(service.store().is_empty().await);
}
