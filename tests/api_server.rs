//! REST API over a real socket, backed by a mock secure data store

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use datastore_export::api::create_router;
use datastore_export::{ExportService, ProcessOutcome};
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::MockServer;

/// Serve the router on an ephemeral port and return its base URL
async fn spawn_api(service: Arc<ExportService>) -> String {
    let config = Arc::new(service.config().clone());
    let app = create_router(service, config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    format!("http://{address}")
}

#[tokio::test]
async fn add_then_process_then_query() {
    let datastore = MockServer::start().await;
    mount_document(&datastore, "doc-7", "summary", b"{\"ok\":true}").await;

    let (service, _temp_dir) = create_service(&datastore.uri()).await;
    let service = Arc::new(service);
    let base = spawn_api(service.clone()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/request/add"))
        .json(&json!({ "datastoreIdentifiers": ["doc-7"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    let request_identifier = body["requests"][0]["requestIdentifier"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(body["requests"][0]["state"], "pending");

    assert!(matches!(
        service.process_next_request().await.unwrap(),
        ProcessOutcome::Succeeded { .. }
    ));

    let request: Value = client
        .get(format!("{base}/api/request/{request_identifier}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(request["state"], "completed");
    assert_eq!(request["successfullyRun"], true);

    let stats: Value = client
        .get(format!("{base}/api/queue/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["completed"], 1);
    assert_eq!(stats["total"], 1);
}

#[tokio::test]
async fn invalid_batch_is_rejected_and_nothing_is_stored() {
    let datastore = MockServer::start().await;
    let (service, _temp_dir) = create_service(&datastore.uri()).await;
    let service = Arc::new(service);
    let base = spawn_api(service.clone()).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/request/add"))
        .json(&json!({ "datastoreIdentifiers": ["doc-1", ""] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(service.queue_stats().await.unwrap().total, 0);
}

#[tokio::test]
async fn health_reports_intake_closed_after_shutdown() {
    let datastore = MockServer::start().await;
    let (service, _temp_dir) = create_service(&datastore.uri()).await;
    let service = Arc::new(service);
    let base = spawn_api(service.clone()).await;

    service.shutdown().await.unwrap();

    let health: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["acceptingRequests"], false);
}
