use super::*;
use crate::export::test_helpers::{StaticFetcher, create_test_service};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use std::time::Duration;
use tower::ServiceExt;

mod system;

/// Helper to create a test router over an in-memory fetcher
///
/// Returns the router, the service (to drive processing) and the tempdir
/// (which must be kept alive).
async fn create_test_app(
    fetcher: Arc<StaticFetcher>,
) -> (Router, Arc<ExportService>, tempfile::TempDir) {
    let (service, temp_dir) = create_test_service(fetcher).await;
    let service = Arc::new(service);
    let config = Arc::new(service.config().clone());
    (create_router(service.clone(), config), service, temp_dir)
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns_and_stops_on_shutdown() {
    let (service, _temp_dir) = create_test_service(Arc::new(StaticFetcher::new())).await;
    let service = Arc::new(service);

    let mut config = service.config().clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let service = service.clone();
        let config = config.clone();
        async move { start_api_server(service, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    service.shutdown().await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), api_handle)
        .await
        .expect("API server did not stop after shutdown")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_api_server_fails_fast_when_address_is_taken() {
    let (service, _temp_dir) = create_test_service(Arc::new(StaticFetcher::new())).await;
    let service = Arc::new(service);

    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = service.config().clone();
    config.server.api.bind_address = occupied.local_addr().unwrap();
    let config = Arc::new(config);

    let err = bind_api_listener(&config).await.unwrap_err();
    assert!(matches!(err, crate::error::Error::ApiServerError(_)));

    // The server returns the bind error instead of waiting for shutdown
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        start_api_server(service.clone(), config),
    )
    .await
    .expect("start_api_server hung on an occupied address");
    assert!(result.is_err());
    assert!(service.is_accepting());
}

#[tokio::test]
async fn test_serve_api_on_bound_listener() {
    let (service, _temp_dir) = create_test_service(Arc::new(StaticFetcher::new())).await;
    let service = Arc::new(service);

    let mut config = service.config().clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let listener = bind_api_listener(&config).await.unwrap();
    let address = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_api(listener, service.clone(), config));

    let health: serde_json::Value = reqwest::get(format!("http://{address}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    service.shutdown().await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("API server did not stop after shutdown")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let (service, _temp_dir) = create_test_service(Arc::new(StaticFetcher::new())).await;
    let service = Arc::new(service);

    let mut config = service.config().clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(service, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_cors_restricted_to_listed_origins() {
    let (service, _temp_dir) = create_test_service(Arc::new(StaticFetcher::new())).await;
    let service = Arc::new(service);

    let mut config = service.config().clone();
    config.server.api.cors_origins = vec!["http://allowed.example".to_string()];
    let app = create_router(service, Arc::new(config));

    let allowed = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://allowed.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        allowed
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://allowed.example"
    );

    let denied = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(denied.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_cors_disabled() {
    let (service, _temp_dir) = create_test_service(Arc::new(StaticFetcher::new())).await;
    let service = Arc::new(service);

    let mut config = service.config().clone();
    config.server.api.cors_enabled = false;
    let app = create_router(service, Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response
            .headers()
            .get("access-control-allow-origin")
            .is_none()
    );
}
