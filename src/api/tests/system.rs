use super::*;

#[tokio::test]
async fn test_health_check() {
    let (app, _service, _temp_dir) = create_test_app(Arc::new(StaticFetcher::new())).await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["acceptingRequests"], true);
}

#[tokio::test]
async fn test_openapi_spec_endpoint() {
    let (app, _service, _temp_dir) = create_test_app(Arc::new(StaticFetcher::new())).await;

    let response = app.oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert!(body["paths"]["/api/request/add"].is_object());
}

#[tokio::test]
async fn test_swagger_ui_can_be_disabled() {
    let (service, _temp_dir) = create_test_service(Arc::new(StaticFetcher::new())).await;
    let service = Arc::new(service);

    let mut config = service.config().clone();
    config.server.api.swagger_ui = false;
    let app = create_router(service, Arc::new(config));

    let response = app
        .oneshot(get("/api-docs/openapi.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_swagger_ui_serves_spec_when_enabled() {
    let (app, _service, _temp_dir) = create_test_app(Arc::new(StaticFetcher::new())).await;

    let response = app
        .oneshot(get("/api-docs/openapi.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
