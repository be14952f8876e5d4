//! REST API server module
//!
//! Provides an OpenAPI 3.1 compliant REST API for queueing export requests
//! and monitoring their processing state.

use crate::{Config, ExportService, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Export Requests
/// - `POST /api/request/add` - Queue datastore identifiers for export
/// - `GET /api/requests` - List requests (optional `?state=` filter)
/// - `GET /api/request/:request_identifier` - Get single request
/// - `DELETE /api/request/:request_identifier` - Soft-delete request
///
/// ## Queue-Wide Operations
/// - `GET /api/queue/stats` - Get queue statistics
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
/// - `GET /api-docs/openapi.json` - Spec served to Swagger UI (if enabled)
pub fn create_router(service: Arc<ExportService>, config: Arc<Config>) -> Router {
    let state = AppState::new(service, config.clone());

    let router = Router::new()
        // Export requests
        .route("/api/request/add", post(routes::add_requests))
        .route("/api/requests", get(routes::list_requests))
        .route(
            "/api/request/:request_identifier",
            get(routes::get_request).delete(routes::delete_request),
        )
        // Queue-Wide Operations
        .route("/api/queue/stats", get(routes::queue_stats))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    // Merge Swagger UI routes if enabled in config (before applying state)
    // SwaggerUi registers its own spec route, so it must not reuse /openapi.json
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin; otherwise only the listed
/// origins are allowed. All methods and headers are permitted.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Serves until the service is shut down, then drains open connections and
/// returns.
///
/// # Example
///
/// ```no_run
/// use datastore_export::{Config, ExportService};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let service = Arc::new(ExportService::new((*config).clone()).await?);
///
/// // Start API server (blocks until shutdown)
/// datastore_export::api::start_api_server(service, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(service: Arc<ExportService>, config: Arc<Config>) -> Result<()> {
    let listener = bind_api_listener(&config).await?;
    serve_api(listener, service, config).await
}

/// Bind the configured API address
///
/// Fails with [`Error::ApiServerError`](crate::error::Error::ApiServerError)
/// when the address is unavailable.
pub async fn bind_api_listener(config: &Config) -> Result<TcpListener> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    TcpListener::bind(bind_address).await.map_err(|e| {
        crate::error::Error::ApiServerError(format!("failed to bind {bind_address}: {e}"))
    })
}

/// Serve the API on an already bound listener until the service shuts down
pub async fn serve_api(
    listener: TcpListener,
    service: Arc<ExportService>,
    config: Arc<Config>,
) -> Result<()> {
    let address = listener.local_addr().map_err(crate::error::Error::Io)?;
    let shutdown = service.worker_state.shutdown_token.clone();
    let app = create_router(service, config);

    tracing::info!(%address, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
