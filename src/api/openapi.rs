//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the datastore-export
//! REST API using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the datastore-export REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "datastore-export REST API",
        version = "0.1.0",
        description = "Queue documents from the secure data store for export and inspect their processing state",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790", description = "Local development server")
    ),
    paths(
        // Export requests
        crate::api::routes::add_requests,
        crate::api::routes::list_requests,
        crate::api::routes::get_request,
        crate::api::routes::delete_request,

        // Queue-Wide Operations
        crate::api::routes::queue_stats,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::RequestId,
        crate::types::RequestState,
        crate::types::RequestInfo,
        crate::types::QueueStats,

        // API request/response types from routes
        crate::api::routes::AddRequestsBody,
        crate::api::routes::AddRequestsResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "requests", description = "Export requests - Queue documents and inspect their state"),
        (name = "queue", description = "Queue-wide statistics"),
        (name = "system", description = "System endpoints - Health checks and OpenAPI spec"),
    )
)]
pub struct ApiDoc;
