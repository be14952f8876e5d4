//! Export request handlers.

use super::{AddRequestsBody, AddRequestsResponse, ListRequestsQuery, failure};
use crate::api::AppState;
use crate::error::Error;
use crate::types::RequestState;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /request/add - Queue documents for export
#[utoipa::path(
    post,
    path = "/api/request/add",
    tag = "requests",
    request_body = AddRequestsBody,
    responses(
        (status = 200, description = "Requests queued", body = AddRequestsResponse),
        (status = 400, description = "Invalid request body; details.errors lists every problem", body = crate::error::ApiError),
        (status = 503, description = "Service is shutting down", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn add_requests(
    State(state): State<AppState>,
    body: Result<Json<AddRequestsBody>, JsonRejection>,
) -> Response {
    let identifiers = match body {
        Ok(Json(AddRequestsBody {
            datastore_identifiers: Some(identifiers),
        })) => identifiers,
        Ok(Json(AddRequestsBody {
            datastore_identifiers: None,
        })) => {
            return failure(
                Error::validation("datastoreIdentifiers is required"),
                "Rejected export request batch",
            );
        }
        Err(rejection) => {
            return failure(
                Error::validation(rejection.body_text()),
                "Rejected export request batch",
            );
        }
    };

    match state.service.add_requests(&identifiers).await {
        Ok(requests) => (StatusCode::OK, Json(AddRequestsResponse { requests })).into_response(),
        Err(e) => failure(e, "Failed to queue export requests"),
    }
}

/// GET /requests - List export requests
#[utoipa::path(
    get,
    path = "/api/requests",
    tag = "requests",
    params(ListRequestsQuery),
    responses(
        (status = 200, description = "Requests, oldest first", body = Vec<crate::types::RequestInfo>),
        (status = 400, description = "Unknown state filter", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<ListRequestsQuery>,
) -> Response {
    let filter = match query.state.as_deref().map(str::parse::<RequestState>) {
        None => None,
        Some(Ok(state)) => Some(state),
        Some(Err(message)) => return failure(Error::validation(message), "Rejected request listing"),
    };

    match state.service.list_requests(filter).await {
        Ok(requests) => (StatusCode::OK, Json(requests)).into_response(),
        Err(e) => failure(e, "Failed to list export requests"),
    }
}

/// GET /request/:request_identifier - Get one export request
#[utoipa::path(
    get,
    path = "/api/request/{request_identifier}",
    tag = "requests",
    params(
        ("request_identifier" = String, Path, description = "Request identifier returned at intake")
    ),
    responses(
        (status = 200, description = "Request found", body = crate::types::RequestInfo),
        (status = 404, description = "Request not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    Path(request_identifier): Path<String>,
) -> Response {
    match state.service.get_request(&request_identifier).await {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(e) => failure(e, "Failed to get export request"),
    }
}

/// DELETE /request/:request_identifier - Soft-delete an export request
#[utoipa::path(
    delete,
    path = "/api/request/{request_identifier}",
    tag = "requests",
    params(
        ("request_identifier" = String, Path, description = "Request identifier returned at intake")
    ),
    responses(
        (status = 204, description = "Request deleted"),
        (status = 404, description = "Request not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn delete_request(
    State(state): State<AppState>,
    Path(request_identifier): Path<String>,
) -> Response {
    match state.service.delete_request(&request_identifier).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => failure(e, "Failed to delete export request"),
    }
}
