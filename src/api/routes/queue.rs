//! Queue-wide operation handlers.

use super::failure;
use crate::api::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// GET /queue/stats - Get queue statistics
#[utoipa::path(
    get,
    path = "/api/queue/stats",
    tag = "queue",
    responses(
        (status = 200, description = "Queue statistics", body = crate::types::QueueStats),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn queue_stats(State(state): State<AppState>) -> Response {
    match state.service.queue_stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => failure(e, "Failed to get queue statistics"),
    }
}
