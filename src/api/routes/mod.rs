//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`requests`] - Export request intake, lookup and deletion
//! - [`queue`] - Queue-wide statistics
//! - [`system`] - Health and OpenAPI

use crate::error::{Error, ToHttpStatus};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

mod queue;
mod requests;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use queue::*;
pub use requests::*;
pub use system::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Body of POST /request/add
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddRequestsBody {
    /// Identifiers of the documents to export (non-empty)
    #[serde(default, alias = "DatastoreIdentifiers")]
    pub datastore_identifiers: Option<Vec<String>>,
}

/// Response of POST /request/add
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AddRequestsResponse {
    /// One queued request per submitted identifier, in input order
    pub requests: Vec<crate::types::RequestInfo>,
}

/// Query parameters for GET /requests
#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams)]
pub struct ListRequestsQuery {
    /// Filter by state: "pending", "completed" or "failed"
    pub state: Option<String>,
}

/// Log a failed handler and turn the error into its HTTP response
///
/// Server-side failures are logged at error level; client errors at debug.
pub(crate) fn failure(error: Error, context: &'static str) -> Response {
    if error.status_code() >= 500 {
        tracing::error!(error = %error, "{}", context);
    } else {
        tracing::debug!(error = %error, "{}", context);
    }
    error.into_response()
}
