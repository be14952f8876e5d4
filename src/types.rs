//! Core types for datastore-export

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

/// Store-assigned surrogate key of a queued request
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct RequestId(pub i64);

impl RequestId {
    /// Create a new RequestId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<RequestId> for i64 {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for RequestId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for RequestId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for RequestId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Lifecycle state of a request
///
/// Derived from `completed_at` and `successfully_run`; exactly one holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    /// Not yet processed
    Pending,
    /// Content written to the output directory
    Completed,
    /// Terminal failure, never retried
    Failed,
}

impl RequestState {
    /// Derive the state from the persisted outcome columns
    pub fn from_outcome(completed_at: Option<i64>, successfully_run: Option<bool>) -> Self {
        match (completed_at, successfully_run) {
            (None, _) => RequestState::Pending,
            (Some(_), Some(true)) => RequestState::Completed,
            (Some(_), _) => RequestState::Failed,
        }
    }

    /// Lowercase name used in query strings and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Pending => "pending",
            RequestState::Completed => "completed",
            RequestState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(RequestState::Pending),
            "completed" => Ok(RequestState::Completed),
            "failed" => Ok(RequestState::Failed),
            other => Err(format!(
                "unknown request state '{other}' (expected pending, completed or failed)"
            )),
        }
    }
}

/// Public view of a queued export request
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    /// Store-assigned identity
    pub id: RequestId,
    /// Unique token correlating the request with its output file
    pub request_identifier: String,
    /// Reference to the document in the secure data store
    pub datastore_identifier: String,
    /// Current lifecycle state
    pub state: RequestState,
    /// Outcome flag (None while pending)
    pub successfully_run: Option<bool>,
    /// Absolute path of the written file (only on success)
    #[schema(value_type = Option<String>)]
    pub file_path: Option<PathBuf>,
    /// Failure reason (only on failure)
    pub error_message: Option<String>,
    /// When the request was queued
    pub created_at: DateTime<Utc>,
    /// When the request reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,
}

/// Request counts by lifecycle state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QueueStats {
    /// Requests waiting to be processed
    pub pending: u64,
    /// Requests exported successfully
    pub completed: u64,
    /// Requests that failed
    pub failed: u64,
    /// Sum of the above
    pub total: u64,
}

/// Result of one processor invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Another cycle was already in flight, nothing was touched
    Skipped,
    /// No pending request existed
    Idle,
    /// The request's content was written
    Succeeded {
        /// The request that transitioned
        id: RequestId,
        /// Request identifier of the row
        request_identifier: String,
        /// Absolute path of the written file
        path: PathBuf,
    },
    /// The request was marked failed
    Failed {
        /// The request that transitioned
        id: RequestId,
        /// Request identifier of the row
        request_identifier: String,
        /// Machine-readable failure code
        code: &'static str,
        /// Human-readable failure reason
        reason: String,
    },
}

impl ProcessOutcome {
    /// Whether a request row transitioned during this invocation
    pub fn transitioned(&self) -> bool {
        matches!(
            self,
            ProcessOutcome::Succeeded { .. } | ProcessOutcome::Failed { .. }
        )
    }
}
