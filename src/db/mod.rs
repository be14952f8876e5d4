//! Database layer for datastore-export
//!
//! Handles SQLite persistence for the export request queue.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`requests`] - Request queue CRUD, claiming and counting
//!
//! Every read path filters out soft-deleted rows; a deleted request is
//! indistinguishable from one that never existed.

use crate::types::{RequestId, RequestInfo, RequestState};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};
use std::path::PathBuf;

mod migrations;
mod requests;

/// Predicate shared by every read: soft-deleted rows are invisible
pub(crate) const ACTIVE: &str = "is_deleted = 0";

/// New request to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewRequest {
    /// Unique token correlating the request with its output file
    pub request_identifier: String,
    /// Reference to the document in the secure data store
    pub datastore_identifier: String,
}

/// Request record from database
#[derive(Debug, Clone, FromRow)]
pub struct Request {
    /// Unique database ID
    pub id: i64,
    /// Unique token correlating the request with its output file
    pub request_identifier: String,
    /// Reference to the document in the secure data store
    pub datastore_identifier: String,
    /// Outcome flag, unset while pending
    pub successfully_run: Option<bool>,
    /// Epoch millis when the request reached a terminal state
    pub completed_at: Option<i64>,
    /// Absolute path of the written file
    pub file_path: Option<String>,
    /// Soft-delete marker
    pub is_deleted: bool,
    /// Epoch millis when the request was queued
    pub created_at: i64,
    /// Epoch millis of the last write to this row
    pub last_modified_at: i64,
    /// Epoch millis when a processor cycle claimed this row
    pub claimed_at: Option<i64>,
    /// Failure reason recorded by the processor
    pub error_message: Option<String>,
}

impl Request {
    /// Typed identifier of this row
    pub fn request_id(&self) -> RequestId {
        RequestId(self.id)
    }

    /// Lifecycle state derived from the outcome columns
    pub fn state(&self) -> RequestState {
        RequestState::from_outcome(self.completed_at, self.successfully_run)
    }
}

impl From<Request> for RequestInfo {
    fn from(row: Request) -> Self {
        let state = row.state();
        RequestInfo {
            id: RequestId(row.id),
            request_identifier: row.request_identifier,
            datastore_identifier: row.datastore_identifier,
            state,
            successfully_run: row.successfully_run,
            file_path: row.file_path.map(PathBuf::from),
            error_message: row.error_message,
            created_at: millis_to_datetime(row.created_at),
            completed_at: row.completed_at.map(millis_to_datetime),
        }
    }
}

/// Which requests a read returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestFilter {
    /// Every visible request
    #[default]
    All,
    /// Requests with no completion timestamp
    Pending,
    /// Requests that completed successfully
    Completed,
    /// Requests that completed unsuccessfully
    Failed,
}

impl RequestFilter {
    /// SQL condition selecting rows for this filter (soft-delete excluded separately)
    pub(crate) fn condition(&self) -> &'static str {
        match self {
            RequestFilter::All => "1 = 1",
            RequestFilter::Pending => "completed_at IS NULL",
            RequestFilter::Completed => "completed_at IS NOT NULL AND successfully_run = 1",
            RequestFilter::Failed => {
                "completed_at IS NOT NULL AND (successfully_run = 0 OR successfully_run IS NULL)"
            }
        }
    }
}

impl From<RequestState> for RequestFilter {
    fn from(state: RequestState) -> Self {
        match state {
            RequestState::Pending => RequestFilter::Pending,
            RequestState::Completed => RequestFilter::Completed,
            RequestState::Failed => RequestFilter::Failed,
        }
    }
}

/// Database handle for export request persistence
pub struct Database {
    pool: SqlitePool,
}

/// Current time as epoch millis, the unit of every timestamp column
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(Utc::now)
}
