//! Request queue CRUD operations.

use crate::error::DatabaseError;
use crate::types::{QueueStats, RequestId};
use crate::{Error, Result};
use std::time::Duration;

use super::{ACTIVE, Database, NewRequest, Request, RequestFilter, now_millis};

const REQUEST_COLUMNS: &str = "id, request_identifier, datastore_identifier, successfully_run, \
     completed_at, file_path, is_deleted, created_at, last_modified_at, claimed_at, error_message";

impl Database {
    /// Insert a batch of new requests in one transaction
    ///
    /// Either every row is persisted or none is. Rows are returned in input
    /// order with their assigned ids.
    pub async fn insert_requests(&self, requests: &[NewRequest]) -> Result<Vec<Request>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to start transaction: {}",
                e
            )))
        })?;

        let now = now_millis();
        let sql = format!(
            r#"
            INSERT INTO requests (
                request_identifier, datastore_identifier, is_deleted,
                created_at, last_modified_at
            ) VALUES (?, ?, 0, ?, ?)
            RETURNING {REQUEST_COLUMNS}
            "#
        );

        let mut inserted = Vec::with_capacity(requests.len());
        for request in requests {
            let row = sqlx::query_as::<_, Request>(&sql)
                .bind(&request.request_identifier)
                .bind(&request.datastore_identifier)
                .bind(now)
                .bind(now)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to insert request: {}",
                        e
                    )))
                })?;
            inserted.push(row);
        }

        tx.commit().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to commit request batch: {}",
                e
            )))
        })?;

        Ok(inserted)
    }

    /// Get a request by ID
    pub async fn get_request(&self, id: RequestId) -> Result<Option<Request>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = ? AND {ACTIVE}");

        let row = sqlx::query_as::<_, Request>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get request: {}",
                    e
                )))
            })?;

        Ok(row)
    }

    /// Get a request by its request identifier
    pub async fn get_request_by_identifier(
        &self,
        request_identifier: &str,
    ) -> Result<Option<Request>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM requests WHERE request_identifier = ? AND {ACTIVE}"
        );

        let row = sqlx::query_as::<_, Request>(&sql)
            .bind(request_identifier)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get request by identifier: {}",
                    e
                )))
            })?;

        Ok(row)
    }

    /// List requests matching `filter`, oldest first
    pub async fn read_requests(&self, filter: RequestFilter) -> Result<Vec<Request>> {
        let sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM requests
            WHERE {ACTIVE} AND ({})
            ORDER BY created_at ASC, id ASC
            "#,
            filter.condition()
        );

        let rows = sqlx::query_as::<_, Request>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to list requests: {}",
                    e
                )))
            })?;

        Ok(rows)
    }

    /// Persist the mutable columns of `request`
    ///
    /// Writes the outcome, file path, failure reason and claim, and refreshes
    /// `last_modified_at`. Fails with not-found when the row is missing or
    /// soft-deleted.
    pub async fn update_request(&self, request: &Request) -> Result<()> {
        let sql = format!(
            r#"
            UPDATE requests
            SET successfully_run = ?, completed_at = ?, file_path = ?,
                error_message = ?, claimed_at = ?, last_modified_at = ?
            WHERE id = ? AND {ACTIVE}
            "#
        );

        let result = sqlx::query(&sql)
            .bind(request.successfully_run)
            .bind(request.completed_at)
            .bind(&request.file_path)
            .bind(&request.error_message)
            .bind(request.claimed_at)
            .bind(now_millis())
            .bind(request.id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to update request: {}",
                    e
                )))
            })?;

        if result.rows_affected() == 0 {
            return Err(Error::Database(DatabaseError::NotFound(format!(
                "request {}",
                request.id
            ))));
        }

        Ok(())
    }

    /// Atomically claim the oldest pending request
    ///
    /// A request is eligible when it is pending, visible, and either unclaimed
    /// or claimed longer ago than `lease`. The selection and the claim happen
    /// in one statement, so two callers never receive the same row.
    pub async fn claim_next_pending(&self, lease: Duration) -> Result<Option<Request>> {
        let now = now_millis();
        let lease_millis = i64::try_from(lease.as_millis()).unwrap_or(i64::MAX);
        let stale_before = now.saturating_sub(lease_millis);

        let sql = format!(
            r#"
            UPDATE requests
            SET claimed_at = ?, last_modified_at = ?
            WHERE id = (
                SELECT id FROM requests
                WHERE completed_at IS NULL
                  AND {ACTIVE}
                  AND (claimed_at IS NULL OR claimed_at <= ?)
                ORDER BY created_at ASC, id ASC
                LIMIT 1
            )
            RETURNING {REQUEST_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, Request>(&sql)
            .bind(now)
            .bind(now)
            .bind(stale_before)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to claim pending request: {}",
                    e
                )))
            })?;

        Ok(row)
    }

    /// Soft-delete a request by its request identifier
    ///
    /// Returns false when no visible request had that identifier.
    pub async fn soft_delete_request(&self, request_identifier: &str) -> Result<bool> {
        let sql = format!(
            r#"
            UPDATE requests
            SET is_deleted = 1, last_modified_at = ?
            WHERE request_identifier = ? AND {ACTIVE}
            "#
        );

        let result = sqlx::query(&sql)
            .bind(now_millis())
            .bind(request_identifier)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to delete request: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// Count visible requests by lifecycle state
    pub async fn count_by_state(&self) -> Result<QueueStats> {
        let sql = format!(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN {pending} THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN {completed} THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN {failed} THEN 1 ELSE 0 END), 0)
            FROM requests
            WHERE {ACTIVE}
            "#,
            pending = RequestFilter::Pending.condition(),
            completed = RequestFilter::Completed.condition(),
            failed = RequestFilter::Failed.condition(),
        );

        let (pending, completed, failed): (i64, i64, i64) = sqlx::query_as(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count requests: {}",
                    e
                )))
            })?;

        let pending = pending.max(0) as u64;
        let completed = completed.max(0) as u64;
        let failed = failed.max(0) as u64;

        Ok(QueueStats {
            pending,
            completed,
            failed,
            total: pending + completed + failed,
        })
    }
}
