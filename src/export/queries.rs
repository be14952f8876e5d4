//! Read and delete operations used by the API.

use crate::db::RequestFilter;
use crate::error::{Error, Result};
use crate::types::{QueueStats, RequestInfo, RequestState};

use super::ExportService;

impl ExportService {
    /// Look up a request by its request identifier
    pub async fn get_request(&self, request_identifier: &str) -> Result<RequestInfo> {
        self.db
            .get_request_by_identifier(request_identifier)
            .await?
            .map(RequestInfo::from)
            .ok_or_else(|| Error::NotFound(format!("request {request_identifier}")))
    }

    /// List requests oldest first, optionally restricted to one state
    pub async fn list_requests(&self, state: Option<RequestState>) -> Result<Vec<RequestInfo>> {
        let filter = state.map(RequestFilter::from).unwrap_or_default();
        let rows = self.db.read_requests(filter).await?;
        Ok(rows.into_iter().map(RequestInfo::from).collect())
    }

    /// Soft-delete a request so it is never processed or listed again
    pub async fn delete_request(&self, request_identifier: &str) -> Result<()> {
        if !self.db.soft_delete_request(request_identifier).await? {
            return Err(Error::NotFound(format!("request {request_identifier}")));
        }

        tracing::info!(%request_identifier, "Deleted export request");
        Ok(())
    }

    /// Request counts by lifecycle state
    pub async fn queue_stats(&self) -> Result<QueueStats> {
        self.db.count_by_state().await
    }
}
