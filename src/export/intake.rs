//! Validating and enqueueing datastore identifiers.

use crate::db::NewRequest;
use crate::error::{Error, Result};
use crate::types::RequestInfo;
use std::sync::atomic::Ordering;

use super::ExportService;

impl ExportService {
    /// Queue one export request per datastore identifier
    ///
    /// The whole list is validated before anything is written: an empty list
    /// or any blank identifier rejects the batch, and every problem is
    /// reported. Duplicate identifiers are queued as separate requests.
    pub async fn add_requests(&self, datastore_identifiers: &[String]) -> Result<Vec<RequestInfo>> {
        if !self.worker_state.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        validate_identifiers(datastore_identifiers)?;

        let batch: Vec<NewRequest> = datastore_identifiers
            .iter()
            .map(|identifier| NewRequest {
                request_identifier: uuid::Uuid::new_v4().to_string(),
                datastore_identifier: identifier.clone(),
            })
            .collect();

        let rows = self.db.insert_requests(&batch).await?;

        tracing::info!(count = rows.len(), "Queued export requests");
        for row in &rows {
            tracing::debug!(
                request_id = row.id,
                request_identifier = %row.request_identifier,
                datastore_identifier = %row.datastore_identifier,
                "Queued export request"
            );
        }

        Ok(rows.into_iter().map(RequestInfo::from).collect())
    }
}

fn validate_identifiers(identifiers: &[String]) -> Result<()> {
    if identifiers.is_empty() {
        return Err(Error::validation(
            "datastoreIdentifiers must contain at least one identifier",
        ));
    }

    let messages: Vec<String> = identifiers
        .iter()
        .enumerate()
        .filter(|(_, identifier)| identifier.trim().is_empty())
        .map(|(index, _)| format!("datastoreIdentifiers[{index}] must not be empty"))
        .collect();

    if messages.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation { messages })
    }
}
