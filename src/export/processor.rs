//! The single-request export cycle.
//!
//! One cycle claims the oldest pending request, fetches its document,
//! decodes it and writes it to the output directory, then records the
//! outcome on the row. Expected failures mark the row failed and are
//! returned as [`ProcessOutcome::Failed`]; only store errors surface as `Err`.

use crate::db::{Request, now_millis};
use crate::error::{ExportError, FetchError, Result};
use crate::types::ProcessOutcome;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::AsyncWriteExt;

use super::ExportService;

/// Holds the single-flight flag for the duration of one cycle
struct CycleGuard {
    flag: Arc<AtomicBool>,
}

impl CycleGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl ExportService {
    /// Run one processor cycle
    ///
    /// Returns [`ProcessOutcome::Skipped`] without touching anything when
    /// another cycle is in flight, and [`ProcessOutcome::Idle`] when no
    /// request is pending. Otherwise exactly one request transitions to
    /// completed or failed.
    pub async fn process_next_request(&self) -> Result<ProcessOutcome> {
        let Some(_guard) = CycleGuard::acquire(&self.worker_state.cycle_in_flight) else {
            tracing::debug!("Export cycle already in flight, skipping");
            return Ok(ProcessOutcome::Skipped);
        };

        let Some(mut request) = self
            .db
            .claim_next_pending(self.config.export.claim_lease)
            .await?
        else {
            tracing::debug!("No pending export requests");
            return Ok(ProcessOutcome::Idle);
        };

        tracing::info!(
            request_id = request.id,
            request_identifier = %request.request_identifier,
            datastore_identifier = %request.datastore_identifier,
            "Processing export request"
        );

        let result = self.export_request(&request).await;

        request.completed_at = Some(now_millis());
        request.claimed_at = None;

        let outcome = match result {
            Ok(path) => {
                request.successfully_run = Some(true);
                request.file_path = Some(path.display().to_string());
                request.error_message = None;

                // The row stays pending; its next claim must not find this file
                if let Err(e) = self.db.update_request(&request).await {
                    discard_output(&path).await;
                    return Err(e);
                }

                tracing::info!(
                    request_id = request.id,
                    request_identifier = %request.request_identifier,
                    path = %path.display(),
                    "Export request completed"
                );

                ProcessOutcome::Succeeded {
                    id: request.request_id(),
                    request_identifier: request.request_identifier,
                    path,
                }
            }
            Err(e) => {
                let reason = e.to_string();
                request.successfully_run = Some(false);
                request.file_path = None;
                request.error_message = Some(reason.clone());
                self.db.update_request(&request).await?;

                tracing::warn!(
                    request_id = request.id,
                    request_identifier = %request.request_identifier,
                    code = e.code(),
                    error = %e,
                    "Export request failed"
                );

                ProcessOutcome::Failed {
                    id: request.request_id(),
                    request_identifier: request.request_identifier,
                    code: e.code(),
                    reason,
                }
            }
        };

        Ok(outcome)
    }

    /// Fetch, decode and write the document for `request`
    async fn export_request(&self, request: &Request) -> std::result::Result<PathBuf, ExportError> {
        let output_dir = self.output_dir.as_path();

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| ExportError::OutputDirectory {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let file = self
            .fetcher
            .fetch_file(&request.datastore_identifier)
            .await?;

        if file.content.trim().is_empty() {
            return Err(FetchError::EmptyContent {
                identifier: request.datastore_identifier.clone(),
            }
            .into());
        }

        let bytes = decode_content(&request.datastore_identifier, &file.content)?;
        let path = output_dir.join(output_file_name(
            &request.request_identifier,
            &file.file_name,
        ));

        write_new_file(&path, &bytes).await?;

        tracing::debug!(
            request_identifier = %request.request_identifier,
            bytes = bytes.len(),
            path = %path.display(),
            "Wrote exported document"
        );

        Ok(path)
    }
}

/// Decode transport-encoded content
///
/// ASCII whitespace anywhere in the input is ignored, so line-wrapped
/// (MIME-style) base64 decodes the same as a single line.
pub(crate) fn decode_content(
    datastore_identifier: &str,
    content: &str,
) -> std::result::Result<Vec<u8>, ExportError> {
    let compact: String = content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    STANDARD
        .decode(compact)
        .map_err(|source| ExportError::Decode {
            identifier: datastore_identifier.to_string(),
            source,
        })
}

/// `{request_identifier}_{file_name}.json`, with path separators in the remote name flattened
pub(crate) fn output_file_name(request_identifier: &str, file_name: &str) -> String {
    let safe_name: String = file_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{request_identifier}_{safe_name}.json")
}

/// Best-effort removal of a file whose success could not be recorded
async fn discard_output(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::warn!(
            path = %path.display(),
            "Removed exported file after failing to record the outcome"
        ),
        Err(e) => tracing::error!(
            path = %path.display(),
            error = %e,
            "Failed to remove exported file after failing to record the outcome"
        ),
    }
}

async fn write_new_file(path: &Path, bytes: &[u8]) -> std::result::Result<(), ExportError> {
    let write_err = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(write_err)?;

    file.write_all(bytes).await.map_err(write_err)?;
    file.flush().await.map_err(write_err)?;
    Ok(())
}
