//! Polling assertions for worker-driven tests

use datastore_export::{ExportService, RequestInfo, RequestState};
use std::time::Duration;

/// Poll until the request leaves `Pending`, or give up after `timeout`
///
/// Returns the request as last observed.
pub async fn wait_for_terminal(
    service: &ExportService,
    request_identifier: &str,
    timeout: Duration,
) -> RequestInfo {
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let request = service.get_request(request_identifier).await.unwrap();
        if request.state != RequestState::Pending || tokio::time::Instant::now() >= deadline {
            return request;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
