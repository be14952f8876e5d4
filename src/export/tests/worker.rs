use crate::db::{Database, RequestFilter};
use crate::error::FetchError;
use crate::export::ExportService;
use crate::export::test_helpers::{StaticFetcher, create_test_service, test_config};
use crate::fetcher::{ContentFetcher, StoredFile};
use crate::types::{ProcessOutcome, RequestState};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

struct PanickingFetcher;

#[async_trait::async_trait]
impl ContentFetcher for PanickingFetcher {
    async fn fetch_file(&self, _datastore_identifier: &str) -> Result<StoredFile, FetchError> {
        panic!("fetcher exploded");
    }
}

async fn wait_for_state(service: &ExportService, request_identifier: &str, state: RequestState) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let info = service.get_request(request_identifier).await.unwrap();
            if info.state == state {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("request did not reach expected state in time");
}

#[tokio::test]
async fn test_worker_runs_first_cycle_immediately() {
    let fetcher = Arc::new(StaticFetcher::new());
    fetcher.insert_bytes("doc-1", "report", b"{}");
    let (service, _temp_dir) = create_test_service(fetcher).await;

    let created = service
        .add_requests(&["doc-1".to_string()])
        .await
        .unwrap()
        .remove(0);

    let handle = service.start_request_worker();
    wait_for_state(&service, &created.request_identifier, RequestState::Completed).await;

    service.shutdown().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker did not stop after shutdown")
        .unwrap();
}

#[tokio::test]
async fn test_worker_drains_queue_one_request_per_tick() {
    let fetcher = Arc::new(StaticFetcher::new());
    fetcher.insert_bytes("doc-1", "a", b"{}");
    fetcher.insert_bytes("doc-2", "b", b"{}");
    let (service, _temp_dir) = create_test_service(fetcher).await;

    let created = service
        .add_requests(&["doc-1".to_string(), "doc-2".to_string()])
        .await
        .unwrap();

    let handle = service.start_request_worker();
    wait_for_state(&service, &created[1].request_identifier, RequestState::Completed).await;

    let stats = service.queue_stats().await.unwrap();
    assert_eq!(stats.completed, 2);

    service.shutdown().await.unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_disabled_worker_does_nothing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(temp_dir.path());
    config.export.enabled = false;
    let db = Database::new(&config.persistence.database_path)
        .await
        .unwrap();
    let fetcher = Arc::new(StaticFetcher::new());
    fetcher.insert_bytes("doc-1", "report", b"{}");
    let service = ExportService::with_fetcher(config, db, fetcher.clone());

    service.add_requests(&["doc-1".to_string()]).await.unwrap();

    let handle = service.start_request_worker();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("disabled worker should finish immediately")
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(fetcher.calls(), 0);
    let pending = service.db.read_requests(RequestFilter::Pending).await.unwrap();
    assert_eq!(pending.len(), 1);
}

#[tokio::test]
async fn test_run_cycle_contains_store_errors() {
    let (service, _temp_dir) = create_test_service(Arc::new(StaticFetcher::new())).await;

    service.db.pool().close().await;

    assert!(service.run_cycle().await.is_none());
    assert!(
        !service
            .worker_state
            .cycle_in_flight
            .load(Ordering::SeqCst),
        "guard must be released after a failed cycle"
    );
}

#[tokio::test]
async fn test_run_cycle_contains_panics() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = test_config(temp_dir.path());
    let db = Database::new(&config.persistence.database_path)
        .await
        .unwrap();
    let service = ExportService::with_fetcher(config, db, Arc::new(PanickingFetcher));

    service.add_requests(&["doc-1".to_string()]).await.unwrap();

    assert!(service.run_cycle().await.is_none());
    assert!(!service.worker_state.cycle_in_flight.load(Ordering::SeqCst));

    // the claim lease keeps the crashed row away from the next cycle
    assert_eq!(service.run_cycle().await, Some(ProcessOutcome::Idle));
}

#[tokio::test]
async fn test_shutdown_waits_for_in_flight_cycle() {
    let fetcher = Arc::new(StaticFetcher::with_delay(Duration::from_millis(300)));
    fetcher.insert_bytes("doc-1", "report", b"{}");
    let (service, _temp_dir) = create_test_service(fetcher.clone()).await;

    let created = service
        .add_requests(&["doc-1".to_string()])
        .await
        .unwrap()
        .remove(0);

    let handle = service.start_request_worker();
    while fetcher.calls() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    service.shutdown().await.unwrap();

    // the in-flight export ran to completion before shutdown returned
    let info = service.get_request(&created.request_identifier).await.unwrap();
    assert_eq!(info.state, RequestState::Completed);
    handle.await.unwrap();
}
