//! Shared test helpers for creating ExportService instances in tests.

use crate::config::Config;
use crate::db::Database;
use crate::error::FetchError;
use crate::export::ExportService;
use crate::fetcher::{ContentFetcher, StoredFile};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;

/// In-memory [`ContentFetcher`] answering from a fixed table
///
/// Unknown identifiers answer `NotFound`. An optional delay holds every fetch
/// open, which lets tests observe an in-flight cycle.
#[derive(Default)]
pub(crate) struct StaticFetcher {
    responses: Mutex<HashMap<String, Result<StoredFile, FetchError>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl StaticFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Serve `bytes` (base64-encoded on the wire) as `file_name`
    pub(crate) fn insert_bytes(&self, identifier: &str, file_name: &str, bytes: &[u8]) {
        self.insert_raw(identifier, file_name, &STANDARD.encode(bytes));
    }

    /// Serve `content` verbatim, without encoding it
    pub(crate) fn insert_raw(&self, identifier: &str, file_name: &str, content: &str) {
        self.responses.lock().unwrap().insert(
            identifier.to_string(),
            Ok(StoredFile {
                file_name: file_name.to_string(),
                content: content.to_string(),
            }),
        );
    }

    pub(crate) fn insert_error(&self, identifier: &str, error: FetchError) {
        self.responses
            .lock()
            .unwrap()
            .insert(identifier.to_string(), Err(error));
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ContentFetcher for StaticFetcher {
    async fn fetch_file(&self, datastore_identifier: &str) -> Result<StoredFile, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .lock()
            .unwrap()
            .get(datastore_identifier)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::NotFound {
                    identifier: datastore_identifier.to_string(),
                })
            })
    }
}

/// Test configuration rooted in `dir`: database and output directory live inside it
pub(crate) fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = dir.join("test.db");
    config.export.output_directory = dir.join("output");
    config.export.process_interval = Duration::from_secs(1);
    config
}

/// Helper to create a test ExportService over `fetcher`.
/// Returns the service and the tempdir (which must be kept alive).
pub(crate) async fn create_test_service(
    fetcher: Arc<StaticFetcher>,
) -> (ExportService, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let config = test_config(temp_dir.path());

    let db = Database::new(&config.persistence.database_path)
        .await
        .unwrap();

    let service = ExportService::with_fetcher(config, db, fetcher);
    (service, temp_dir)
}
