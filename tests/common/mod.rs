//! Common test utilities for datastore-export integration tests

#[allow(dead_code)]
pub mod assertions;
#[allow(dead_code)]
pub mod datastore;

#[allow(unused_imports)]
pub use assertions::*;
pub use datastore::*;

use datastore_export::{Config, ExportService};
use std::time::Duration;
use tempfile::TempDir;

/// Configuration rooted in a fresh temp dir, pointed at `api_server`
///
/// The temp dir holds both the request store and the output directory and
/// must be kept alive for the duration of the test.
pub fn test_config(api_server: &str) -> (Config, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.datastore.api_server = api_server.to_string();
    config.datastore.request_timeout = Duration::from_secs(5);
    config.persistence.database_path = temp_dir.path().join("requests.db");
    config.export.output_directory = temp_dir.path().join("output");
    config.export.process_interval = Duration::from_secs(1);

    (config, temp_dir)
}

/// Build a real service (HTTP fetcher included) against `api_server`
pub async fn create_service(api_server: &str) -> (ExportService, TempDir) {
    let (config, temp_dir) = test_config(api_server);
    let service = ExportService::new(config).await.unwrap();
    (service, temp_dir)
}
