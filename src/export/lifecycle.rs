//! Construction and shutdown coordination.

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::fetcher::{ContentFetcher, SecureDataStoreClient};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::{ExportService, WorkerState};

/// Upper bound on how long shutdown waits for an in-flight cycle
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

impl ExportService {
    /// Create a new ExportService instance
    ///
    /// This initializes all core components:
    /// - Validates the configuration
    /// - Opens/creates the SQLite request store and runs migrations
    /// - Builds the secure data store HTTP client
    /// - Resolves the output directory to an absolute path
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let db = Database::new(&config.persistence.database_path).await?;
        let fetcher = SecureDataStoreClient::new(&config.datastore)?;

        tracing::info!(
            api_server = %config.datastore.api_server,
            database = %config.persistence.database_path.display(),
            "Export service initialized"
        );

        Ok(Self::with_fetcher(config, db, Arc::new(fetcher)))
    }

    /// Create an ExportService over an existing store and any [`ContentFetcher`]
    pub fn with_fetcher(config: Config, db: Database, fetcher: Arc<dyn ContentFetcher>) -> Self {
        let output_dir = config.export.resolved_output_directory();
        tracing::debug!(output_dir = %output_dir.display(), "Resolved output directory");

        Self {
            db: Arc::new(db),
            config: Arc::new(config),
            fetcher,
            output_dir: Arc::new(output_dir),
            worker_state: WorkerState::new(),
        }
    }

    /// Configuration this service was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Absolute directory exported files are written to
    pub fn output_directory(&self) -> &Path {
        &self.output_dir
    }

    /// Whether intake is still open
    pub fn is_accepting(&self) -> bool {
        self.worker_state.accepting_new.load(Ordering::SeqCst)
    }

    /// Gracefully shut down the export service
    ///
    /// 1. Stops accepting new requests
    /// 2. Cancels future worker timer firings
    /// 3. Waits (bounded) for an in-flight cycle to finish; it is never interrupted
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.worker_state.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new requests");

        self.worker_state.shutdown_token.cancel();

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.wait_for_cycle()).await {
            Ok(()) => tracing::info!("No export cycle in flight"),
            Err(_) => {
                tracing::warn!("Timeout waiting for export cycle to finish, proceeding with shutdown")
            }
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    async fn wait_for_cycle(&self) {
        while self.worker_state.cycle_in_flight.load(Ordering::SeqCst) {
            tracing::debug!("Waiting for in-flight export cycle");
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
