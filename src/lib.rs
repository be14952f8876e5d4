//! # datastore-export
//!
//! Document export service for a secure data store.
//!
//! Callers queue datastore identifiers as export requests. A background
//! worker claims the oldest pending request on a fixed interval, fetches its
//! base64 content from the secure data store, decodes it and writes it to the
//! output directory as `{requestIdentifier}_{fileName}.json`. Each request
//! ends up either completed or failed; failures are never retried.
//!
//! ## Quick Start
//!
//! ```no_run
//! use datastore_export::{Config, ExportService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.datastore.api_server = "https://datastore.internal".to_string();
//!
//!     let service = ExportService::new(config).await?;
//!     let queued = service.add_requests(&["doc-42".to_string()]).await?;
//!     println!("queued {}", queued[0].request_identifier);
//!
//!     let _worker = service.start_request_worker();
//!     datastore_export::run_with_shutdown(service).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Request store (SQLite)
pub mod db;
/// Error types
pub mod error;
/// Request intake, processing and the background worker
pub mod export;
/// Secure data store client
pub mod fetcher;
/// Tracing subscriber setup
pub mod logging;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{
    ApiConfig, Config, DatastoreConfig, ExportConfig, LoggingConfig, PersistenceConfig,
    ServerIntegrationConfig,
};
pub use db::Database;
pub use error::{
    ApiError, DatabaseError, Error, ErrorDetail, ExportError, FetchError, Result, ToHttpStatus,
};
pub use export::ExportService;
pub use fetcher::{ContentFetcher, SecureDataStoreClient, StoredFile};
pub use logging::{LoggingGuard, init_logging};
pub use types::{ProcessOutcome, QueueStats, RequestId, RequestInfo, RequestState};

/// Helper function to run the service with graceful signal handling.
///
/// Waits for a termination signal and then calls the service's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(service: ExportService) -> Result<()> {
    wait_for_signal().await;
    service.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
