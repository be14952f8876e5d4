//! Export service split into focused submodules.
//!
//! The `ExportService` struct and its methods are organized by domain:
//! - [`intake`] - Validating and enqueueing datastore identifiers
//! - [`processor`] - The single-request export cycle
//! - [`worker`] - Interval-driven background worker
//! - [`queries`] - Read and delete operations for the API
//! - [`lifecycle`] - Construction and shutdown coordination

mod intake;
mod lifecycle;
mod processor;
mod queries;
mod worker;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::db::Database;
use crate::fetcher::ContentFetcher;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio_util::sync::CancellationToken;

/// Worker coordination flags shared by every clone of the service
#[derive(Clone)]
pub(crate) struct WorkerState {
    /// Set while a processor cycle runs; at most one cycle is in flight
    pub(crate) cycle_in_flight: Arc<AtomicBool>,
    /// Flag to indicate whether new requests are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Cancelled on shutdown to stop future timer firings
    pub(crate) shutdown_token: CancellationToken,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            cycle_in_flight: Arc::new(AtomicBool::new(false)),
            accepting_new: Arc::new(AtomicBool::new(true)),
            shutdown_token: CancellationToken::new(),
        }
    }
}

/// Main export service instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct ExportService {
    /// Request store (wrapped in Arc for sharing across tasks)
    /// Public for integration tests to inspect request rows
    pub db: Arc<Database>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Source of document content
    pub(crate) fetcher: Arc<dyn ContentFetcher>,
    /// Absolute directory exported files are written to
    pub(crate) output_dir: Arc<PathBuf>,
    /// Single-flight and shutdown coordination
    pub(crate) worker_state: WorkerState,
}
