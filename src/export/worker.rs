//! Interval-driven background worker.

use crate::types::ProcessOutcome;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::ExportService;

impl ExportService {
    /// Start the request worker background task
    ///
    /// The first cycle runs immediately, then one cycle per configured
    /// interval. Ticks missed while a cycle overruns are skipped rather than
    /// bunched up. The loop stops once [`ExportService::shutdown`] is called;
    /// a cycle already running is allowed to finish.
    ///
    /// Returns an already-finished task when the export service is disabled.
    pub fn start_request_worker(&self) -> tokio::task::JoinHandle<()> {
        if !self.config.export.enabled {
            info!("Export service disabled, skipping request worker");
            return tokio::spawn(async {});
        }

        let service = self.clone();
        let period = self.config.export.process_interval;
        let shutdown = self.worker_state.shutdown_token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {}
                }

                service.run_cycle().await;
            }

            info!("Request worker stopped");
        });

        info!(
            interval_secs = period.as_secs(),
            "Request worker background task started"
        );

        handle
    }

    /// Run one cycle behind a catch-and-log boundary
    ///
    /// Store errors and panics inside the cycle are logged and swallowed so
    /// the timer keeps firing. Returns the outcome when the cycle finished
    /// normally.
    pub(crate) async fn run_cycle(&self) -> Option<ProcessOutcome> {
        let service = self.clone();
        let joined = tokio::spawn(async move { service.process_next_request().await }).await;

        match joined {
            Ok(Ok(outcome)) => {
                debug!(?outcome, "Export cycle finished");
                Some(outcome)
            }
            Ok(Err(e)) => {
                error!(error = %e, "Export cycle failed");
                None
            }
            Err(e) if e.is_panic() => {
                error!(error = %e, "Export cycle panicked");
                None
            }
            Err(e) => {
                error!(error = %e, "Export cycle was cancelled");
                None
            }
        }
    }
}
