//! Periodic refresh loop.
//!
//! Runs one cycle to completion, then sleeps the configured interval, then
//! repeats — unconditionally. A failed cycle never prevents the next one;
//! resilience comes entirely from the reschedule. Cycles are naturally
//! serialized because the sleep starts only after the cycle completes.
use tokio::sync::watch;

use crate::provider::{CycleOutcome, MeetingProvider};

/// Drive the provider until the shutdown signal flips.
///
/// The interval is re-read from the settings cell every iteration, so a
/// `refreshInterval` configuration change takes effect at the next
/// reschedule.
pub async fn run(provider: MeetingProvider, mut shutdown: watch::Receiver<bool>) {
    tracing::info!("Refresh scheduler started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let outcome = provider.run_cycle().await;
        if let CycleOutcome::AwaitingAuth = outcome {
            tracing::debug!("Cycle skipped (awaiting auth), rescheduling");
        }

        let interval = provider.settings().refresh_interval();
        tracing::debug!(interval_secs = interval.as_secs(), "Next cycle scheduled");

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                // Sender dropped counts as shutdown
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("Refresh scheduler stopped");
}
