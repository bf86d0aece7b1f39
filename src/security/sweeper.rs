//! Periodic removal of expired guard entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::security::guard::RequestGuard;

pub struct Sweeper {
    guard: Arc<RequestGuard>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(guard: Arc<RequestGuard>) -> Self {
        let interval = guard.sweep_interval();
        Self { guard, interval }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sweep on every tick until shutdown is signalled.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Sweeper starting");

        // First tick fires one interval after start, not immediately.
        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.guard.sweep_expired();
                    let (rate_windows, csrf_entries) = self.guard.tracked();
                    tracing::debug!(
                        removed_rate_windows = report.rate_windows,
                        removed_csrf_entries = report.csrf_entries,
                        rate_windows,
                        csrf_entries,
                        "Swept expired entries"
                    );
                }
                _ = shutdown.recv() => {
                    tracing::info!("Sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
