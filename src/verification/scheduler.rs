use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use crate::store::StoreResult;

use super::aggregator::Aggregator;
use super::types::AggregationReport;

/// Runs [`Aggregator`] batches on a fixed interval until shut down.
pub struct AggregationScheduler {
    aggregator: Arc<Aggregator>,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl AggregationScheduler {
    pub fn new(aggregator: Arc<Aggregator>, interval: Duration) -> Self {
        Self {
            aggregator,
            interval,
            shutdown: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Runs a single batch outside the schedule (still honours shutdown).
    pub async fn run_once(&self) -> StoreResult<AggregationReport> {
        self.aggregator.run(&self.shutdown).await
    }

    /// Spawns the periodic task (no-op if already running).
    ///
    /// The first batch runs immediately, then once per interval.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return tokio::spawn(async {});
        }

        let aggregator = Arc::clone(&self.aggregator);
        let shutdown = Arc::clone(&self.shutdown);
        let running = Arc::clone(&self.running);
        let wake = Arc::clone(&self.wake);
        let period = self.interval;

        tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = wake.notified() => {}
                }
                if shutdown.load(Ordering::Acquire) {
                    break;
                }

                match aggregator.run(&shutdown).await {
                    Ok(report) if report.is_noop() => {}
                    Ok(report) => info!(?report, "Scheduled aggregation finished"),
                    Err(e) => warn!(error = %e, "Scheduled aggregation failed"),
                }
            }
            running.store(false, Ordering::Release);
            info!("Aggregation scheduler stopped");
        })
    }

    /// Stops the schedule. An in-flight batch stops before its next website.
    pub fn shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            self.wake.notify_one();
        }
    }
}
