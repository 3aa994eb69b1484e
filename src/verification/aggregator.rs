use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, instrument, warn};

use crate::directory::WebsiteId;
use crate::store::{DirectoryStore, PendingVerification, StoreError, StoreResult};

use super::consensus::aggregate;
use super::types::AggregationReport;

/// Runs aggregation batches ("crunches") over uncounted verifications.
///
/// Each affected website is re-aggregated over its complete verification set, then
/// the verifications that triggered it are marked counted. A verification
/// resubmitted while the batch runs keeps `counted = false` and is picked up by the
/// next batch.
pub struct Aggregator {
    store: Arc<dyn DirectoryStore>,
    in_flight: AtomicBool,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight flag even if the batch future is dropped mid-run.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Aggregator {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self {
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Returns `true` while a batch is running.
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs one batch.
    ///
    /// `cancel` is checked between websites; websites not reached are left
    /// uncounted. Per-website failures are logged and skipped. Only a failure to
    /// list the pending verifications aborts the batch.
    #[instrument(skip_all)]
    pub async fn run(&self, cancel: &AtomicBool) -> StoreResult<AggregationReport> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            warn!("Aggregation already in flight, skipping overlapping run");
            return Ok(AggregationReport {
                overlapped: true,
                ..Default::default()
            });
        }
        let _guard = InFlightGuard(&self.in_flight);

        let pending = self.store.uncounted_verifications().await?;
        if pending.is_empty() {
            debug!("No uncounted verifications");
            return Ok(AggregationReport::default());
        }

        let mut by_website: BTreeMap<WebsiteId, Vec<PendingVerification>> = BTreeMap::new();
        for p in pending {
            by_website.entry(p.website_id).or_default().push(p);
        }

        debug!(
            websites = by_website.len(),
            "Aggregating websites with uncounted verifications"
        );

        let mut report = AggregationReport::default();
        for (website_id, batch) in by_website {
            if cancel.load(Ordering::Acquire) {
                info!(
                    processed = report.websites_processed,
                    "Aggregation cancelled, leaving remaining websites uncounted"
                );
                report.cancelled = true;
                break;
            }

            match self.aggregate_website(website_id).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(website_id = %website_id, "Website gone, skipping");
                    report.websites_skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(website_id = %website_id, error = %e, "Failed to aggregate website");
                    report.websites_failed += 1;
                    continue;
                }
            }

            // Counted only after the consensus write above has landed.
            match self.store.mark_counted(&batch).await {
                Ok(marked) => {
                    report.websites_processed += 1;
                    report.verifications_counted += marked;
                }
                Err(e) => {
                    warn!(
                        website_id = %website_id,
                        error = %e,
                        "Consensus saved but verifications not marked counted"
                    );
                    report.websites_failed += 1;
                }
            }
        }

        info!(
            processed = report.websites_processed,
            skipped = report.websites_skipped,
            failed = report.websites_failed,
            counted = report.verifications_counted,
            cancelled = report.cancelled,
            "Aggregation run complete"
        );
        Ok(report)
    }

    /// Re-aggregates one website. Returns `Ok(false)` when it no longer exists.
    async fn aggregate_website(&self, id: WebsiteId) -> StoreResult<bool> {
        let Some(website) = self.store.get_website(id).await? else {
            return Ok(false);
        };
        let verifications = self.store.verifications_for(id).await?;
        let consensus = aggregate(&website, &verifications);

        match self.store.save_consensus(id, consensus).await {
            Ok(updated) => {
                debug!(
                    website = %updated.domain,
                    verifications = verifications.len(),
                    level_before = website.level(),
                    level_after = updated.level(),
                    verified = updated.verified,
                    "Consensus updated"
                );
                Ok(true)
            }
            Err(StoreError::WebsiteNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
