use std::collections::BTreeMap;

use serde::Serialize;

use crate::criteria::CriteriaSet;
use crate::directory::VerificationId;

/// Consensus values produced by folding a website's verifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consensus {
    pub criteria: CriteriaSet,
    pub verified: bool,
    pub trusted_verification: Option<VerificationId>,
}

/// Summary of one aggregation batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationReport {
    /// Websites whose consensus was rewritten.
    pub websites_processed: usize,
    /// Websites deleted before they could be processed.
    pub websites_skipped: usize,
    /// Websites left for the next run after a store error.
    pub websites_failed: usize,
    pub verifications_counted: usize,
    /// Batch stopped early on shutdown.
    pub cancelled: bool,
    /// Another run was in flight; nothing was done.
    pub overlapped: bool,
}

impl AggregationReport {
    pub fn is_noop(&self) -> bool {
        self.websites_processed == 0 && self.websites_skipped == 0 && self.websites_failed == 0
    }
}

/// Result of [`VerificationService::submit`](super::VerificationService::submit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub verification_id: VerificationId,
    /// Domain of the verified website.
    pub website: String,
    /// First verification of this website by this verifier.
    pub is_new: bool,
    pub queries_awarded: i64,
    pub queries_remaining: i64,
}

/// A website offered to a verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    pub domain: String,
    pub name: String,
    pub description: String,
    pub current_verification_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationQueue {
    pub websites: Vec<QueueEntry>,
    /// What each criterion means, for the verifier evaluating the sites.
    pub criteria_docs: BTreeMap<&'static str, &'static str>,
}
