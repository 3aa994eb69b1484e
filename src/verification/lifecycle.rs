use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::{debug, info, instrument};

use crate::constants::{QUEUE_LIMIT, VERIFICATION_REWARD, VERIFIED_COUNT_THRESHOLD};
use crate::criteria::{CriteriaSet, criteria_docs};
use crate::directory::{Principal, normalize_domain};
use crate::error::{DirectoryError, DirectoryResult};
use crate::store::{DirectoryStore, VerificationRecord};

use super::types::{QueueEntry, SubmitOutcome, VerificationQueue};

/// Verification submission and queue selection.
pub struct VerificationService {
    store: Arc<dyn DirectoryStore>,
    reward: i64,
}

impl VerificationService {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self {
            store,
            reward: VERIFICATION_REWARD,
        }
    }

    /// Quota credited for a first-time verification.
    pub fn reward(&self) -> i64 {
        self.reward
    }

    /// Records `verifier`'s assessment of the website at `domain`.
    ///
    /// The first submission for a `(website, verifier)` pair creates a verification
    /// and credits the reward; later submissions overwrite all 30 booleans in place,
    /// reset `counted`, and award nothing. Consensus is not touched here; the next
    /// aggregation run folds the submission in.
    #[instrument(skip(self, verifier, criteria), fields(verifier = ?verifier.map(|p| p.id)))]
    pub async fn submit(
        &self,
        domain: &str,
        verifier: Option<&Principal>,
        criteria: &serde_json::Value,
    ) -> DirectoryResult<SubmitOutcome> {
        let verifier = verifier.ok_or(DirectoryError::Unauthenticated)?;
        let domain =
            normalize_domain(domain).ok_or_else(|| DirectoryError::invalid("invalid domain"))?;
        let criteria = CriteriaSet::from_json(criteria)?;

        let website = self
            .store
            .find_website(&domain)
            .await?
            .ok_or_else(|| DirectoryError::not_found("website"))?;

        let recorded = self
            .store
            .record_verification(VerificationRecord {
                website_id: website.id,
                verifier: verifier.id,
                is_trusted: verifier.is_trusted_verifier,
                criteria,
                reward_on_create: self.reward,
            })
            .await?;

        let queries_awarded = if recorded.created { self.reward } else { 0 };

        info!(
            website = %website.domain,
            verification_id = %recorded.verification.id,
            is_new = recorded.created,
            trusted = verifier.is_trusted_verifier,
            queries_awarded,
            "Verification recorded"
        );

        Ok(SubmitOutcome {
            verification_id: recorded.verification.id,
            website: website.domain,
            is_new: recorded.created,
            queries_awarded,
            queries_remaining: recorded.quota_remaining,
        })
    }

    /// Samples up to `limit` (at most 10) websites still needing verification that
    /// `verifier` has not yet verified.
    ///
    /// Eligible: fewer than 12 verifications and not verified. Order is random.
    #[instrument(skip(self, verifier))]
    pub async fn queue_for(
        &self,
        verifier: Option<&Principal>,
        limit: usize,
    ) -> DirectoryResult<VerificationQueue> {
        let verifier = verifier.ok_or(DirectoryError::Unauthenticated)?;
        let limit = limit.min(QUEUE_LIMIT);

        let mut candidates = self
            .store
            .queue_candidates(verifier.id, VERIFIED_COUNT_THRESHOLD)
            .await?;
        let eligible = candidates.len();

        candidates.shuffle(&mut rand::thread_rng());
        candidates.truncate(limit);

        debug!(
            verifier = %verifier.id,
            eligible,
            returned = candidates.len(),
            "Verification queue selected"
        );

        let websites = candidates
            .into_iter()
            .map(|c| QueueEntry {
                domain: c.website.domain,
                name: c.website.name,
                description: c.website.description,
                current_verification_count: c.verification_count,
            })
            .collect();

        Ok(VerificationQueue {
            websites,
            criteria_docs: criteria_docs(),
        })
    }
}
