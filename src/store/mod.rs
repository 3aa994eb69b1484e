//! Persistence boundary for websites, verifications, keyword tags and quota.
//!
//! The production database is an external collaborator; the core only depends on
//! [`DirectoryStore`]. Implementations must make [`DirectoryStore::record_verification`]
//! and the quota operations atomic: the core requests atomicity here rather than
//! composing it from separate reads and writes.
//!
//! [`MemoryStore`] is a complete in-process implementation with JSON snapshots.

pub mod error;
pub mod memory;
pub mod model;


pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, SnapshotLoad};
pub use model::{PendingVerification, QueueCandidate, RecordedVerification, VerificationRecord};

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use crate::directory::{NewWebsite, Principal, PrincipalId, Verification, Website, WebsiteId};
use crate::verification::Consensus;

/// Storage operations the directory core depends on.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Inserts a website with all-false criteria. Fails with
    /// [`StoreError::DuplicateDomain`] when the domain is taken.
    async fn insert_website(&self, new: NewWebsite) -> StoreResult<Website>;

    async fn get_website(&self, id: WebsiteId) -> StoreResult<Option<Website>>;

    /// Looks up a website by normalized domain.
    async fn find_website(&self, domain: &str) -> StoreResult<Option<Website>>;

    /// Loads several websites; missing ids are skipped.
    async fn get_websites(&self, ids: &[WebsiteId]) -> StoreResult<Vec<Website>>;

    /// Deletes a website together with its verifications and keyword tags.
    async fn delete_website(&self, id: WebsiteId) -> StoreResult<bool>;

    /// Writes aggregated consensus values and advances `updated_at`.
    async fn save_consensus(&self, id: WebsiteId, consensus: Consensus) -> StoreResult<Website>;

    /// Atomically upserts the `(website, verifier)` verification and, when it is
    /// new, credits `reward_on_create` to the verifier's quota.
    async fn record_verification(
        &self,
        record: VerificationRecord,
    ) -> StoreResult<RecordedVerification>;

    async fn verifications_for(&self, website: WebsiteId) -> StoreResult<Vec<Verification>>;

    async fn verification_count(&self, website: WebsiteId) -> StoreResult<usize>;

    /// Every verification not yet folded into its website's consensus.
    async fn uncounted_verifications(&self) -> StoreResult<Vec<PendingVerification>>;

    /// Marks verifications counted when their revision still matches.
    /// Returns how many were marked.
    async fn mark_counted(&self, pending: &[PendingVerification]) -> StoreResult<usize>;

    /// Websites with fewer than `max_verifications` verifications, not verified,
    /// and not yet verified by `verifier`.
    async fn queue_candidates(
        &self,
        verifier: PrincipalId,
        max_verifications: usize,
    ) -> StoreResult<Vec<QueueCandidate>>;

    /// Replaces a website's keyword tags.
    async fn replace_keywords(&self, website: WebsiteId, tokens: BTreeSet<String>)
    -> StoreResult<()>;

    /// For each website tagged with at least one of `tokens`, how many of them match.
    async fn keyword_overlap(
        &self,
        tokens: &BTreeSet<String>,
    ) -> StoreResult<HashMap<WebsiteId, usize>>;

    async fn upsert_principal(&self, principal: Principal) -> StoreResult<()>;

    async fn get_principal(&self, id: PrincipalId) -> StoreResult<Option<Principal>>;

    async fn quota_balance(&self, id: PrincipalId) -> StoreResult<i64>;

    /// Atomically debits `amount` if the balance covers it; never goes negative.
    /// Returns the new balance.
    async fn try_debit_quota(&self, id: PrincipalId, amount: i64) -> StoreResult<i64>;

    /// Atomically credits `amount`. Returns the new balance.
    async fn credit_quota(&self, id: PrincipalId, amount: i64) -> StoreResult<i64>;
}
