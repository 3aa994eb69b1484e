use serde::{Deserialize, Serialize};

use crate::criteria::CriteriaSet;
use crate::directory::{PrincipalId, Verification, VerificationId, Website, WebsiteId};

/// Input to [`DirectoryStore::record_verification`](super::DirectoryStore::record_verification).
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRecord {
    pub website_id: WebsiteId,
    pub verifier: PrincipalId,
    pub is_trusted: bool,
    pub criteria: CriteriaSet,
    /// Quota credited only when no prior verification existed.
    pub reward_on_create: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedVerification {
    pub verification: Verification,
    pub created: bool,
    /// Verifier's balance after any reward.
    pub quota_remaining: i64,
}

/// Reference to an uncounted verification as of a given revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingVerification {
    pub id: VerificationId,
    pub website_id: WebsiteId,
    pub revision: u64,
}

impl From<&Verification> for PendingVerification {
    fn from(v: &Verification) -> Self {
        Self {
            id: v.id,
            website_id: v.website_id,
            revision: v.revision,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueCandidate {
    pub website: Website,
    pub verification_count: usize,
}
