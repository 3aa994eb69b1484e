use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_SEARCH_QUOTA;
use crate::criteria::{CriteriaSet, compute_level};

/// Store-assigned website key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebsiteId(pub u64);

impl fmt::Display for WebsiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a verifier / searcher as resolved by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub u64);

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationId(pub Uuid);

impl VerificationId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for VerificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directory entry.
///
/// `criteria` holds the consensus values written by aggregation; a single
/// verifier's submission never lands here directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Website {
    pub id: WebsiteId,
    /// Normalized domain, unique across the directory.
    pub domain: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// URL where an agent should start interacting with the site.
    #[serde(default)]
    pub entry_point: Option<String>,
    #[serde(default)]
    pub submitted_by: Option<PrincipalId>,
    /// Submitter claims to own the site.
    #[serde(default)]
    pub is_my_website: bool,
    pub criteria: CriteriaSet,
    pub verified: bool,
    /// Verification elected as definitive (a trusted verifier's).
    #[serde(default)]
    pub trusted_verification: Option<VerificationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Website {
    /// Level derived from the consensus criteria. Never stored.
    pub fn level(&self) -> u8 {
        compute_level(&self.criteria)
    }

    pub fn has_trusted_verification(&self) -> bool {
        self.trusted_verification.is_some()
    }

    /// Text used to embed the website for semantic search.
    pub fn embedding_text(&self) -> String {
        format!("{}. {}", self.name, self.description)
    }
}

/// Fields supplied when registering a website.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWebsite {
    pub domain: String,
    pub name: String,
    pub description: String,
    pub entry_point: Option<String>,
    pub submitted_by: Option<PrincipalId>,
    pub is_my_website: bool,
}

/// One verifier's assessment of one website.
///
/// Identity is the `(website_id, verifier)` pair: resubmission overwrites in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub id: VerificationId,
    pub website_id: WebsiteId,
    pub verifier: PrincipalId,
    pub criteria: CriteriaSet,
    pub is_trusted: bool,
    /// Folded into the website's consensus by an aggregation run.
    pub counted: bool,
    /// Bumped on every overwrite; guards the `counted` transition.
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub username: String,
    /// Verifications by this principal carry trusted weight.
    #[serde(default)]
    pub is_trusted_verifier: bool,
    pub search_queries_remaining: i64,
}

impl Principal {
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id: PrincipalId(id),
            username: username.into(),
            is_trusted_verifier: false,
            search_queries_remaining: DEFAULT_SEARCH_QUOTA,
        }
    }

    pub fn trusted(mut self) -> Self {
        self.is_trusted_verifier = true;
        self
    }

    pub fn with_quota(mut self, balance: i64) -> Self {
        self.search_queries_remaining = balance;
        self
    }
}
