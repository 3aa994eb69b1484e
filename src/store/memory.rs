use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::criteria::CriteriaSet;
use crate::directory::{
    NewWebsite, Principal, PrincipalId, Verification, VerificationId, Website, WebsiteId,
};
use crate::verification::Consensus;

use super::error::{StoreError, StoreResult};
use super::model::{PendingVerification, QueueCandidate, RecordedVerification, VerificationRecord};
use super::DirectoryStore;

/// Outcome of [`MemoryStore::load_snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotLoad {
    Loaded {
        websites: usize,
        verifications: usize,
    },
    NotFound,
}

#[derive(Default, Serialize, Deserialize)]
struct Inner {
    next_website_id: u64,
    websites: BTreeMap<WebsiteId, Website>,
    #[serde(skip)]
    domains: HashMap<String, WebsiteId>,
    verifications: BTreeMap<VerificationId, Verification>,
    #[serde(skip)]
    by_pair: HashMap<(WebsiteId, PrincipalId), VerificationId>,
    website_keywords: BTreeMap<WebsiteId, BTreeSet<String>>,
    #[serde(skip)]
    keyword_index: HashMap<String, BTreeSet<WebsiteId>>,
    principals: BTreeMap<PrincipalId, Principal>,
}

impl Inner {
    /// Recomputes the secondary indexes after deserialization.
    fn rebuild_indexes(&mut self) {
        self.domains = self
            .websites
            .values()
            .map(|w| (w.domain.clone(), w.id))
            .collect();
        self.by_pair = self
            .verifications
            .values()
            .map(|v| ((v.website_id, v.verifier), v.id))
            .collect();
        self.keyword_index.clear();
        for (&website, tokens) in &self.website_keywords {
            for token in tokens {
                self.keyword_index
                    .entry(token.clone())
                    .or_default()
                    .insert(website);
            }
        }
        let max_id = self.websites.keys().map(|id| id.0).max().unwrap_or(0);
        self.next_website_id = self.next_website_id.max(max_id);
    }

    fn verification_count(&self, website: WebsiteId) -> usize {
        self.verifications
            .values()
            .filter(|v| v.website_id == website)
            .count()
    }

    fn principal_mut(&mut self, id: PrincipalId) -> StoreResult<&mut Principal> {
        self.principals
            .get_mut(&id)
            .ok_or(StoreError::PrincipalNotFound { id })
    }

    fn remove_keywords(&mut self, website: WebsiteId) {
        if let Some(old) = self.website_keywords.remove(&website) {
            for token in old {
                if let Some(set) = self.keyword_index.get_mut(&token) {
                    set.remove(&website);
                    if set.is_empty() {
                        self.keyword_index.remove(&token);
                    }
                }
            }
        }
    }
}

/// Returns `now`, or the smallest instant after `previous` when the clock lags.
fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + TimeDelta::microseconds(1)
    }
}

/// In-process [`DirectoryStore`]; every mutation runs under a single write lock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn website_count(&self) -> usize {
        self.inner.read().websites.len()
    }

    pub fn total_verifications(&self) -> usize {
        self.inner.read().verifications.len()
    }

    /// All websites in id order.
    pub fn websites(&self) -> Vec<Website> {
        self.inner.read().websites.values().cloned().collect()
    }

    /// Replaces the store contents with a snapshot written by
    /// [`save_snapshot`](Self::save_snapshot).
    pub async fn load_snapshot(&self, path: &Path) -> StoreResult<SnapshotLoad> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No snapshot to load");
                return Ok(SnapshotLoad::NotFound);
            }
            Err(source) => {
                return Err(StoreError::SnapshotIo {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let mut loaded: Inner = serde_json::from_slice(&bytes)?;
        loaded.rebuild_indexes();

        let outcome = SnapshotLoad::Loaded {
            websites: loaded.websites.len(),
            verifications: loaded.verifications.len(),
        };
        *self.inner.write() = loaded;

        info!(path = %path.display(), ?outcome, "Snapshot loaded");
        Ok(outcome)
    }

    /// Writes the store contents as JSON (via a temp file and rename). Returns bytes written.
    pub async fn save_snapshot(&self, path: &Path) -> StoreResult<u64> {
        let bytes = {
            let inner = self.inner.read();
            serde_json::to_vec(&*inner)?
        };

        let io_err = |source: std::io::Error| StoreError::SnapshotIo {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;

        info!(path = %path.display(), bytes = bytes.len(), "Snapshot saved");
        Ok(bytes.len() as u64)
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn insert_website(&self, new: NewWebsite) -> StoreResult<Website> {
        let mut inner = self.inner.write();
        if inner.domains.contains_key(&new.domain) {
            return Err(StoreError::DuplicateDomain { domain: new.domain });
        }

        inner.next_website_id += 1;
        let id = WebsiteId(inner.next_website_id);
        let now = Utc::now();
        let website = Website {
            id,
            domain: new.domain,
            name: new.name,
            description: new.description,
            entry_point: new.entry_point,
            submitted_by: new.submitted_by,
            is_my_website: new.is_my_website,
            criteria: CriteriaSet::empty(),
            verified: false,
            trusted_verification: None,
            created_at: now,
            updated_at: now,
        };

        inner.domains.insert(website.domain.clone(), id);
        inner.websites.insert(id, website.clone());
        Ok(website)
    }

    async fn get_website(&self, id: WebsiteId) -> StoreResult<Option<Website>> {
        Ok(self.inner.read().websites.get(&id).cloned())
    }

    async fn find_website(&self, domain: &str) -> StoreResult<Option<Website>> {
        let inner = self.inner.read();
        Ok(inner
            .domains
            .get(domain)
            .and_then(|id| inner.websites.get(id))
            .cloned())
    }

    async fn get_websites(&self, ids: &[WebsiteId]) -> StoreResult<Vec<Website>> {
        let inner = self.inner.read();
        Ok(ids
            .iter()
            .filter_map(|id| inner.websites.get(id).cloned())
            .collect())
    }

    async fn delete_website(&self, id: WebsiteId) -> StoreResult<bool> {
        let mut inner = self.inner.write();
        let Some(website) = inner.websites.remove(&id) else {
            return Ok(false);
        };
        inner.domains.remove(&website.domain);
        inner.verifications.retain(|_, v| v.website_id != id);
        inner.by_pair.retain(|(w, _), _| *w != id);
        inner.remove_keywords(id);
        Ok(true)
    }

    async fn save_consensus(&self, id: WebsiteId, consensus: Consensus) -> StoreResult<Website> {
        let mut inner = self.inner.write();
        let website = inner
            .websites
            .get_mut(&id)
            .ok_or(StoreError::WebsiteNotFound { id })?;

        website.criteria = consensus.criteria;
        website.verified = consensus.verified;
        website.trusted_verification = consensus.trusted_verification;
        website.updated_at = advance(website.updated_at);
        Ok(website.clone())
    }

    async fn record_verification(
        &self,
        record: VerificationRecord,
    ) -> StoreResult<RecordedVerification> {
        let mut inner = self.inner.write();
        if !inner.websites.contains_key(&record.website_id) {
            return Err(StoreError::WebsiteNotFound {
                id: record.website_id,
            });
        }
        if !inner.principals.contains_key(&record.verifier) {
            return Err(StoreError::PrincipalNotFound {
                id: record.verifier,
            });
        }

        let key = (record.website_id, record.verifier);
        let existing = inner
            .by_pair
            .get(&key)
            .copied()
            .and_then(|id| inner.verifications.get(&id).map(|v| v.id));

        let (verification, created) = match existing {
            Some(id) => {
                let Some(v) = inner.verifications.get_mut(&id) else {
                    return Err(StoreError::Unavailable {
                        reason: format!("verification index out of sync for {id}"),
                    });
                };
                v.criteria = record.criteria;
                v.is_trusted = record.is_trusted;
                v.counted = false;
                v.revision += 1;
                v.updated_at = advance(v.updated_at);
                (v.clone(), false)
            }
            None => {
                let now = Utc::now();
                let v = Verification {
                    id: VerificationId::new_v4(),
                    website_id: record.website_id,
                    verifier: record.verifier,
                    criteria: record.criteria,
                    is_trusted: record.is_trusted,
                    counted: false,
                    revision: 1,
                    created_at: now,
                    updated_at: now,
                };
                inner.by_pair.insert(key, v.id);
                inner.verifications.insert(v.id, v.clone());
                (v, true)
            }
        };

        let principal = inner.principal_mut(record.verifier)?;
        if created {
            principal.search_queries_remaining += record.reward_on_create;
        }
        let quota_remaining = principal.search_queries_remaining;

        Ok(RecordedVerification {
            verification,
            created,
            quota_remaining,
        })
    }

    async fn verifications_for(&self, website: WebsiteId) -> StoreResult<Vec<Verification>> {
        Ok(self
            .inner
            .read()
            .verifications
            .values()
            .filter(|v| v.website_id == website)
            .cloned()
            .collect())
    }

    async fn verification_count(&self, website: WebsiteId) -> StoreResult<usize> {
        Ok(self.inner.read().verification_count(website))
    }

    async fn uncounted_verifications(&self) -> StoreResult<Vec<PendingVerification>> {
        Ok(self
            .inner
            .read()
            .verifications
            .values()
            .filter(|v| !v.counted)
            .map(PendingVerification::from)
            .collect())
    }

    async fn mark_counted(&self, pending: &[PendingVerification]) -> StoreResult<usize> {
        let mut inner = self.inner.write();
        let mut marked = 0;
        for p in pending {
            if let Some(v) = inner.verifications.get_mut(&p.id)
                && v.revision == p.revision
                && !v.counted
            {
                v.counted = true;
                marked += 1;
            }
        }
        Ok(marked)
    }

    async fn queue_candidates(
        &self,
        verifier: PrincipalId,
        max_verifications: usize,
    ) -> StoreResult<Vec<QueueCandidate>> {
        let inner = self.inner.read();
        let mut counts: HashMap<WebsiteId, usize> = HashMap::new();
        for v in inner.verifications.values() {
            *counts.entry(v.website_id).or_default() += 1;
        }

        Ok(inner
            .websites
            .values()
            .filter(|w| !w.verified)
            .filter(|w| !inner.by_pair.contains_key(&(w.id, verifier)))
            .filter_map(|w| {
                let count = counts.get(&w.id).copied().unwrap_or(0);
                (count < max_verifications).then(|| QueueCandidate {
                    website: w.clone(),
                    verification_count: count,
                })
            })
            .collect())
    }

    async fn replace_keywords(
        &self,
        website: WebsiteId,
        tokens: BTreeSet<String>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if !inner.websites.contains_key(&website) {
            return Err(StoreError::WebsiteNotFound { id: website });
        }
        inner.remove_keywords(website);
        for token in &tokens {
            inner
                .keyword_index
                .entry(token.clone())
                .or_default()
                .insert(website);
        }
        inner.website_keywords.insert(website, tokens);
        Ok(())
    }

    async fn keyword_overlap(
        &self,
        tokens: &BTreeSet<String>,
    ) -> StoreResult<HashMap<WebsiteId, usize>> {
        let inner = self.inner.read();
        let mut overlap: HashMap<WebsiteId, usize> = HashMap::new();
        for token in tokens {
            if let Some(websites) = inner.keyword_index.get(token) {
                for &id in websites {
                    *overlap.entry(id).or_default() += 1;
                }
            }
        }
        Ok(overlap)
    }

    async fn upsert_principal(&self, principal: Principal) -> StoreResult<()> {
        self.inner.write().principals.insert(principal.id, principal);
        Ok(())
    }

    async fn get_principal(&self, id: PrincipalId) -> StoreResult<Option<Principal>> {
        Ok(self.inner.read().principals.get(&id).cloned())
    }

    async fn quota_balance(&self, id: PrincipalId) -> StoreResult<i64> {
        self.inner
            .read()
            .principals
            .get(&id)
            .map(|p| p.search_queries_remaining)
            .ok_or(StoreError::PrincipalNotFound { id })
    }

    async fn try_debit_quota(&self, id: PrincipalId, amount: i64) -> StoreResult<i64> {
        let mut inner = self.inner.write();
        let principal = inner.principal_mut(id)?;
        let balance = principal.search_queries_remaining;
        if balance <= 0 || balance < amount {
            return Err(StoreError::InsufficientQuota { id, balance });
        }
        principal.search_queries_remaining = balance - amount;
        Ok(principal.search_queries_remaining)
    }

    async fn credit_quota(&self, id: PrincipalId, amount: i64) -> StoreResult<i64> {
        let mut inner = self.inner.write();
        let principal = inner.principal_mut(id)?;
        principal.search_queries_remaining += amount;
        Ok(principal.search_queries_remaining)
    }
}
