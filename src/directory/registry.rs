use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::criteria::{LevelBreakdown, level_breakdown};
use crate::error::{DirectoryError, DirectoryResult};
use crate::search::keywords::expand_tokens;
use crate::store::DirectoryStore;

use super::domain::normalize_domain;
use super::model::{NewWebsite, Principal, Website, WebsiteId};

/// Background work triggered by a new registration (embedding, keyword tagging).
#[async_trait]
pub trait IndexingHook: Send + Sync {
    async fn website_registered(&self, website: &Website) -> DirectoryResult<()>;
}

/// Submission to [`Registry::register`].
#[derive(Debug, Clone, Default)]
pub struct Registration {
    /// URL or bare host; normalized to the directory domain.
    pub url: String,
    pub name: String,
    pub description: String,
    pub entry_point: Option<String>,
    pub is_my_website: bool,
}

/// A website as shown publicly, with derived fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebsiteDetail {
    #[serde(flatten)]
    pub website: Website,
    pub level: u8,
    pub verification_count: usize,
}

/// Owner-only statistics for a website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebsiteAnalytics {
    pub domain: String,
    pub level: u8,
    pub verified: bool,
    pub verification_count: usize,
    pub trusted_verification_count: usize,
    pub breakdown: LevelBreakdown,
}

/// Website registration and read access.
pub struct Registry {
    store: Arc<dyn DirectoryStore>,
    hook: Option<Arc<dyn IndexingHook>>,
}

impl Registry {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store, hook: None }
    }

    pub fn with_hook(mut self, hook: Arc<dyn IndexingHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Registers a website with all-false criteria.
    ///
    /// The indexing hook runs after the insert; its failures are logged and the
    /// registration still succeeds.
    #[instrument(skip(self, registration, submitter), fields(url = %registration.url))]
    pub async fn register(
        &self,
        registration: Registration,
        submitter: Option<&Principal>,
    ) -> DirectoryResult<Website> {
        let submitter = submitter.ok_or(DirectoryError::Unauthenticated)?;
        if registration.url.trim().is_empty() {
            return Err(DirectoryError::invalid("url is required"));
        }
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(DirectoryError::invalid("name is required"));
        }
        let domain = normalize_domain(&registration.url)
            .ok_or_else(|| DirectoryError::invalid("url has no domain"))?;

        let website = self
            .store
            .insert_website(NewWebsite {
                domain,
                name: name.to_string(),
                description: registration.description.trim().to_string(),
                entry_point: registration.entry_point.filter(|e| !e.trim().is_empty()),
                submitted_by: Some(submitter.id),
                is_my_website: registration.is_my_website,
            })
            .await?;

        info!(website_id = %website.id, domain = %website.domain, "Website registered");

        if let Some(hook) = &self.hook
            && let Err(e) = hook.website_registered(&website).await
        {
            warn!(domain = %website.domain, error = %e, "Indexing hook failed");
        }

        Ok(website)
    }

    pub async fn detail(&self, domain: &str) -> DirectoryResult<WebsiteDetail> {
        let website = self.find(domain).await?;
        let verification_count = self.store.verification_count(website.id).await?;
        Ok(WebsiteDetail {
            level: website.level(),
            verification_count,
            website,
        })
    }

    /// Statistics for the website's submitter, when they registered it as their own.
    pub async fn analytics(
        &self,
        domain: &str,
        principal: Option<&Principal>,
    ) -> DirectoryResult<WebsiteAnalytics> {
        let principal = principal.ok_or(DirectoryError::Unauthenticated)?;
        let website = self.find(domain).await?;

        if !website.is_my_website || website.submitted_by != Some(principal.id) {
            return Err(DirectoryError::Forbidden {
                reason: "analytics are only available to the website owner".to_string(),
            });
        }

        let verifications = self.store.verifications_for(website.id).await?;
        Ok(WebsiteAnalytics {
            level: website.level(),
            verified: website.verified,
            verification_count: verifications.len(),
            trusted_verification_count: verifications.iter().filter(|v| v.is_trusted).count(),
            breakdown: level_breakdown(&website.criteria),
            domain: website.domain,
        })
    }

    /// Replaces the website's keyword tags with the normalized, expanded `raw_tokens`.
    /// Returns the stored tags.
    pub async fn index_keywords<I, S>(
        &self,
        website: WebsiteId,
        raw_tokens: I,
    ) -> DirectoryResult<BTreeSet<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = expand_tokens(raw_tokens);
        debug!(website_id = %website, tokens = tokens.len(), "Indexing keywords");
        self.store.replace_keywords(website, tokens.clone()).await?;
        Ok(tokens)
    }

    async fn find(&self, domain: &str) -> DirectoryResult<Website> {
        let domain =
            normalize_domain(domain).ok_or_else(|| DirectoryError::invalid("invalid domain"))?;
        self.store
            .find_website(&domain)
            .await?
            .ok_or_else(|| DirectoryError::not_found(format!("website {domain}")))
    }
}
