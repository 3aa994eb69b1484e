use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::constants::{
    KEYWORD_BROWSE_LIMIT, MIN_SEMANTIC_SIMILARITY, SEARCH_RESULT_LIMIT, SEMANTIC_CANDIDATE_LIMIT,
};
use crate::directory::{Principal, PrincipalId, Website, WebsiteId};
use crate::embedding::{EmbeddingProvider, EmbeddingTask, embed_normalized};
use crate::error::{DirectoryError, DirectoryResult};
use crate::store::DirectoryStore;
use crate::vectordb::{DEFAULT_COLLECTION_NAME, VectorDbClient};

use super::fusion::{FusionInput, fuse};
use super::keywords::tokenize_query;
use super::types::{SearchResponse, SearchResult};

/// Quota units one charged search costs.
const SEARCH_COST: i64 = 1;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub collection: String,
    pub embed_timeout: Duration,
    /// Charge keyword-only searches like semantic ones.
    pub charge_keyword_search: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION_NAME.to_string(),
            embed_timeout: Duration::from_secs(10),
            charge_keyword_search: false,
        }
    }
}

/// Semantic, keyword and browse search over the directory.
pub struct SearchRanker<V: VectorDbClient> {
    store: Arc<dyn DirectoryStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    vectors: Arc<V>,
    options: SearchOptions,
}

impl<V: VectorDbClient> SearchRanker<V> {
    pub fn new(
        store: Arc<dyn DirectoryStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        vectors: Arc<V>,
        options: SearchOptions,
    ) -> Self {
        Self {
            store,
            embedder,
            vectors,
            options,
        }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Hybrid search: embedding similarity fused with keyword overlap, level and
    /// trust. Costs one quota unit, refunded if the search fails after the debit.
    #[instrument(skip(self, principal), fields(principal = ?principal.map(|p| p.id)))]
    pub async fn semantic_search(
        &self,
        query: &str,
        principal: Option<&Principal>,
    ) -> DirectoryResult<SearchResponse> {
        let principal = principal.ok_or(DirectoryError::Unauthenticated)?;
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(DirectoryError::invalid("query_text is required"));
        }

        let remaining = self.store.try_debit_quota(principal.id, SEARCH_COST).await?;
        let results = match self.rank_semantic(trimmed).await {
            Ok(results) => results,
            Err(e) => {
                self.refund(principal.id).await;
                return Err(e);
            }
        };

        info!(
            results = results.len(),
            remaining,
            "Semantic search complete"
        );
        Ok(SearchResponse {
            results,
            query: query.to_string(),
            search_queries_remaining: remaining,
        })
    }

    /// Keyword-overlap search, unscored. Free unless configured otherwise.
    #[instrument(skip(self, principal), fields(principal = ?principal.map(|p| p.id)))]
    pub async fn keyword_search(
        &self,
        query: &str,
        principal: Option<&Principal>,
    ) -> DirectoryResult<SearchResponse> {
        let principal = principal.ok_or(DirectoryError::Unauthenticated)?;
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(DirectoryError::invalid("query_text is required"));
        }

        // Nothing left after tokenization can never match, so it is not charged.
        let tokens = tokenize_query(trimmed);
        let charged = self.options.charge_keyword_search && !tokens.is_empty();
        let remaining = if charged {
            self.store.try_debit_quota(principal.id, SEARCH_COST).await?
        } else {
            self.store.quota_balance(principal.id).await?
        };

        let results = match self.rank_keywords(&tokens, SEARCH_RESULT_LIMIT).await {
            Ok(results) => results,
            Err(e) => {
                if charged {
                    self.refund(principal.id).await;
                }
                return Err(e);
            }
        };

        Ok(SearchResponse {
            results,
            query: query.to_string(),
            search_queries_remaining: remaining,
        })
    }

    /// Keyword search for anonymous browsing: up to 20 rows, never charged.
    pub async fn browse(&self, query: &str) -> DirectoryResult<Vec<SearchResult>> {
        self.rank_keywords(&tokenize_query(query), KEYWORD_BROWSE_LIMIT)
            .await
    }

    async fn rank_semantic(&self, query: &str) -> DirectoryResult<Vec<SearchResult>> {
        let embedding = embed_normalized(
            self.embedder.as_ref(),
            query,
            EmbeddingTask::Query,
            self.options.embed_timeout,
        )
        .await
        .inspect_err(|e| warn!(error = %e, "Query embedding failed"))?;

        let hits = self
            .vectors
            .search(
                &self.options.collection,
                embedding,
                SEMANTIC_CANDIDATE_LIMIT as u64,
                Some(MIN_SEMANTIC_SIMILARITY),
            )
            .await?;

        if hits.is_empty() {
            debug!("No semantic candidates above threshold");
            return Ok(Vec::new());
        }

        let tokens = tokenize_query(query);
        let overlap = self.overlap(&tokens).await?;

        let ids: Vec<WebsiteId> = hits.iter().map(|h| h.website_id).collect();
        let loaded = self.load(&ids).await?;

        let candidates: Vec<FusionInput> = hits
            .iter()
            .filter_map(|hit| {
                let (website, _) = loaded.get(&hit.website_id)?;
                Some(FusionInput {
                    website_id: hit.website_id,
                    similarity: f64::from(hit.score),
                    keyword_overlap: overlap.get(&hit.website_id).copied().unwrap_or(0),
                    level: website.level(),
                    trusted: website.has_trusted_verification(),
                })
            })
            .collect();

        debug!(
            candidates = candidates.len(),
            tokens = tokens.len(),
            "Fusing semantic candidates"
        );

        Ok(fuse(&candidates, SEARCH_RESULT_LIMIT)
            .into_iter()
            .filter_map(|fused| {
                let (website, count) = loaded.get(&fused.input.website_id)?;
                Some(
                    SearchResult::from_website(website, *count)
                        .with_scores(fused.input.similarity, fused.relevance),
                )
            })
            .collect())
    }

    async fn rank_keywords(
        &self,
        tokens: &BTreeSet<String>,
        limit: usize,
    ) -> DirectoryResult<Vec<SearchResult>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut ranked: Vec<(WebsiteId, usize)> =
            self.overlap(tokens).await?.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit);

        let ids: Vec<WebsiteId> = ranked.iter().map(|(id, _)| *id).collect();
        let loaded = self.load(&ids).await?;

        Ok(ids
            .iter()
            .filter_map(|id| {
                let (website, count) = loaded.get(id)?;
                Some(SearchResult::from_website(website, *count))
            })
            .collect())
    }

    async fn overlap(
        &self,
        tokens: &BTreeSet<String>,
    ) -> DirectoryResult<HashMap<WebsiteId, usize>> {
        if tokens.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(self.store.keyword_overlap(tokens).await?)
    }

    /// Loads websites and their verification counts concurrently. Websites deleted
    /// since indexing are left out.
    async fn load(
        &self,
        ids: &[WebsiteId],
    ) -> DirectoryResult<HashMap<WebsiteId, (Website, usize)>> {
        let lookups = ids.iter().map(|&id| async move {
            let website = self.store.get_website(id).await?;
            let count = self.store.verification_count(id).await?;
            Ok::<_, DirectoryError>(website.map(|w| (id, (w, count))))
        });

        let mut loaded = HashMap::with_capacity(ids.len());
        for result in join_all(lookups).await {
            if let Some((id, entry)) = result? {
                loaded.insert(id, entry);
            }
        }
        Ok(loaded)
    }

    async fn refund(&self, principal: PrincipalId) {
        match self.store.credit_quota(principal, SEARCH_COST).await {
            Ok(balance) => debug!(%principal, balance, "Search quota refunded"),
            Err(e) => warn!(%principal, error = %e, "Failed to refund search quota"),
        }
    }
}
