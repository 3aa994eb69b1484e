use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::constants::EMBEDDING_DIM_U64;
use crate::directory::{IndexingHook, Website, WebsiteId};
use crate::embedding::{EmbeddingProvider, EmbeddingTask, embed_normalized};
use crate::error::DirectoryResult;
use crate::vectordb::{VectorDbClient, WebsitePoint, WriteConsistency};

/// Writes website document embeddings into the vector index.
pub struct EmbeddingIndexer<V: VectorDbClient> {
    embedder: Arc<dyn EmbeddingProvider>,
    vectors: Arc<V>,
    collection: String,
    timeout: Duration,
}

impl<V: VectorDbClient> EmbeddingIndexer<V> {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        vectors: Arc<V>,
        collection: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            vectors,
            collection: collection.into(),
            timeout,
        }
    }

    /// Creates the collection if it does not exist yet.
    pub async fn ensure_collection(&self) -> DirectoryResult<()> {
        self.vectors
            .ensure_collection(&self.collection, EMBEDDING_DIM_U64)
            .await?;
        Ok(())
    }

    /// Embeds `text` as a document and stores it as the website's vector.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn index_embedding(
        &self,
        website_id: WebsiteId,
        domain: &str,
        text: &str,
    ) -> DirectoryResult<()> {
        let vector =
            embed_normalized(self.embedder.as_ref(), text, EmbeddingTask::Document, self.timeout)
                .await?;

        self.vectors
            .upsert_points(
                &self.collection,
                vec![WebsitePoint::new(website_id, vector, domain)],
                WriteConsistency::Strong,
            )
            .await?;

        debug!(%website_id, domain, "Website embedding indexed");
        Ok(())
    }

    /// Re-embeds every website in `websites`. A failure is logged and skipped.
    /// Returns how many were indexed.
    pub async fn reindex(&self, websites: &[Website]) -> usize {
        let mut indexed = 0;
        for website in websites {
            match self
                .index_embedding(website.id, &website.domain, &website.embedding_text())
                .await
            {
                Ok(()) => indexed += 1,
                Err(e) => warn!(
                    website_id = %website.id,
                    domain = %website.domain,
                    "Reindex failed: {}",
                    e
                ),
            }
        }
        info!(indexed, total = websites.len(), "Reindex finished");
        indexed
    }

    /// Drops the website's vector.
    pub async fn remove(&self, website_id: WebsiteId) -> DirectoryResult<()> {
        self.vectors
            .delete_points(&self.collection, vec![website_id])
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<V: VectorDbClient + 'static> IndexingHook for EmbeddingIndexer<V> {
    async fn website_registered(&self, website: &Website) -> DirectoryResult<()> {
        self.index_embedding(website.id, &website.domain, &website.embedding_text())
            .await
    }
}
