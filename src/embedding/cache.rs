//! In-memory embedding cache.
//!
//! Keys are the BLAKE3 hash of the task tag and text, values the raw provider
//! output. Repeated searches for the same query skip the provider round trip.

use std::sync::Arc;

use async_trait::async_trait;
use moka::sync::Cache;
use tracing::debug;

use super::error::EmbeddingError;
use super::{EmbeddingProvider, EmbeddingTask};

/// Default number of cached embeddings.
pub const DEFAULT_EMBED_CACHE_CAPACITY: u64 = 10_000;

fn cache_key(text: &str, task: EmbeddingTask) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(task.as_api_str().as_bytes());
    hasher.update(&[0]);
    hasher.update(text.as_bytes());
    *hasher.finalize().as_bytes()
}

/// Memoizing wrapper around another [`EmbeddingProvider`]. Errors are not cached.
pub struct CachedEmbedder {
    inner: Arc<dyn EmbeddingProvider>,
    entries: Cache<[u8; 32], Arc<Vec<f32>>>,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_capacity(inner, DEFAULT_EMBED_CACHE_CAPACITY)
    }

    /// Creates a cache holding at most `capacity` embeddings.
    pub fn with_capacity(inner: Arc<dyn EmbeddingProvider>, capacity: u64) -> Self {
        Self {
            inner,
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flushes moka's pending bookkeeping so [`len`](Self::len) is exact.
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}

#[async_trait]
impl EmbeddingProvider for CachedEmbedder {
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>, EmbeddingError> {
        let key = cache_key(text, task);
        if let Some(hit) = self.entries.get(&key) {
            debug!(text_len = text.len(), "Embedding cache hit");
            return Ok(hit.as_ref().clone());
        }

        let vector = self.inner.embed(text, task).await?;
        self.entries.insert(key, Arc::new(vector.clone()));
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn is_stub(&self) -> bool {
        self.inner.is_stub()
    }
}
