//! Scriptable embedding provider for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::constants::EMBEDDING_DIM;

use super::error::EmbeddingError;
use super::stub::StubEmbedder;
use super::{EmbeddingProvider, EmbeddingTask};

/// Returns scripted vectors by exact text, falling back to stub vectors.
#[derive(Default)]
pub struct MockEmbedder {
    vectors: RwLock<HashMap<String, Vec<f32>>>,
    failing: AtomicBool,
    delay: RwLock<Option<Duration>>,
    calls: AtomicUsize,
    fallback: StubEmbedder,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.set_vector(text, vector);
        self
    }

    pub fn set_vector(&self, text: impl Into<String>, vector: Vec<f32>) {
        self.vectors.write().insert(text.into(), vector);
    }

    /// Makes every call fail with [`EmbeddingError::Upstream`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Sleeps this long before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str, _task: EmbeddingTask) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmbeddingError::Upstream {
                status: 503,
                body: "mock embedder failure".to_string(),
            });
        }

        let scripted = self.vectors.read().get(text).cloned();
        Ok(scripted.unwrap_or_else(|| self.fallback.vector_for(text)))
    }
}

/// Unit vector whose cosine similarity with basis vector `e0` is `similarity`.
///
/// `axis` (1..dim) picks the orthogonal component, so vectors built with
/// different axes are distinguishable from each other.
pub fn unit_vector_with_similarity(similarity: f32, axis: usize) -> Vec<f32> {
    let mut vector = vec![0.0; EMBEDDING_DIM];
    vector[0] = similarity;
    let axis = axis.clamp(1, EMBEDDING_DIM - 1);
    vector[axis] = (1.0 - similarity * similarity).max(0.0).sqrt();
    vector
}
