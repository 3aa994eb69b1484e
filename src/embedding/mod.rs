//! Text embedding providers.
//!
//! The embedding backend is an external service; the core only depends on
//! [`EmbeddingProvider`] and always normalizes results itself through
//! [`embed_normalized`].
//!
//! - [`HttpEmbedder`] calls a Gemini-compatible `embedContent` endpoint.
//! - [`StubEmbedder`] produces deterministic vectors without a backend.
//! - [`CachedEmbedder`] memoizes query embeddings in memory.

pub mod cache;
mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod stub;

#[cfg(test)]
mod tests;

pub use cache::CachedEmbedder;
pub use error::EmbeddingError;
pub use http::{EmbedderConfig, HttpEmbedder};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockEmbedder, unit_vector_with_similarity};
pub use stub::StubEmbedder;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::constants::{EMBEDDING_DIM, validate_embedding_dim};

/// What the embedded text will be used for; providers may embed differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmbeddingTask {
    /// Search query text.
    Query,
    /// Website text being indexed.
    Document,
}

impl EmbeddingTask {
    /// Gemini `taskType` value.
    pub fn as_api_str(self) -> &'static str {
        match self {
            EmbeddingTask::Query => "RETRIEVAL_QUERY",
            EmbeddingTask::Document => "RETRIEVAL_DOCUMENT",
        }
    }
}

/// Source of fixed-dimension text embeddings.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds `text`. The result need not be normalized.
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>, EmbeddingError>;

    /// Output dimension.
    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    /// Returns `true` for providers that do not produce meaningful vectors.
    fn is_stub(&self) -> bool {
        false
    }
}

/// Scales `vector` to unit length in place. Zero vectors are left unchanged.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Embeds `text` within `timeout`, checks the dimension and L2-normalizes.
///
/// A timeout is reported as [`EmbeddingError::Timeout`]; the call is abandoned with
/// no side effects.
pub async fn embed_normalized(
    provider: &dyn EmbeddingProvider,
    text: &str,
    task: EmbeddingTask,
    timeout: Duration,
) -> Result<Vec<f32>, EmbeddingError> {
    let mut vector = match tokio::time::timeout(timeout, provider.embed(text, task)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(EmbeddingError::Timeout {
                after_ms: timeout.as_millis() as u64,
            });
        }
    };

    validate_embedding_dim(vector.len(), EMBEDDING_DIM).map_err(|_| {
        EmbeddingError::InvalidDimension {
            expected: EMBEDDING_DIM,
            actual: vector.len(),
        }
    })?;

    if vector.iter().all(|&x| x == 0.0) {
        return Err(EmbeddingError::InvalidResponse {
            reason: "embedding is all zeros".to_string(),
        });
    }

    l2_normalize(&mut vector);
    Ok(vector)
}
