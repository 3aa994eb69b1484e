use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("embedding provider returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("embedding request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("invalid embedding response: {reason}")]
    InvalidResponse { reason: String },

    #[error("invalid embedding dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("embedding API key not configured (set SIFTER_EMBEDDING_API_KEY)")]
    MissingApiKey,
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EmbeddingError::Timeout { after_ms: 0 }
        } else {
            EmbeddingError::RequestFailed {
                reason: err.to_string(),
            }
        }
    }
}
