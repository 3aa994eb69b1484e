//! Caller-facing error taxonomy for directory operations.

use thiserror::Error;

use crate::criteria::CriteriaError;
use crate::embedding::EmbeddingError;
use crate::store::StoreError;
use crate::vectordb::VectorDbError;

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No resolvable verifier or caller.
    #[error("authentication required")]
    Unauthenticated,

    /// Missing or malformed input; nothing was changed.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("{what} not found")]
    NotFound { what: String },

    /// Caller understood but has no search quota left.
    #[error("no search queries remaining; verify websites to earn more")]
    QuotaExhausted,

    /// Embedding provider failed or timed out. Retryable; quota is not consumed.
    #[error("upstream temporarily unavailable: {reason}")]
    TransientUpstream { reason: String },

    #[error("website already exists: {domain}")]
    AlreadyExists { domain: String },

    /// Authenticated, but not allowed to see this resource.
    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("vector index error: {0}")]
    VectorDb(#[from] VectorDbError),
}

impl DirectoryError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Only upstream failures are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientUpstream { .. })
    }

    /// HTTP-equivalent status for the external HTTP layer.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::InvalidInput { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::QuotaExhausted => 402,
            Self::TransientUpstream { .. } => 503,
            Self::AlreadyExists { .. } => 409,
            Self::Forbidden { .. } => 403,
            Self::Store(_) | Self::VectorDb(_) => 500,
        }
    }
}

impl From<StoreError> for DirectoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InsufficientQuota { .. } => Self::QuotaExhausted,
            StoreError::DuplicateDomain { domain } => Self::AlreadyExists { domain },
            StoreError::WebsiteNotFound { id } => Self::NotFound {
                what: format!("website {id}"),
            },
            StoreError::PrincipalNotFound { .. } => Self::Unauthenticated,
            other => Self::Store(other),
        }
    }
}

impl From<CriteriaError> for DirectoryError {
    fn from(err: CriteriaError) -> Self {
        Self::InvalidInput {
            reason: err.to_string(),
        }
    }
}

impl From<EmbeddingError> for DirectoryError {
    fn from(err: EmbeddingError) -> Self {
        Self::TransientUpstream {
            reason: err.to_string(),
        }
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;
