//! Cross-cutting, shared constants.
//!
//! The scoring and ranking numbers here are part of the directory's contract with
//! callers (level thresholds, consensus weights, fusion weights). They are fixed at
//! compile time; only operational knobs live in [`crate::config::Config`].
//!
//! # Dimension Invariants
//!
//! Website and query embeddings must agree on [`EMBEDDING_DIM`]. Use
//! [`validate_embedding_dim`] at module boundaries (provider output, vector index
//! upserts) to catch mismatches early.

/// Dimension of every website and query embedding.
pub const EMBEDDING_DIM: usize = 768;

pub const EMBEDDING_DIM_U64: u64 = EMBEDDING_DIM as u64;

/// Number of criteria in each level.
pub const CRITERIA_PER_LEVEL: usize = 6;

/// Number of levels.
pub const LEVEL_COUNT: usize = 5;

pub const CRITERIA_COUNT: usize = CRITERIA_PER_LEVEL * LEVEL_COUNT;

/// A level is attained when at least this many of its criteria are true.
pub const LEVEL_PASS_THRESHOLD: usize = 4;

pub const MAX_LEVEL: u8 = LEVEL_COUNT as u8;

/// Consensus weight of a verification from a trusted verifier.
pub const TRUSTED_WEIGHT: u64 = 100;

/// Consensus weight of a regular verification.
pub const UNTRUSTED_WEIGHT: u64 = 1;

/// Verification count at which a website becomes verified without a trusted vote.
pub const VERIFIED_COUNT_THRESHOLD: usize = 12;

/// Search queries credited for a verifier's first verification of a website.
pub const VERIFICATION_REWARD: i64 = 10;

/// Starting balance for a newly created principal.
pub const DEFAULT_SEARCH_QUOTA: i64 = 10;

/// Max entries returned by the verification queue.
pub const QUEUE_LIMIT: usize = 10;

/// Max results returned by any public search call.
pub const SEARCH_RESULT_LIMIT: usize = 10;

/// Max results returned by the internal, unmetered browse variant.
pub const KEYWORD_BROWSE_LIMIT: usize = 20;

/// Semantic candidates considered before fusion.
pub const SEMANTIC_CANDIDATE_LIMIT: usize = 30;

/// Minimum cosine similarity for a semantic candidate.
pub const MIN_SEMANTIC_SIMILARITY: f32 = 0.6;

/// Keyword tokens shorter than this (after normalization) are discarded.
pub const MIN_TOKEN_LEN: usize = 2;

pub const WEIGHT_SIMILARITY: f64 = 0.6;
pub const WEIGHT_KEYWORD: f64 = 0.25;
pub const WEIGHT_LEVEL: f64 = 0.1;
pub const WEIGHT_TRUST: f64 = 0.05;

/// Search rows carry at most this many characters of description.
pub const SEARCH_DESCRIPTION_CHARS: usize = 200;

/// Error returned when dimension validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Embedding was empty.
    Empty,
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "embedding is empty"),
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a runtime embedding dimension matches the expected dimension.
///
/// # Example
///
/// ```
/// use sifter::constants::{validate_embedding_dim, EMBEDDING_DIM};
///
/// validate_embedding_dim(768, EMBEDDING_DIM).unwrap();
/// assert!(validate_embedding_dim(1536, EMBEDDING_DIM).is_err());
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if actual == 0 {
        return Err(DimValidationError::Empty);
    }
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
