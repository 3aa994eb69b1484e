//! Sifter directory library crate (used by the crunch worker and integration tests).
//!
//! # Public API Surface
//!
//! ## Directory
//! - [`Registry`] - website registration, detail and owner analytics
//! - [`Website`], [`Principal`], [`Verification`] - core records
//! - [`CriteriaSet`], [`compute_level`] - the 30-criterion level model
//!
//! ## Verification
//! - [`VerificationService`] - submit verifications, hand out the queue
//! - [`Aggregator`], [`AggregationScheduler`] - trust-weighted consensus batches
//!
//! ## Search
//! - [`SearchRanker`] - semantic, keyword and browse search
//! - [`EmbeddingIndexer`] - embeds newly registered websites
//!
//! ## Infrastructure
//! - [`DirectoryStore`], [`MemoryStore`] - persistence seam and in-memory store
//! - [`EmbeddingProvider`], [`HttpEmbedder`], [`CachedEmbedder`] - embeddings
//! - [`QdrantClient`], [`VectorDbClient`] - vector index
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod criteria;
pub mod directory;
pub mod embedding;
pub mod error;
pub mod search;
pub mod store;
pub mod vectordb;
pub mod verification;

pub use config::{Config, ConfigError};
pub use constants::{DimValidationError, validate_embedding_dim};
pub use criteria::{
    CriteriaError, CriteriaSet, CriterionId, LevelBreakdown, compute_level, level_breakdown,
};
pub use directory::{
    IndexingHook, Principal, PrincipalId, Registration, Registry, Verification, VerificationId,
    Website, WebsiteAnalytics, WebsiteDetail, WebsiteId, normalize_domain,
};
pub use embedding::{
    CachedEmbedder, EmbedderConfig, EmbeddingError, EmbeddingProvider, EmbeddingTask,
    HttpEmbedder, StubEmbedder,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::{MockEmbedder, unit_vector_with_similarity};
pub use error::{DirectoryError, DirectoryResult};
pub use search::{EmbeddingIndexer, SearchOptions, SearchRanker, SearchResponse, SearchResult};
pub use store::{DirectoryStore, MemoryStore, SnapshotLoad, StoreError, StoreResult};
pub use vectordb::{QdrantClient, VectorDbClient, VectorDbError};
#[cfg(any(test, feature = "mock"))]
pub use vectordb::MockVectorDbClient;
pub use verification::{
    AggregationReport, AggregationScheduler, Aggregator, VerificationService,
};
