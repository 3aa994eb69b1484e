//! Qdrant vector index of website embeddings.
//!
//! One point per website: point id is the [`WebsiteId`](crate::directory::WebsiteId),
//! the vector is the L2-normalized document embedding, and the payload carries the
//! domain for debugging. Distance is cosine.

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;


pub use client::{QdrantClient, VectorDbClient};
pub use error::VectorDbError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockVectorDbClient, cosine_similarity};
pub use model::{SearchHit, WebsitePoint};

pub const DEFAULT_COLLECTION_NAME: &str = "sifter_websites";

pub const DEFAULT_VECTOR_SIZE: u64 = crate::constants::EMBEDDING_DIM_U64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteConsistency {
    /// Wait until the write is indexed and searchable (`wait=true`).
    Strong,
    /// Return once the server acknowledges receipt (`wait=false`).
    Eventual,
}

impl From<WriteConsistency> for bool {
    fn from(c: WriteConsistency) -> bool {
        matches!(c, WriteConsistency::Strong)
    }
}
