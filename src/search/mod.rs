//! Directory search.
//!
//! - [`SearchRanker::semantic_search`] embeds the query, takes up to 30 websites
//!   with cosine similarity of at least 0.6 and re-ranks them with [`fusion`].
//! - [`SearchRanker::keyword_search`] and [`SearchRanker::browse`] rank by
//!   keyword tag overlap alone.
//! - [`EmbeddingIndexer`] keeps the vector index in step with the directory.

pub mod fusion;
pub mod indexer;
pub mod keywords;
pub mod ranker;
pub mod types;


pub use indexer::EmbeddingIndexer;
pub use keywords::{expand_tokens, normalize_token, tokenize_query};
pub use ranker::{SearchOptions, SearchRanker};
pub use types::{SearchResponse, SearchResult};
