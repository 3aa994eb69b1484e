use serde::Serialize;

use crate::constants::SEARCH_DESCRIPTION_CHARS;
use crate::criteria::CriteriaSet;
use crate::directory::Website;

/// One row of a search response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub domain: String,
    pub name: String,
    /// First 200 characters of the description.
    pub description: String,
    pub level: u8,
    pub verified: bool,
    pub verification_count: usize,
    pub criteria: CriteriaSet,
    /// Cosine similarity to the query (semantic search only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    /// Composite ranking score (semantic search only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
}

impl SearchResult {
    /// Unscored row, as returned by keyword search.
    pub fn from_website(website: &Website, verification_count: usize) -> Self {
        Self {
            domain: website.domain.clone(),
            name: website.name.clone(),
            description: website
                .description
                .chars()
                .take(SEARCH_DESCRIPTION_CHARS)
                .collect(),
            level: website.level(),
            verified: website.verified,
            verification_count,
            criteria: website.criteria,
            similarity_score: None,
            relevance_score: None,
        }
    }

    /// Attaches scores, rounded to four decimals.
    pub fn with_scores(mut self, similarity: f64, relevance: f64) -> Self {
        self.similarity_score = Some(round4(similarity));
        self.relevance_score = Some(round4(relevance));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// The query as received.
    pub query: String,
    pub search_queries_remaining: i64,
}

#[inline]
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
