//! Composite ranking of semantic candidates.

use std::cmp::Ordering;

use crate::constants::{
    MAX_LEVEL, WEIGHT_KEYWORD, WEIGHT_LEVEL, WEIGHT_SIMILARITY, WEIGHT_TRUST,
};
use crate::directory::WebsiteId;

/// Signals for one semantic candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionInput {
    pub website_id: WebsiteId,
    /// Cosine similarity to the query.
    pub similarity: f64,
    /// Distinct query tokens the website is tagged with.
    pub keyword_overlap: usize,
    pub level: u8,
    /// Website has a trusted verification on record.
    pub trusted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fused {
    pub input: FusionInput,
    pub keyword_norm: f64,
    pub relevance: f64,
}

/// `0.6·similarity + 0.25·keyword_norm + 0.1·level/5 + 0.05·trust`
///
/// ```
/// use sifter::search::fusion::composite_score;
///
/// let a = composite_score(0.9, 0.0, 5, true);
/// let b = composite_score(0.9, 1.0, 0, false);
/// assert!((a - 0.69).abs() < 1e-9);
/// assert!((b - 0.79).abs() < 1e-9);
/// ```
pub fn composite_score(similarity: f64, keyword_norm: f64, level: u8, trusted: bool) -> f64 {
    let level_norm = f64::from(level) / f64::from(MAX_LEVEL);
    let trust = if trusted { 1.0 } else { 0.0 };
    WEIGHT_SIMILARITY * similarity
        + WEIGHT_KEYWORD * keyword_norm
        + WEIGHT_LEVEL * level_norm
        + WEIGHT_TRUST * trust
}

/// Scores `candidates` and returns the best `limit`, highest relevance first.
///
/// Keyword overlap is normalized by the largest overlap among the candidates;
/// when none of them match a keyword the term contributes zero. Equal scores
/// are ordered by website id.
pub fn fuse(candidates: &[FusionInput], limit: usize) -> Vec<Fused> {
    let max_overlap = candidates
        .iter()
        .map(|c| c.keyword_overlap)
        .max()
        .unwrap_or(0);

    let mut fused: Vec<Fused> = candidates
        .iter()
        .map(|&input| {
            let keyword_norm = if max_overlap == 0 {
                0.0
            } else {
                input.keyword_overlap as f64 / max_overlap as f64
            };
            Fused {
                input,
                keyword_norm,
                relevance: composite_score(
                    input.similarity,
                    keyword_norm,
                    input.level,
                    input.trusted,
                ),
            }
        })
        .collect();

    fused.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(Ordering::Equal)
            .then(a.input.website_id.cmp(&b.input.website_id))
    });
    fused.truncate(limit);
    fused
}
