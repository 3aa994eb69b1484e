use qdrant_client::qdrant::ScoredPoint;
use qdrant_client::qdrant::point_id::PointIdOptions;

use crate::directory::WebsiteId;

/// A website embedding to upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct WebsitePoint {
    pub website_id: WebsiteId,
    /// L2-normalized embedding.
    pub vector: Vec<f32>,
    pub domain: String,
}

impl WebsitePoint {
    pub fn new(website_id: WebsiteId, vector: Vec<f32>, domain: impl Into<String>) -> Self {
        Self {
            website_id,
            vector,
            domain: domain.into(),
        }
    }
}

/// A website returned by similarity search. `score` is the cosine similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub website_id: WebsiteId,
    pub score: f32,
    pub domain: Option<String>,
}

impl SearchHit {
    pub fn from_scored_point(point: ScoredPoint) -> Option<Self> {
        let id = match point.id.and_then(|pid| pid.point_id_options) {
            Some(PointIdOptions::Num(n)) => n,
            _ => return None,
        };

        let domain = point
            .payload
            .get("domain")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Some(SearchHit {
            website_id: WebsiteId(id),
            score: point.score,
            domain,
        })
    }
}
