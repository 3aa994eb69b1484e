use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, PointStruct, PointsIdsList,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use std::collections::HashMap;
use tracing::debug;

use super::error::VectorDbError;
use super::model::{SearchHit, WebsitePoint};
use crate::directory::WebsiteId;
use crate::vectordb::WriteConsistency;

/// gRPC client for the website embedding collection.
///
/// Every call maps the transport error into the matching [`VectorDbError`]
/// variant, keyed by collection name.
#[derive(Clone)]
pub struct QdrantClient {
    client: Qdrant,
    url: String,
}

impl QdrantClient {
    /// Builds a client for `url`. No request is sent until the first call.
    pub fn new(url: &str) -> Result<Self, VectorDbError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| VectorDbError::ConnectionFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Fails with [`VectorDbError::ConnectionFailed`] when Qdrant does not answer.
    pub async fn health_check(&self) -> Result<(), VectorDbError> {
        match self.client.health_check().await {
            Ok(reply) => {
                debug!(url = %self.url, version = %reply.version, "Qdrant reachable");
                Ok(())
            }
            Err(e) => Err(VectorDbError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            }),
        }
    }

    pub async fn create_collection(
        &self,
        name: &str,
        vector_size: u64,
    ) -> Result<(), VectorDbError> {
        let request = CreateCollectionBuilder::new(name)
            .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine));

        self.client
            .create_collection(request)
            .await
            .map_err(|e| create_failed(name, e))?;
        Ok(())
    }

    /// Creates the collection unless it already exists.
    pub async fn ensure_collection(
        &self,
        name: &str,
        vector_size: u64,
    ) -> Result<(), VectorDbError> {
        let exists = self
            .client
            .collection_exists(name)
            .await
            .map_err(|e| create_failed(name, e))?;

        if exists {
            return Ok(());
        }
        debug!(collection = name, vector_size, "Creating collection");
        self.create_collection(name, vector_size).await
    }

    /// Upserts website embeddings with the domain as payload.
    pub async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<WebsitePoint>,
        consistency: WriteConsistency,
    ) -> Result<(), VectorDbError> {
        if points.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = points.into_iter().map(to_point_struct).collect();
        let request = UpsertPointsBuilder::new(collection, points).wait(consistency.into());

        self.client
            .upsert_points(request)
            .await
            .map_err(|e| VectorDbError::UpsertFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Returns up to `limit` websites by descending cosine similarity, dropping
    /// those below `min_score`.
    pub async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
        min_score: Option<f32>,
    ) -> Result<Vec<SearchHit>, VectorDbError> {
        let mut request = SearchPointsBuilder::new(collection, query, limit).with_payload(true);
        if let Some(threshold) = min_score {
            request = request.score_threshold(threshold);
        }

        let response = self.client.search_points(request).await.map_err(|e| {
            VectorDbError::SearchFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(response
            .result
            .into_iter()
            .filter_map(SearchHit::from_scored_point)
            .collect())
    }

    pub async fn delete_points(
        &self,
        collection: &str,
        ids: Vec<WebsiteId>,
    ) -> Result<(), VectorDbError> {
        if ids.is_empty() {
            return Ok(());
        }

        let selector = PointsIdsList {
            ids: ids.into_iter().map(|id| id.0.into()).collect(),
        };
        let request = DeletePointsBuilder::new(collection)
            .points(selector)
            .wait(true);

        self.client
            .delete_points(request)
            .await
            .map_err(|e| VectorDbError::DeleteFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}

fn create_failed(collection: &str, e: impl std::fmt::Display) -> VectorDbError {
    VectorDbError::CreateCollectionFailed {
        collection: collection.to_string(),
        message: e.to_string(),
    }
}

fn to_point_struct(point: WebsitePoint) -> PointStruct {
    let payload: HashMap<String, qdrant_client::qdrant::Value> =
        HashMap::from([("domain".to_string(), point.domain.into())]);
    PointStruct::new(point.website_id.0, point.vector, payload)
}

/// Minimal async interface used by higher-level code.
pub trait VectorDbClient: Send + Sync {
    /// Ensures a collection exists.
    fn ensure_collection(
        &self,
        name: &str,
        vector_size: u64,
    ) -> impl std::future::Future<Output = Result<(), VectorDbError>> + Send;

    /// Upserts website embeddings, replacing existing points with the same id.
    fn upsert_points(
        &self,
        collection: &str,
        points: Vec<WebsitePoint>,
        consistency: WriteConsistency,
    ) -> impl std::future::Future<Output = Result<(), VectorDbError>> + Send;

    /// Cosine similarity search, best first.
    fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
        min_score: Option<f32>,
    ) -> impl std::future::Future<Output = Result<Vec<SearchHit>, VectorDbError>> + Send;

    /// Deletes website embeddings.
    fn delete_points(
        &self,
        collection: &str,
        ids: Vec<WebsiteId>,
    ) -> impl std::future::Future<Output = Result<(), VectorDbError>> + Send;
}

impl VectorDbClient for QdrantClient {
    async fn ensure_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorDbError> {
        self.ensure_collection(name, vector_size).await
    }

    async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<WebsitePoint>,
        consistency: WriteConsistency,
    ) -> Result<(), VectorDbError> {
        self.upsert_points(collection, points, consistency).await
    }

    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
        min_score: Option<f32>,
    ) -> Result<Vec<SearchHit>, VectorDbError> {
        self.search(collection, query, limit, min_score).await
    }

    async fn delete_points(
        &self,
        collection: &str,
        ids: Vec<WebsiteId>,
    ) -> Result<(), VectorDbError> {
        self.delete_points(collection, ids).await
    }
}
