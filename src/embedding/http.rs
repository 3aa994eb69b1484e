use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::EMBEDDING_DIM;

use super::error::EmbeddingError;
use super::{EmbeddingProvider, EmbeddingTask};

/// Default Gemini API base URL.
pub const DEFAULT_EMBEDDING_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "gemini-embedding-001";

/// Default per-request timeout.
pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for [`HttpEmbedder`].
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    /// API base URL (without the `/models/...` suffix).
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Requested output dimensionality.
    pub dimension: usize,
    pub timeout: Duration,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_EMBEDDING_ENDPOINT.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key: None,
            dimension: EMBEDDING_DIM,
            timeout: DEFAULT_EMBED_TIMEOUT,
        }
    }
}

impl EmbedderConfig {
    /// `{endpoint}/models/{model}:embedContent`
    pub fn request_url(&self) -> String {
        format!(
            "{}/models/{}:embedContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: &'static str,
    output_dimensionality: usize,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Option<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Embedding provider backed by a Gemini-compatible REST endpoint.
#[derive(Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: EmbedderConfig,
}

impl std::fmt::Debug for HttpEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbedder")
            .field("endpoint", &self.config.endpoint)
            .field("model", &self.config.model)
            .field("dimension", &self.config.dimension)
            .finish_non_exhaustive()
    }
}

impl HttpEmbedder {
    pub fn new(config: EmbedderConfig) -> Result<Self, EmbeddingError> {
        if config.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(EmbeddingError::MissingApiKey);
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EmbedderConfig {
        &self.config
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>, EmbeddingError> {
        let body = EmbedRequest {
            model: format!("models/{}", self.config.model),
            content: Content {
                parts: [Part { text }],
            },
            task_type: task.as_api_str(),
            output_dimensionality: self.config.dimension,
        };

        debug!(text_len = text.len(), ?task, "Requesting embedding");

        let response = self
            .client
            .post(self.config.request_url())
            .header("x-goog-api-key", self.config.api_key.as_deref().unwrap_or_default())
            .json(&body)
            .send()
            .await
            .map_err(|e| match EmbeddingError::from(e) {
                EmbeddingError::Timeout { .. } => EmbeddingError::Timeout {
                    after_ms: self.config.timeout.as_millis() as u64,
                },
                other => other,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbedResponse =
            response
                .json()
                .await
                .map_err(|e| EmbeddingError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        parsed
            .embedding
            .map(|e| e.values)
            .ok_or_else(|| EmbeddingError::InvalidResponse {
                reason: "missing embedding.values".to_string(),
            })
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}
