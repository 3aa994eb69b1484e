//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `SIFTER_*` environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::embedding::cache::DEFAULT_EMBED_CACHE_CAPACITY;
use crate::embedding::http::{
    DEFAULT_EMBED_TIMEOUT, DEFAULT_EMBEDDING_ENDPOINT, DEFAULT_EMBEDDING_MODEL,
};
use crate::embedding::{
    CachedEmbedder, EmbedderConfig, EmbeddingError, EmbeddingProvider, HttpEmbedder,
    StubEmbedder,
};
use crate::search::SearchOptions;
use crate::vectordb::DEFAULT_COLLECTION_NAME;

/// Default Qdrant URL used when `SIFTER_QDRANT_URL` is not set.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Default aggregation period: once a day.
pub const DEFAULT_AGGREGATION_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Worker configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `SIFTER_*` overrides on top of defaults.
#[derive(Clone)]
pub struct Config {
    /// Qdrant endpoint URL. Default: `http://localhost:6334`.
    pub qdrant_url: String,

    /// Vector collection holding website embeddings. Default: `sifter_websites`.
    pub collection: String,

    /// Embedding API base URL.
    pub embedding_url: String,

    pub embedding_model: String,

    /// Without a key [`Config::build_embedder`] falls back to the stub embedder.
    pub embedding_api_key: Option<String>,

    /// Per-request embedding timeout. Default: 10 s.
    pub embed_timeout: Duration,

    /// Period between aggregation runs. Default: 24 h.
    pub aggregation_interval: Duration,

    /// Charge one quota unit for keyword-only searches. Default: `false`.
    pub charge_keyword_search: bool,

    /// JSON snapshot of the in-memory store. Default: `./.data/directory.json`.
    pub snapshot_path: PathBuf,

    /// Max entries in the query embedding cache. Default: `10_000`.
    pub embed_cache_capacity: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("qdrant_url", &self.qdrant_url)
            .field("collection", &self.collection)
            .field("embedding_url", &self.embedding_url)
            .field("embedding_model", &self.embedding_model)
            .field(
                "embedding_api_key",
                &self.embedding_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("embed_timeout", &self.embed_timeout)
            .field("aggregation_interval", &self.aggregation_interval)
            .field("charge_keyword_search", &self.charge_keyword_search)
            .field("snapshot_path", &self.snapshot_path)
            .field("embed_cache_capacity", &self.embed_cache_capacity)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            collection: DEFAULT_COLLECTION_NAME.to_string(),
            embedding_url: DEFAULT_EMBEDDING_ENDPOINT.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_api_key: None,
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
            aggregation_interval: Duration::from_secs(DEFAULT_AGGREGATION_INTERVAL_SECS),
            charge_keyword_search: false,
            snapshot_path: PathBuf::from("./.data/directory.json"),
            embed_cache_capacity: DEFAULT_EMBED_CACHE_CAPACITY,
        }
    }
}

impl Config {
    const ENV_QDRANT_URL: &'static str = "SIFTER_QDRANT_URL";
    const ENV_COLLECTION: &'static str = "SIFTER_COLLECTION";
    const ENV_EMBEDDING_URL: &'static str = "SIFTER_EMBEDDING_URL";
    const ENV_EMBEDDING_MODEL: &'static str = "SIFTER_EMBEDDING_MODEL";
    const ENV_EMBEDDING_API_KEY: &'static str = "SIFTER_EMBEDDING_API_KEY";
    const ENV_EMBED_TIMEOUT_MS: &'static str = "SIFTER_EMBED_TIMEOUT_MS";
    const ENV_AGGREGATION_INTERVAL_SECS: &'static str = "SIFTER_AGGREGATION_INTERVAL_SECS";
    const ENV_CHARGE_KEYWORD_SEARCH: &'static str = "SIFTER_CHARGE_KEYWORD_SEARCH";
    const ENV_SNAPSHOT_PATH: &'static str = "SIFTER_SNAPSHOT_PATH";
    const ENV_EMBED_CACHE_CAPACITY: &'static str = "SIFTER_EMBED_CACHE_CAPACITY";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let embed_timeout_ms = Self::parse_u64_from_env(
            Self::ENV_EMBED_TIMEOUT_MS,
            defaults.embed_timeout.as_millis() as u64,
        )?;
        let interval_secs = Self::parse_u64_from_env(
            Self::ENV_AGGREGATION_INTERVAL_SECS,
            defaults.aggregation_interval.as_secs(),
        )?;

        Ok(Self {
            qdrant_url: Self::parse_string_from_env(Self::ENV_QDRANT_URL, defaults.qdrant_url),
            collection: Self::parse_string_from_env(Self::ENV_COLLECTION, defaults.collection),
            embedding_url: Self::parse_string_from_env(
                Self::ENV_EMBEDDING_URL,
                defaults.embedding_url,
            ),
            embedding_model: Self::parse_string_from_env(
                Self::ENV_EMBEDDING_MODEL,
                defaults.embedding_model,
            ),
            embedding_api_key: Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_API_KEY),
            embed_timeout: Duration::from_millis(embed_timeout_ms),
            aggregation_interval: Duration::from_secs(interval_secs),
            charge_keyword_search: Self::parse_bool_from_env(
                Self::ENV_CHARGE_KEYWORD_SEARCH,
                defaults.charge_keyword_search,
            )?,
            snapshot_path: Self::parse_path_from_env(
                Self::ENV_SNAPSHOT_PATH,
                defaults.snapshot_path,
            ),
            embed_cache_capacity: Self::parse_u64_from_env(
                Self::ENV_EMBED_CACHE_CAPACITY,
                defaults.embed_cache_capacity,
            )?,
        })
    }

    /// Validates URLs, durations and the snapshot path (does not create anything).
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::check_url(Self::ENV_QDRANT_URL, &self.qdrant_url)?;
        Self::check_url(Self::ENV_EMBEDDING_URL, &self.embedding_url)?;

        if self.embed_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                name: Self::ENV_EMBED_TIMEOUT_MS,
            });
        }
        if self.aggregation_interval.is_zero() {
            return Err(ConfigError::ZeroDuration {
                name: Self::ENV_AGGREGATION_INTERVAL_SECS,
            });
        }

        if self.snapshot_path.exists() && !self.snapshot_path.is_file() {
            return Err(ConfigError::NotAFile {
                path: self.snapshot_path.clone(),
            });
        }
        if let Some(parent) = self.snapshot_path.parent()
            && parent.exists()
            && !parent.is_dir()
        {
            return Err(ConfigError::NotADirectory {
                path: parent.to_path_buf(),
            });
        }

        Ok(())
    }

    /// Embedding client settings derived from this configuration.
    pub fn embedder_config(&self) -> EmbedderConfig {
        EmbedderConfig {
            endpoint: self.embedding_url.clone(),
            model: self.embedding_model.clone(),
            api_key: self.embedding_api_key.clone(),
            timeout: self.embed_timeout,
            ..Default::default()
        }
    }

    /// Builds the cached embedding provider: the HTTP client when an API key is
    /// set, otherwise the deterministic stub.
    pub fn build_embedder(&self) -> Result<CachedEmbedder, EmbeddingError> {
        let inner: Arc<dyn EmbeddingProvider> = if self.embedding_api_key.is_some() {
            Arc::new(HttpEmbedder::new(self.embedder_config())?)
        } else {
            warn!("{} not set. Using stub embeddings.", Self::ENV_EMBEDDING_API_KEY);
            Arc::new(StubEmbedder::new())
        };
        Ok(CachedEmbedder::with_capacity(inner, self.embed_cache_capacity))
    }

    /// Search settings derived from this configuration.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            collection: self.collection.clone(),
            embed_timeout: self.embed_timeout,
            charge_keyword_search: self.charge_keyword_search,
        }
    }

    fn check_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
        if value.starts_with("http://") || value.starts_with("https://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidUrl {
                name,
                value: value.to_string(),
            })
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(default)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_u64_from_env(var_name: &'static str, default: u64) -> Result<u64, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Ok(value) = env::var(var_name) else {
            return Ok(default);
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool {
                name: var_name,
                value,
            }),
        }
    }
}
