use super::*;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const SIFTER_VARS: &[&str] = &[
    "SIFTER_QDRANT_URL",
    "SIFTER_COLLECTION",
    "SIFTER_EMBEDDING_URL",
    "SIFTER_EMBEDDING_MODEL",
    "SIFTER_EMBEDDING_API_KEY",
    "SIFTER_EMBED_TIMEOUT_MS",
    "SIFTER_AGGREGATION_INTERVAL_SECS",
    "SIFTER_CHARGE_KEYWORD_SEARCH",
    "SIFTER_SNAPSHOT_PATH",
    "SIFTER_EMBED_CACHE_CAPACITY",
];

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_sifter_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for key in SIFTER_VARS {
        unsafe { env::remove_var(key) };
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.qdrant_url, "http://localhost:6334");
    assert_eq!(config.collection, "sifter_websites");
    assert_eq!(config.embedding_model, "gemini-embedding-001");
    assert!(config.embedding_api_key.is_none());
    assert_eq!(config.embed_timeout, Duration::from_secs(10));
    assert_eq!(config.aggregation_interval, Duration::from_secs(86_400));
    assert!(!config.charge_keyword_search);
    assert_eq!(config.snapshot_path, PathBuf::from("./.data/directory.json"));
    assert_eq!(config.embed_cache_capacity, 10_000);
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_sifter_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.qdrant_url, DEFAULT_QDRANT_URL);
    assert_eq!(config.embed_timeout, Duration::from_secs(10));
    assert!(!config.charge_keyword_search);
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_sifter_env();

    let config = with_env_vars(
        &[
            ("SIFTER_QDRANT_URL", "http://qdrant:6334"),
            ("SIFTER_COLLECTION", "websites_v2"),
            ("SIFTER_EMBEDDING_API_KEY", "  secret  "),
            ("SIFTER_EMBED_TIMEOUT_MS", "2500"),
            ("SIFTER_AGGREGATION_INTERVAL_SECS", "60"),
            ("SIFTER_CHARGE_KEYWORD_SEARCH", "Yes"),
            ("SIFTER_SNAPSHOT_PATH", "/tmp/sifter.json"),
            ("SIFTER_EMBED_CACHE_CAPACITY", "32"),
        ],
        Config::from_env,
    )
    .expect("should parse overrides");

    assert_eq!(config.qdrant_url, "http://qdrant:6334");
    assert_eq!(config.collection, "websites_v2");
    assert_eq!(config.embedding_api_key.as_deref(), Some("secret"));
    assert_eq!(config.embed_timeout, Duration::from_millis(2500));
    assert_eq!(config.aggregation_interval, Duration::from_secs(60));
    assert!(config.charge_keyword_search);
    assert_eq!(config.snapshot_path, PathBuf::from("/tmp/sifter.json"));
    assert_eq!(config.embed_cache_capacity, 32);
}

#[test]
#[serial]
fn test_blank_api_key_is_none() {
    clear_sifter_env();

    let config = with_env_vars(&[("SIFTER_EMBEDDING_API_KEY", "   ")], Config::from_env)
        .expect("should parse");
    assert!(config.embedding_api_key.is_none());
}

#[test]
#[serial]
fn test_invalid_number() {
    clear_sifter_env();

    let result = with_env_vars(&[("SIFTER_EMBED_TIMEOUT_MS", "soon")], Config::from_env);
    match result {
        Err(ConfigError::InvalidNumber { name, value, .. }) => {
            assert_eq!(name, "SIFTER_EMBED_TIMEOUT_MS");
            assert_eq!(value, "soon");
        }
        other => panic!("expected InvalidNumber, got {other:?}"),
    }
}

#[test]
#[serial]
fn test_invalid_bool() {
    clear_sifter_env();

    let result = with_env_vars(&[("SIFTER_CHARGE_KEYWORD_SEARCH", "maybe")], Config::from_env);
    assert!(matches!(result, Err(ConfigError::InvalidBool { .. })));
}

#[test]
fn test_validate_defaults() {
    Config::default().validate().expect("defaults should validate");
}

#[test]
fn test_validate_rejects_zero_durations() {
    let config = Config {
        embed_timeout: Duration::ZERO,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ZeroDuration {
            name: "SIFTER_EMBED_TIMEOUT_MS"
        })
    ));

    let config = Config {
        aggregation_interval: Duration::ZERO,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ZeroDuration { .. })
    ));
}

#[test]
fn test_validate_rejects_bad_url() {
    let config = Config {
        qdrant_url: "localhost:6334".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidUrl {
            name: "SIFTER_QDRANT_URL",
            ..
        })
    ));
}

#[test]
fn test_validate_snapshot_path_is_directory() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        snapshot_path: dir.path().to_path_buf(),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::NotAFile { .. })
    ));
}

#[test]
fn test_validate_snapshot_parent_is_file() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let config = Config {
        snapshot_path: file.path().join("directory.json"),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::NotADirectory { .. })
    ));
}

#[test]
fn test_derived_settings() {
    let config = Config {
        embedding_api_key: Some("key".to_string()),
        embed_timeout: Duration::from_millis(1234),
        collection: "custom".to_string(),
        charge_keyword_search: true,
        ..Default::default()
    };

    let embedder = config.embedder_config();
    assert_eq!(embedder.api_key.as_deref(), Some("key"));
    assert_eq!(embedder.timeout, Duration::from_millis(1234));
    assert_eq!(embedder.dimension, crate::constants::EMBEDDING_DIM);

    let search = config.search_options();
    assert_eq!(search.collection, "custom");
    assert!(search.charge_keyword_search);
}

#[test]
fn test_debug_redacts_api_key() {
    let config = Config {
        embedding_api_key: Some("super-secret".to_string()),
        ..Default::default()
    };
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("<redacted>"));
}

#[test]
fn test_build_embedder_without_key_uses_stub() {
    let embedder = Config::default().build_embedder().unwrap();
    assert!(embedder.is_stub());
    assert!(embedder.is_empty());
}

#[test]
fn test_build_embedder_with_key_uses_http() {
    let config = Config {
        embedding_api_key: Some("key".to_string()),
        ..Default::default()
    };
    let embedder = config.build_embedder().unwrap();
    assert!(!embedder.is_stub());
    assert_eq!(embedder.dimension(), crate::constants::EMBEDDING_DIM);
}

#[test]
fn test_build_embedder_rejects_empty_key() {
    let config = Config {
        embedding_api_key: Some(String::new()),
        ..Default::default()
    };
    assert!(matches!(
        config.build_embedder(),
        Err(EmbeddingError::MissingApiKey)
    ));
}

#[tokio::test]
async fn test_built_stub_embedder_caches_queries() {
    let config = Config {
        embed_cache_capacity: 8,
        ..Default::default()
    };
    let embedder = config.build_embedder().unwrap();

    let first = embedder
        .embed("payment api", crate::embedding::EmbeddingTask::Query)
        .await
        .unwrap();
    let second = embedder
        .embed("payment api", crate::embedding::EmbeddingTask::Query)
        .await
        .unwrap();
    assert_eq!(first, second);

    embedder.run_pending_tasks();
    assert_eq!(embedder.len(), 1);
}
