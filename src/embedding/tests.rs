use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::constants::EMBEDDING_DIM;

const TIMEOUT: Duration = Duration::from_secs(5);

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[test]
fn test_l2_normalize() {
    let mut v = vec![3.0, 4.0];
    l2_normalize(&mut v);
    assert!((v[0] - 0.6).abs() < 1e-6);
    assert!((v[1] - 0.8).abs() < 1e-6);

    let mut zero = vec![0.0; 4];
    l2_normalize(&mut zero);
    assert_eq!(zero, vec![0.0; 4]);
}

#[test]
fn test_task_api_names() {
    assert_eq!(EmbeddingTask::Query.as_api_str(), "RETRIEVAL_QUERY");
    assert_eq!(EmbeddingTask::Document.as_api_str(), "RETRIEVAL_DOCUMENT");
}

#[tokio::test]
async fn test_stub_is_deterministic() {
    let stub = StubEmbedder::new();
    assert!(stub.is_stub());

    let a = stub.embed("payments api", EmbeddingTask::Query).await.unwrap();
    let b = stub.embed("payments api", EmbeddingTask::Document).await.unwrap();
    let c = stub.embed("weather", EmbeddingTask::Query).await.unwrap();

    assert_eq!(a.len(), EMBEDDING_DIM);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a.iter().all(|x| (-1.0..=1.0).contains(x)));
}

#[tokio::test]
async fn test_embed_normalized_returns_unit_vector() {
    let stub = StubEmbedder::new();
    let v = embed_normalized(&stub, "hello", EmbeddingTask::Query, TIMEOUT)
        .await
        .unwrap();
    assert!((norm(&v) - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn test_embed_normalized_rejects_wrong_dimension() {
    let mock = MockEmbedder::new().with_vector("short", vec![1.0; 16]);
    let err = embed_normalized(&mock, "short", EmbeddingTask::Query, TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EmbeddingError::InvalidDimension {
            expected: 768,
            actual: 16
        }
    ));
}

#[tokio::test]
async fn test_embed_normalized_rejects_zero_vector() {
    let mock = MockEmbedder::new().with_vector("zero", vec![0.0; EMBEDDING_DIM]);
    let err = embed_normalized(&mock, "zero", EmbeddingTask::Query, TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, EmbeddingError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_embed_normalized_times_out() {
    let mock = MockEmbedder::new();
    mock.set_delay(Some(Duration::from_secs(30)));

    let err = embed_normalized(&mock, "slow", EmbeddingTask::Query, Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, EmbeddingError::Timeout { after_ms: 50 }));
}

#[tokio::test]
async fn test_cached_embedder_hits() {
    let mock = Arc::new(MockEmbedder::new());
    let cached = CachedEmbedder::with_capacity(mock.clone(), 16);

    let first = cached.embed("query", EmbeddingTask::Query).await.unwrap();
    let second = cached.embed("query", EmbeddingTask::Query).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(mock.calls(), 1);

    // Task is part of the key.
    cached.embed("query", EmbeddingTask::Document).await.unwrap();
    assert_eq!(mock.calls(), 2);

    cached.run_pending_tasks();
    assert_eq!(cached.len(), 2);
}

#[tokio::test]
async fn test_cached_embedder_does_not_cache_errors() {
    let mock = Arc::new(MockEmbedder::new());
    let cached = CachedEmbedder::new(mock.clone());

    mock.set_failing(true);
    assert!(cached.embed("query", EmbeddingTask::Query).await.is_err());

    mock.set_failing(false);
    assert!(cached.embed("query", EmbeddingTask::Query).await.is_ok());
    assert_eq!(mock.calls(), 2);
}

#[test]
fn test_http_embedder_requires_api_key() {
    let err = HttpEmbedder::new(EmbedderConfig::default()).unwrap_err();
    assert!(matches!(err, EmbeddingError::MissingApiKey));

    let config = EmbedderConfig {
        api_key: Some("key".to_string()),
        endpoint: "http://localhost:9999/v1beta/".to_string(),
        ..Default::default()
    };
    assert_eq!(
        config.request_url(),
        "http://localhost:9999/v1beta/models/gemini-embedding-001:embedContent"
    );
    let embedder = HttpEmbedder::new(config).unwrap();
    assert_eq!(embedder.dimension(), EMBEDDING_DIM);
    assert!(!embedder.is_stub());
}

#[test]
fn test_similarity_helper() {
    let v = unit_vector_with_similarity(0.8, 3);
    assert!((norm(&v) - 1.0).abs() < 1e-6);
    assert!((v[0] - 0.8).abs() < 1e-6);
}
