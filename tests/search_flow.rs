//! Search over websites registered through the indexing hook.

mod common;

use common::fixtures::{COLLECTION, TestDirectory, criteria_through_level, query_vector};
use sifter::directory::Principal;
use sifter::error::DirectoryError;
use sifter::search::SearchResult;
use sifter::store::DirectoryStore;

const QUERY: &str = "payment api";

async fn directory() -> TestDirectory {
    let dir = TestDirectory::new().await;
    dir.embedder.set_vector(QUERY, query_vector());
    dir
}

fn domains(results: &[SearchResult]) -> Vec<&str> {
    results.iter().map(|r| r.domain.as_str()).collect()
}

#[tokio::test]
async fn test_registration_indexes_embedding() {
    let dir = directory().await;
    let owner = dir.principal(Principal::new(1, "owner")).await;

    dir.register(&owner, "one.example", 0.9, &[]).await;
    dir.register(&owner, "two.example", 0.7, &[]).await;

    assert_eq!(dir.vectors.point_count(COLLECTION), Some(2));
}

#[tokio::test]
async fn test_semantic_search_fuses_similarity_keywords_and_level() {
    let dir = directory().await;
    let owner = dir.principal(Principal::new(1, "owner")).await;
    let trusted = dir.principal(Principal::new(2, "auditor").trusted()).await;
    let searcher = dir.principal(Principal::new(3, "searcher")).await;

    dir.register(&owner, "plain.example", 0.9, &[]).await;
    dir.register(&owner, "tagged.example", 0.8, &["payment", "api"]).await;
    dir.register(&owner, "graded.example", 0.8, &[]).await;
    dir.register(&owner, "far.example", 0.3, &["payment"]).await;

    dir.verifications
        .submit("graded.example", Some(&trusted), &criteria_through_level(5))
        .await
        .unwrap();
    dir.crunch().await;

    let response = dir
        .ranker
        .semantic_search(QUERY, Some(&searcher))
        .await
        .unwrap();

    // graded: 0.48 + 0.1 + 0.05 = 0.63; tagged: 0.48 + 0.25 = 0.73; plain: 0.54
    assert_eq!(
        domains(&response.results),
        vec!["tagged.example", "graded.example", "plain.example"]
    );
    assert_eq!(response.search_queries_remaining, 9);
    assert_eq!(response.query, QUERY);

    let graded = &response.results[1];
    assert_eq!(graded.level, 5);
    assert!(graded.verified);
    assert_eq!(graded.similarity_score, Some(0.8));
    assert_eq!(graded.relevance_score, Some(0.63));
}

#[tokio::test]
async fn test_semantic_search_quota_and_refund() {
    let dir = directory().await;
    let owner = dir.principal(Principal::new(1, "owner")).await;
    let searcher = dir
        .principal(Principal::new(3, "searcher").with_quota(1))
        .await;
    dir.register(&owner, "only.example", 0.9, &[]).await;

    dir.embedder.set_failing(true);
    let err = dir
        .ranker
        .semantic_search(QUERY, Some(&searcher))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.status_code(), 503);

    dir.embedder.set_failing(false);
    let response = dir
        .ranker
        .semantic_search(QUERY, Some(&searcher))
        .await
        .unwrap();
    assert_eq!(response.search_queries_remaining, 0);

    let err = dir
        .ranker
        .semantic_search(QUERY, Some(&searcher))
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::QuotaExhausted));
}

#[tokio::test]
async fn test_verifying_earns_search_quota() {
    let dir = directory().await;
    let owner = dir.principal(Principal::new(1, "owner")).await;
    let searcher = dir
        .principal(Principal::new(3, "searcher").with_quota(0))
        .await;
    dir.register(&owner, "earn.example", 0.9, &[]).await;

    let err = dir
        .ranker
        .semantic_search(QUERY, Some(&searcher))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 402);

    let outcome = dir
        .verifications
        .submit("earn.example", Some(&searcher), &criteria_through_level(1))
        .await
        .unwrap();
    assert_eq!(outcome.queries_remaining, 10);

    let response = dir
        .ranker
        .semantic_search(QUERY, Some(&searcher))
        .await
        .unwrap();
    assert_eq!(response.search_queries_remaining, 9);
}

#[tokio::test]
async fn test_keyword_search_and_browse() {
    let dir = directory().await;
    let owner = dir.principal(Principal::new(1, "owner")).await;
    let searcher = dir.principal(Principal::new(3, "searcher")).await;

    dir.register(&owner, "both.example", 0.1, &["Payment API", "billing"]).await;
    dir.register(&owner, "one.example", 0.1, &["billing"]).await;
    dir.register(&owner, "none.example", 0.1, &["weather"]).await;

    let response = dir
        .ranker
        .keyword_search("billing payment", Some(&searcher))
        .await
        .unwrap();
    assert_eq!(
        domains(&response.results),
        vec!["both.example", "one.example"]
    );
    assert!(response.results[0].similarity_score.is_none());
    assert_eq!(response.search_queries_remaining, 10);

    let browsed = dir.ranker.browse("weather").await.unwrap();
    assert_eq!(domains(&browsed), vec!["none.example"]);

    let err = dir
        .ranker
        .keyword_search("billing", None)
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Unauthenticated));
}

#[tokio::test]
async fn test_deleted_website_drops_out_of_search() {
    let dir = directory().await;
    let owner = dir.principal(Principal::new(1, "owner")).await;
    let searcher = dir.principal(Principal::new(3, "searcher")).await;

    let gone = dir.register(&owner, "gone.example", 0.9, &["payment"]).await;
    dir.register(&owner, "kept.example", 0.8, &["payment"]).await;

    assert!(dir.store.delete_website(gone.id).await.unwrap());

    let response = dir
        .ranker
        .semantic_search(QUERY, Some(&searcher))
        .await
        .unwrap();
    assert_eq!(domains(&response.results), vec!["kept.example"]);

    let browsed = dir.ranker.browse("payment").await.unwrap();
    assert_eq!(domains(&browsed), vec!["kept.example"]);
}
