//! End-to-end verification lifecycle: register, verify, crunch, read back.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::fixtures::{TestDirectory, criteria_through_level};
use sifter::directory::Principal;
use sifter::error::DirectoryError;
use sifter::store::{DirectoryStore, MemoryStore, SnapshotLoad};
use sifter::verification::AggregationScheduler;

#[tokio::test]
async fn test_untrusted_majority_then_trusted_override() {
    let dir = TestDirectory::new().await;
    let owner = dir.principal(Principal::new(1, "owner")).await;
    let bob = dir.principal(Principal::new(2, "bob")).await;
    let carol = dir.principal(Principal::new(3, "carol")).await;
    let dave = dir.principal(Principal::new(4, "dave").trusted()).await;

    dir.register(&owner, "shop.example", 0.9, &["shop"]).await;

    for verifier in [&bob, &carol] {
        let outcome = dir
            .verifications
            .submit("shop.example", Some(verifier), &criteria_through_level(2))
            .await
            .unwrap();
        assert!(outcome.is_new);
        assert_eq!(outcome.queries_awarded, 10);
        assert_eq!(outcome.queries_remaining, 20);
    }

    let report = dir.crunch().await;
    assert_eq!(report.websites_processed, 1);
    assert_eq!(report.verifications_counted, 2);

    let detail = dir.registry.detail("shop.example").await.unwrap();
    assert_eq!(detail.level, 2);
    assert_eq!(detail.verification_count, 2);
    assert!(!detail.website.verified);
    assert!(detail.website.trusted_verification.is_none());

    let trusted = dir
        .verifications
        .submit("https://shop.example/pricing", Some(&dave), &criteria_through_level(4))
        .await
        .unwrap();

    let report = dir.crunch().await;
    assert_eq!(report.verifications_counted, 1);

    let detail = dir.registry.detail("shop.example").await.unwrap();
    assert_eq!(detail.level, 4);
    assert!(detail.website.verified);
    assert_eq!(
        detail.website.trusted_verification,
        Some(trusted.verification_id)
    );

    let analytics = dir
        .registry
        .analytics("shop.example", Some(&owner))
        .await
        .unwrap();
    assert_eq!(analytics.verification_count, 3);
    assert_eq!(analytics.trusted_verification_count, 1);
    assert_eq!(analytics.breakdown.blocking_level(), Some(5));
}

#[tokio::test]
async fn test_twelve_verifications_mark_verified_and_leave_queue() {
    let dir = TestDirectory::new().await;
    let owner = dir.principal(Principal::new(1, "owner")).await;
    dir.register(&owner, "crowd.example", 0.9, &[]).await;

    let newcomer = dir.principal(Principal::new(100, "newcomer")).await;
    let queue = dir.verifications.queue_for(Some(&newcomer), 10).await.unwrap();
    assert_eq!(queue.websites.len(), 1);
    assert_eq!(queue.criteria_docs.len(), 30);

    for id in 10..22 {
        let verifier = dir.principal(Principal::new(id, format!("v{id}"))).await;
        dir.verifications
            .submit("crowd.example", Some(&verifier), &criteria_through_level(1))
            .await
            .unwrap();
    }

    // Twelve verifications drop the site from the queue before any crunch.
    let queue = dir.verifications.queue_for(Some(&newcomer), 10).await.unwrap();
    assert!(queue.websites.is_empty());

    dir.crunch().await;
    let detail = dir.registry.detail("crowd.example").await.unwrap();
    assert!(detail.website.verified);
    assert_eq!(detail.level, 1);
    assert!(detail.website.trusted_verification.is_none());
}

#[tokio::test]
async fn test_resubmission_overwrites_without_reward() {
    let dir = TestDirectory::new().await;
    let owner = dir.principal(Principal::new(1, "owner")).await;
    let bob = dir.principal(Principal::new(2, "bob")).await;
    dir.register(&owner, "flip.example", 0.9, &[]).await;

    let first = dir
        .verifications
        .submit("flip.example", Some(&bob), &criteria_through_level(3))
        .await
        .unwrap();
    dir.crunch().await;
    assert_eq!(dir.registry.detail("flip.example").await.unwrap().level, 3);

    let second = dir
        .verifications
        .submit("flip.example", Some(&bob), &criteria_through_level(1))
        .await
        .unwrap();
    assert!(!second.is_new);
    assert_eq!(second.queries_awarded, 0);
    assert_eq!(second.queries_remaining, 20);
    assert_eq!(second.verification_id, first.verification_id);

    let report = dir.crunch().await;
    assert_eq!(report.verifications_counted, 1);
    let detail = dir.registry.detail("flip.example").await.unwrap();
    assert_eq!(detail.level, 1);
    assert_eq!(detail.verification_count, 1);
}

#[tokio::test]
async fn test_submission_errors() {
    let dir = TestDirectory::new().await;
    let bob = dir.principal(Principal::new(2, "bob")).await;

    let err = dir
        .verifications
        .submit("nowhere.example", Some(&bob), &criteria_through_level(1))
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound { .. }));

    let err = dir
        .verifications
        .submit("nowhere.example", None, &criteria_through_level(1))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 401);

    let owner = dir.principal(Principal::new(1, "owner")).await;
    dir.register(&owner, "real.example", 0.9, &[]).await;
    let err = dir
        .verifications
        .submit("real.example", Some(&bob), &serde_json::json!({"bogus": true}))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_uncounted_work_survives_snapshot_restart() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("directory.json");

    {
        let dir = TestDirectory::new().await;
        let owner = dir.principal(Principal::new(1, "owner")).await;
        let bob = dir.principal(Principal::new(2, "bob")).await;
        dir.register(&owner, "persist.example", 0.9, &[]).await;
        dir.verifications
            .submit("persist.example", Some(&bob), &criteria_through_level(2))
            .await
            .unwrap();
        dir.store.save_snapshot(&path).await.unwrap();
    }

    let store = Arc::new(MemoryStore::new());
    let loaded = store.load_snapshot(&path).await.unwrap();
    assert_eq!(
        loaded,
        SnapshotLoad::Loaded {
            websites: 1,
            verifications: 1
        }
    );
    assert_eq!(store.uncounted_verifications().await.unwrap().len(), 1);

    let dir = TestDirectory::with_store(store).await;
    let report = dir.crunch().await;
    assert_eq!(report.verifications_counted, 1);
    assert_eq!(dir.registry.detail("persist.example").await.unwrap().level, 2);
    assert_eq!(
        dir.store.quota_balance(sifter::directory::PrincipalId(2)).await.unwrap(),
        20
    );
}

#[tokio::test]
async fn test_scheduler_counts_pending_verifications() {
    let dir = TestDirectory::new().await;
    let owner = dir.principal(Principal::new(1, "owner")).await;
    let bob = dir.principal(Principal::new(2, "bob")).await;
    dir.register(&owner, "sched.example", 0.9, &[]).await;
    dir.verifications
        .submit("sched.example", Some(&bob), &criteria_through_level(5))
        .await
        .unwrap();

    let scheduler = AggregationScheduler::new(dir.aggregator.clone(), Duration::from_secs(3600));
    let handle = scheduler.start();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !dir.store.uncounted_verifications().await.unwrap().is_empty() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "scheduler never ran its first batch"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    scheduler.shutdown();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler should stop")
        .unwrap();

    assert_eq!(dir.registry.detail("sched.example").await.unwrap().level, 5);
}
