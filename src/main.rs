//! Sifter crunch worker: periodic verification consensus over the directory store.
//!
//! `sifter-crunch --once` runs a single batch and exits (for cron-style scheduling).
//! `sifter-crunch --reindex` re-embeds every stored website into Qdrant and exits.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::signal;

use sifter::config::Config;
use sifter::search::EmbeddingIndexer;
use sifter::store::{MemoryStore, SnapshotLoad};
use sifter::vectordb::QdrantClient;
use sifter::verification::{AggregationScheduler, Aggregator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!(
        snapshot = %config.snapshot_path.display(),
        interval_secs = config.aggregation_interval.as_secs(),
        "Sifter crunch starting"
    );

    let store = Arc::new(MemoryStore::new());
    match store.load_snapshot(&config.snapshot_path).await? {
        SnapshotLoad::NotFound => tracing::warn!("No snapshot found. Starting empty."),
        loaded => tracing::info!(?loaded, "Hydration complete."),
    }

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--reindex") {
        return reindex(&config, &store).await;
    }

    let aggregator = Arc::new(Aggregator::new(store.clone()));

    if args.iter().any(|arg| arg == "--once") {
        let report = aggregator.run(&AtomicBool::new(false)).await?;
        tracing::info!(?report, "Single aggregation batch finished");
        store.save_snapshot(&config.snapshot_path).await?;
        return Ok(());
    }

    let scheduler = AggregationScheduler::new(aggregator, config.aggregation_interval);
    let handle = scheduler.start();

    shutdown_signal().await;

    scheduler.shutdown();
    if let Err(e) = handle.await {
        tracing::error!("Aggregation task ended abnormally: {}", e);
    }

    tracing::info!("Saving snapshot...");
    let bytes = store.save_snapshot(&config.snapshot_path).await?;
    tracing::info!(bytes, "Sifter crunch shutdown complete");
    Ok(())
}

async fn reindex(config: &Config, store: &MemoryStore) -> anyhow::Result<()> {
    let vectors = QdrantClient::new(&config.qdrant_url)?;
    vectors.health_check().await?;

    let embedder = Arc::new(config.build_embedder()?);
    let indexer = EmbeddingIndexer::new(
        embedder,
        Arc::new(vectors),
        config.collection.clone(),
        config.embed_timeout,
    );
    indexer.ensure_collection().await?;

    let websites = store.websites();
    let indexed = indexer.reindex(&websites).await;
    if indexed < websites.len() {
        anyhow::bail!("indexed {indexed} of {} websites", websites.len());
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
