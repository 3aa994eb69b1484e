//! Shared wiring for integration tests: an in-memory directory with mock
//! embedding and vector backends.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value, json};

use sifter::constants::EMBEDDING_DIM_U64;
use sifter::criteria::CriterionId;
use sifter::directory::{Principal, Registration, Registry, Website};
use sifter::embedding::{MockEmbedder, unit_vector_with_similarity};
use sifter::search::{EmbeddingIndexer, SearchOptions, SearchRanker};
use sifter::store::{DirectoryStore, MemoryStore};
use sifter::vectordb::{MockVectorDbClient, VectorDbClient};
use sifter::verification::{Aggregator, VerificationService};

pub const COLLECTION: &str = "it_websites";
pub const EMBED_TIMEOUT: Duration = Duration::from_secs(5);

/// Criteria JSON with every criterion of levels `1..=level` true and the rest false.
pub fn criteria_through_level(level: u8) -> Value {
    let map: Map<String, Value> = CriterionId::ALL
        .iter()
        .map(|id| (id.as_str().to_string(), json!(id.level() <= level)))
        .collect();
    Value::Object(map)
}

/// Query vector every scripted website vector is measured against.
pub fn query_vector() -> Vec<f32> {
    unit_vector_with_similarity(1.0, 1)
}

pub struct TestDirectory {
    pub store: Arc<MemoryStore>,
    pub embedder: Arc<MockEmbedder>,
    pub vectors: Arc<MockVectorDbClient>,
    pub registry: Registry,
    pub verifications: VerificationService,
    pub aggregator: Arc<Aggregator>,
    pub ranker: SearchRanker<MockVectorDbClient>,
    next_axis: std::sync::atomic::AtomicUsize,
}

impl TestDirectory {
    pub async fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new())).await
    }

    pub async fn with_store(store: Arc<MemoryStore>) -> Self {
        let embedder = Arc::new(MockEmbedder::new());
        let vectors = Arc::new(MockVectorDbClient::new());
        vectors
            .ensure_collection(COLLECTION, EMBEDDING_DIM_U64)
            .await
            .expect("collection");

        let indexer = Arc::new(EmbeddingIndexer::new(
            embedder.clone(),
            vectors.clone(),
            COLLECTION,
            EMBED_TIMEOUT,
        ));
        let registry = Registry::new(store.clone()).with_hook(indexer);
        let verifications = VerificationService::new(store.clone());
        let aggregator = Arc::new(Aggregator::new(store.clone()));
        let ranker = SearchRanker::new(
            store.clone(),
            embedder.clone(),
            vectors.clone(),
            SearchOptions {
                collection: COLLECTION.to_string(),
                embed_timeout: EMBED_TIMEOUT,
                charge_keyword_search: false,
            },
        );

        Self {
            store,
            embedder,
            vectors,
            registry,
            verifications,
            aggregator,
            ranker,
            next_axis: std::sync::atomic::AtomicUsize::new(2),
        }
    }

    /// Stores `principal` so it can verify and search.
    pub async fn principal(&self, principal: Principal) -> Principal {
        self.store
            .upsert_principal(principal.clone())
            .await
            .expect("principal");
        principal
    }

    /// Registers a website whose document embedding has cosine `similarity` with
    /// [`query_vector`], tagged with `keywords`.
    pub async fn register(
        &self,
        owner: &Principal,
        domain: &str,
        similarity: f32,
        keywords: &[&str],
    ) -> Website {
        let name = format!("{domain} site");
        let description = format!("All about {domain}");
        let axis = self
            .next_axis
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.embedder.set_vector(
            format!("{name}. {description}"),
            unit_vector_with_similarity(similarity, axis),
        );

        let website = self
            .registry
            .register(
                Registration {
                    url: format!("https://{domain}/"),
                    name,
                    description,
                    entry_point: None,
                    is_my_website: true,
                },
                Some(owner),
            )
            .await
            .expect("register");

        self.registry
            .index_keywords(website.id, keywords.iter().copied())
            .await
            .expect("keywords");
        website
    }

    /// Runs one aggregation batch to completion.
    pub async fn crunch(&self) -> sifter::verification::AggregationReport {
        self.aggregator
            .run(&std::sync::atomic::AtomicBool::new(false))
            .await
            .expect("aggregation")
    }
}
