//! Constructs the process-wide component graph from a loaded
//! [`RagForgeConfig`], bottom-up in the dependency order §2 documents:
//! Vector Store ← Embedder ← Chunker; Gateway ← {Metadata, Compressor,
//! Answer, Intent}; Ingestion/Retrieval Orchestrators on top.

use ragforge_config::RagForgeConfig;
use ragforge_gateway::LlmGateway;
use ragforge_rag::{
    AnswerGenerator, Compressor, Embedder, IngestionOrchestrator, IntentClassifier,
    MetadataExtractor, Reranker, RetrievalOrchestrator, Search,
};
use ragforge_server::{AppState, ShutdownCoordinator};
use ragforge_store::{build_facade, VectorStoreFacade};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Wire every component and return a ready-to-serve [`AppState`].
///
/// Clone-cheap at the end (every field is an `Arc`), so this is only ever
/// called once per process, at startup.
#[must_use]
pub fn build_state(config: RagForgeConfig) -> AppState {
    let config = Arc::new(config);

    let store: Arc<VectorStoreFacade> = Arc::new(build_facade(&config.store));

    let gateway = Arc::new(LlmGateway::new(config.gateway.clone()));

    let embedder = Arc::new(Embedder::new(Arc::clone(&gateway), config.embedding.clone()));

    let metadata = Arc::new(MetadataExtractor::new(
        Arc::clone(&gateway),
        config.metadata.clone(),
        config.retrieval.fast_model.clone(),
    ));

    let search = Arc::new(Search::new(Arc::clone(&embedder), Arc::clone(&store)));
    let reranker = Arc::new(Reranker::new(Arc::clone(&gateway), config.retrieval.rerank_model.clone()));
    let compressor = Arc::new(Compressor::new(Arc::clone(&gateway), config.retrieval.compression_model.clone()));
    let answer = Arc::new(AnswerGenerator::new(Arc::clone(&gateway), config.retrieval.default_model.clone()));
    let intent = Arc::new(IntentClassifier::new(
        Arc::clone(&gateway),
        config.retrieval.intent_model.clone(),
        config.retrieval.fast_model.clone(),
        config.retrieval.strong_model.clone(),
    ));

    let ingestion = Arc::new(IngestionOrchestrator::new(
        config.chunking.clone(),
        Arc::clone(&metadata),
        Arc::clone(&embedder),
        Arc::clone(&store),
        config.server.deadlines.clone(),
    ));

    let retrieval = Arc::new(RetrievalOrchestrator::new(
        intent,
        search,
        reranker,
        compressor,
        answer,
        config.retrieval.clone(),
        config.server.deadlines.clone(),
    ));

    let shutdown = Arc::new(ShutdownCoordinator::new(Duration::from_secs(
        config.server.shutdown_grace_period_secs,
    )));

    AppState {
        ingestion,
        retrieval,
        store,
        gateway,
        embedder,
        config,
        shutdown,
        started_at: Instant::now(),
        version: env!("CARGO_PKG_VERSION"),
    }
}
