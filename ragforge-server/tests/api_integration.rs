//! End-to-end exercise of the HTTP surface against an in-memory store and
//! a wiremock-backed gateway, mirroring §8 scenario 1 ("create + ingest +
//! retrieve, default parameters").

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use ragforge_config::{DeadlinesConfig, EmbeddingConfig, GatewayConfig, MetadataConfig, ProviderConfig, RagForgeConfig, RetrievalConfig};
use ragforge_gateway::LlmGateway;
use ragforge_rag::{Embedder, IngestionOrchestrator, IntentClassifier, MetadataExtractor, RetrievalOrchestrator, Search};
use ragforge_rag::{AnswerGenerator, Compressor, Reranker};
use ragforge_server::{build_app, AppState, ShutdownCoordinator};
use ragforge_store::VectorStoreFacade;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway_config_pointing_at(server: &MockServer) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    for provider in ["jina", "nebius", "sambanova", "bge"] {
        config.providers.insert(
            provider.to_string(),
            ProviderConfig { api_key_env: String::new(), base_url: server.uri(), ..ProviderConfig::default() },
        );
    }
    config
}

async fn build_state(server: &MockServer) -> AppState {
    let gateway = Arc::new(LlmGateway::new(gateway_config_pointing_at(server)));
    let embedder = Arc::new(Embedder::new(Arc::clone(&gateway), EmbeddingConfig::default()));
    let metadata = Arc::new(MetadataExtractor::new(
        Arc::clone(&gateway),
        MetadataConfig { enabled: false, ..MetadataConfig::default() },
        "fast-default",
    ));
    let store = Arc::new(VectorStoreFacade::new(Arc::new(ragforge_store::InMemoryBackend::new())));
    let deadlines = DeadlinesConfig::default();

    let ingestion = Arc::new(IngestionOrchestrator::new(
        ragforge_config::ChunkingConfig::default(),
        Arc::clone(&metadata),
        Arc::clone(&embedder),
        Arc::clone(&store),
        deadlines.clone(),
    ));

    let intent = Arc::new(IntentClassifier::new(Arc::clone(&gateway), "fast-default", "fast-default", "strong-default"));
    let search = Arc::new(Search::new(Arc::clone(&embedder), Arc::clone(&store)));
    let reranker = Arc::new(Reranker::new(Arc::clone(&gateway), "bge-reranker-v2-m3"));
    let compressor = Arc::new(Compressor::new(Arc::clone(&gateway), "fast-default"));
    let answer = Arc::new(AnswerGenerator::new(Arc::clone(&gateway), "fast-default"));
    let retrieval = Arc::new(RetrievalOrchestrator::new(
        intent,
        search,
        reranker,
        compressor,
        answer,
        RetrievalConfig::default(),
        deadlines,
    ));

    AppState {
        ingestion,
        retrieval,
        store,
        gateway,
        embedder,
        config: Arc::new(RagForgeConfig::default()),
        shutdown: Arc::new(ShutdownCoordinator::new(Duration::from_secs(5))),
        started_at: Instant::now(),
        version: "test",
    }
}

fn embedding_vector() -> Vec<f32> {
    let mut v = vec![0.01f32; 1024];
    v[0] = 1.0;
    v
}

async fn mount_common_mocks(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"embedding": embedding_vector()}]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Classify the user's query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "{\"label\":\"factual_retrieval\",\"confidence\":0.9,\"language\":\"en\"}"}}]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Question:"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "The iPhone 15 Pro Max uses the A17 Pro chip [Source 1]."}}]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rerank"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{"index": 0, "relevance_score": 0.95}]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn create_ingest_retrieve_round_trip_returns_grounded_answer() {
    let server = MockServer::start().await;
    mount_common_mocks(&server).await;

    let state = build_state(&server).await;
    let app = build_app(state);

    let ingest_body = serde_json::json!({
        "text": "Apple iPhone 15 Pro Max. Price: $1199. A17 Pro chip.",
        "document_id": "doc_1",
        "collection_name": "products",
        "embedding_model": "jina-embeddings-v3",
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/ingest")
                .header("content-type", "application/json")
                .body(Body::from(ingest_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let ingest_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(ingest_json["chunks_created"].as_u64().unwrap() >= 1);
    assert_eq!(ingest_json["chunks_inserted"], ingest_json["chunks_created"]);

    let retrieve_body = serde_json::json!({
        "query": "What chip does the iPhone 15 Pro Max use?",
        "collection_name": "products",
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/retrieve")
                .header("content-type", "application/json")
                .body(Body::from(retrieve_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let retrieve_json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert!(retrieve_json["answer"].as_str().unwrap().contains("A17 Pro"));
    assert!(!retrieve_json["citations"].as_array().unwrap().is_empty());
    assert!(retrieve_json["stages"]["search"]["success"].as_bool().unwrap());
    assert!(retrieve_json["stages"]["compression"]["skipped"].as_bool().unwrap());
}

#[tokio::test]
async fn health_reports_store_and_provider_status() {
    let server = MockServer::start().await;
    mount_common_mocks(&server).await;
    let state = build_state(&server).await;
    let app = build_app(state);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(health["dependencies"]["vector_store"].as_str().is_some());
}

#[tokio::test]
async fn auto_dim_switch_rejects_mismatched_embedding_model_without_partial_insert() {
    let server = MockServer::start().await;

    let mut high_dim_vector = vec![0.01f32; 4096];
    high_dim_vector[0] = 1.0;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_string_contains("E5-Mistral-7B-Instruct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"embedding": high_dim_vector}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_string_contains("jina-embeddings-v3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"embedding": embedding_vector()}]
        })))
        .mount(&server)
        .await;

    let state = build_state(&server).await;
    let store = state.store.clone();
    let app = build_app(state);

    let first_ingest = serde_json::json!({
        "text": "MedTech Equipment Supply invoice line items.",
        "document_id": "doc_hi",
        "collection_name": "products_hi",
        "embedding_model": "E5-Mistral-7B-Instruct",
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/ingest")
                .header("content-type", "application/json")
                .body(Body::from(first_ingest.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stats = store.describe_collection("products_hi").await.unwrap();
    assert_eq!(stats.dimension, 4096);
    let chunk_count_before = stats.chunk_count;

    let second_ingest = serde_json::json!({
        "text": "A different document entirely.",
        "document_id": "doc_lo",
        "collection_name": "products_hi",
        "embedding_model": "jina-embeddings-v3",
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/ingest")
                .header("content-type", "application/json")
                .body(Body::from(second_ingest.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::OK);

    let stats_after = store.describe_collection("products_hi").await.unwrap();
    assert_eq!(stats_after.chunk_count, chunk_count_before);
}

#[tokio::test]
async fn retrieve_against_missing_collection_returns_not_found() {
    let server = MockServer::start().await;
    mount_common_mocks(&server).await;
    let state = build_state(&server).await;
    let app = build_app(state);

    let retrieve_body = serde_json::json!({
        "query": "anything",
        "collection_name": "never_created",
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/retrieve")
                .header("content-type", "application/json")
                .body(Body::from(retrieve_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
