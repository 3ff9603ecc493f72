//! HTTP-level tests exercising `LlmGateway` against a mocked provider.

use ragforge_config::{GatewayConfig, ProviderConfig};
use ragforge_gateway::{ChatMessage, CompleteRequest, LlmGateway};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_pointing_at(server: &MockServer) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    for provider in ["jina", "nebius", "sambanova", "bge"] {
        config.providers.insert(
            provider.to_string(),
            ProviderConfig {
                api_key_env: String::new(),
                base_url: server.uri(),
                ..ProviderConfig::default()
            },
        );
    }
    config
}

#[tokio::test]
async fn complete_returns_first_choice_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "hello from nebius"}}]
        })))
        .mount(&server)
        .await;

    let gateway = LlmGateway::new(config_pointing_at(&server));
    let response = gateway
        .complete(
            CompleteRequest {
                model: "nebius-fast".to_string(),
                messages: vec![ChatMessage::user("hi")],
                temperature: 0.2,
            },
            Duration::from_secs(2),
        )
        .await
        .unwrap();

    assert_eq!(response.text, "hello from nebius");
    assert!(!response.cached);
}

#[tokio::test]
async fn complete_serves_second_identical_request_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "cached answer"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = LlmGateway::new(config_pointing_at(&server));
    let request = CompleteRequest {
        model: "nebius-fast".to_string(),
        messages: vec![ChatMessage::user("same question")],
        temperature: 0.0,
    };

    let first = gateway.complete(request.clone(), Duration::from_secs(2)).await.unwrap();
    let second = gateway.complete(request, Duration::from_secs(2)).await.unwrap();

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(first.text, second.text);
}

#[tokio::test]
async fn complete_retries_once_on_rate_limit_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "succeeded after retry"}}]
        })))
        .mount(&server)
        .await;

    let mut config = config_pointing_at(&server);
    config.retry_backoff_ms = vec![1, 1];
    let gateway = LlmGateway::new(config);

    let response = gateway
        .complete(
            CompleteRequest {
                model: "sambanova-fast".to_string(),
                messages: vec![ChatMessage::user("retry me")],
                temperature: 0.0,
            },
            Duration::from_secs(2),
        )
        .await
        .unwrap();

    assert_eq!(response.text, "succeeded after retry");
}

#[tokio::test]
async fn complete_rejects_unknown_model_without_a_network_call() {
    let server = MockServer::start().await;
    let gateway = LlmGateway::new(config_pointing_at(&server));

    let err = gateway
        .complete(
            CompleteRequest {
                model: "not-a-real-model".to_string(),
                messages: vec![ChatMessage::user("hi")],
                temperature: 0.0,
            },
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ragforge_core::RagError::ModelUnknown { .. }));
}

#[tokio::test]
async fn embed_rejects_mismatched_vector_dimension() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"embedding": [0.1, 0.2, 0.3]}]
        })))
        .mount(&server)
        .await;

    let gateway = LlmGateway::new(config_pointing_at(&server));
    let err = gateway
        .embed(&["hello".to_string()], "jina-embeddings-v3", Duration::from_secs(2))
        .await
        .unwrap_err();

    assert!(matches!(err, ragforge_core::RagError::InvalidResponse { .. }));
}

#[tokio::test]
async fn rerank_truncates_and_sorts_by_descending_score() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rerank"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                {"index": 0, "relevance_score": 0.2},
                {"index": 1, "relevance_score": 0.9},
                {"index": 2, "relevance_score": 0.5}
            ]
        })))
        .mount(&server)
        .await;

    let gateway = LlmGateway::new(config_pointing_at(&server));
    let docs = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let results = gateway
        .rerank("query", &docs, 2, "bge-reranker-v2-m3", Duration::from_secs(2))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].index, 1);
    assert_eq!(results[1].index, 2);
}
