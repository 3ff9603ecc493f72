//! Cross-encoder or hosted rerank over a candidate list (§4.9).
//!
//! Backend (local BGE cross-encoder vs. hosted Jina reranker) is just a
//! choice of model id resolved through the gateway's provider registry —
//! the contract exposed here is identical either way, per §4.9.

use ragforge_gateway::LlmGateway;
use ragforge_store::SearchHit;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// `rerank(query, candidates[], topN) → topN[]`.
pub struct Reranker {
    gateway: Arc<LlmGateway>,
    model: String,
}

impl std::fmt::Debug for Reranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reranker").field("model", &self.model).finish_non_exhaustive()
    }
}

impl Reranker {
    #[must_use]
    pub fn new(gateway: Arc<LlmGateway>, model: impl Into<String>) -> Self {
        Self { gateway, model: model.into() }
    }

    /// Rerank `candidates` against `query`, keeping the top `top_n`
    /// (`top_n ≤ len(candidates) ≤ 100`, enforced by the caller's
    /// `reranker_max_candidates` cap).
    ///
    /// On failure, degrades to the input candidates unchanged, truncated
    /// to `top_n` by original order (§4.9 failure policy) — this method
    /// never returns an error so the retrieval pipeline can always
    /// continue.
    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<SearchHit>,
        top_n: usize,
        deadline: Duration,
    ) -> (Vec<SearchHit>, bool) {
        if candidates.is_empty() {
            return (candidates, true);
        }

        let docs: Vec<String> = candidates.iter().map(|c| c.chunk.text.clone()).collect();
        match self.gateway.rerank(query, &docs, top_n, &self.model, deadline).await {
            Ok(outcomes) => {
                let mut result = Vec::with_capacity(outcomes.len());
                for outcome in outcomes {
                    if let Some(original) = candidates.get(outcome.index) {
                        let mut hit = original.clone();
                        hit.score = outcome.score;
                        result.push(hit);
                    }
                }
                (result, true)
            }
            Err(err) => {
                warn!(error = %err, "reranker failed, passing candidates through unchanged");
                let mut fallback = candidates;
                fallback.truncate(top_n);
                (fallback, false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ragforge_config::{GatewayConfig, ProviderConfig};
    use ragforge_core::Chunk;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn hit(id: &str, text: &str) -> SearchHit {
        let now = Utc::now();
        SearchHit {
            chunk: Chunk {
                id: id.to_string(),
                document_id: "d".to_string(),
                tenant_id: "default".to_string(),
                chunk_index: 0,
                text: text.to_string(),
                char_count: text.len(),
                token_count: 1,
                dense_vector: vec![1.0],
                keywords: String::new(),
                topics: String::new(),
                questions: String::new(),
                summary: String::new(),
                created_at: now,
                updated_at: now,
            },
            score: 0.1,
        }
    }

    async fn gateway_pointing_at(server: &MockServer) -> Arc<LlmGateway> {
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
        Arc::new(LlmGateway::new(config))
    }

    #[tokio::test]
    async fn rerank_reorders_by_hosted_score() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rerank"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"index": 1, "relevance_score": 0.9},
                    {"index": 0, "relevance_score": 0.4},
                ]
            })))
            .mount(&server)
            .await;

        let reranker = Reranker::new(gateway_pointing_at(&server).await, "bge-reranker-v2-m3");
        let candidates = vec![hit("a", "first"), hit("b", "second")];
        let (result, success) = reranker.rerank("q", candidates, 2, Duration::from_secs(2)).await;
        assert!(success);
        assert_eq!(result[0].chunk.id, "b");
        assert!((result[0].score - 0.9).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn rerank_degrades_to_original_order_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rerank"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let reranker = Reranker::new(gateway_pointing_at(&server).await, "bge-reranker-v2-m3");
        let candidates = vec![hit("a", "first"), hit("b", "second")];
        let (result, success) = reranker.rerank("q", candidates, 1, Duration::from_secs(2)).await;
        assert!(!success);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].chunk.id, "a");
    }
}
