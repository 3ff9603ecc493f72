//! Retrieval Orchestrator configuration (§4.12).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub search_top_k: usize,
    pub rerank_top_k: usize,
    pub max_context_chunks: usize,
    pub enable_reranking: bool,
    pub enable_compression: bool,
    pub compression_ratio: f32,
    pub score_threshold: f32,
    pub enable_citations: bool,
    pub use_metadata_boost: bool,
    pub temperature: f32,
    pub default_model: String,
    /// Max concurrent full-retrieval requests in flight.
    pub max_concurrent_retrievals: usize,
    pub reranker_max_candidates: usize,
    /// Model used by the Intent Classifier's single classification call.
    pub intent_model: String,
    /// Answer/Intent "fast" tier, used for simple intents (§4.11).
    pub fast_model: String,
    /// Answer/Intent "strong" tier, used for complex intents (§4.11).
    pub strong_model: String,
    /// Reranker model id, resolved via the gateway's model registry.
    pub rerank_model: String,
    /// Compressor model id, resolved via the gateway's model registry.
    pub compression_model: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search_top_k: 10,
            rerank_top_k: 3,
            max_context_chunks: 3,
            enable_reranking: true,
            enable_compression: false,
            compression_ratio: 0.5,
            score_threshold: 0.3,
            enable_citations: true,
            use_metadata_boost: true,
            temperature: 0.3,
            default_model: "fast-default".to_string(),
            max_concurrent_retrievals: 20,
            reranker_max_candidates: 100,
            intent_model: "fast-default".to_string(),
            fast_model: "fast-default".to_string(),
            strong_model: "strong-default".to_string(),
            rerank_model: "bge-reranker-v2-m3".to_string(),
            compression_model: "fast-default".to_string(),
        }
    }
}
