//! Embedder configuration (§4.3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Default embedding model identifier, resolved via the gateway's
    /// model registry.
    pub default_model: String,
    /// Maximum number of texts per batch embed call.
    pub max_batch_size: usize,
    /// Embedding cache capacity (entries), shared across shards.
    pub cache_capacity: usize,
    /// Whether to L2-normalize vectors after fetch (§4.3: canonical choice).
    pub normalize: bool,
    /// Per-provider health probe timeout in milliseconds.
    pub health_check_timeout_ms: u64,
    /// Max concurrent outbound embedding calls.
    pub max_concurrent_calls: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            default_model: "jina-embeddings-v3".to_string(),
            max_batch_size: 128,
            cache_capacity: 10_000,
            normalize: true,
            health_check_timeout_ms: 2_000,
            max_concurrent_calls: 20,
        }
    }
}
