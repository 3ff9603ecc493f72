//! LLM Gateway configuration (§4.2, §5).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Environment variable holding the provider's API key. The gateway is
    /// the only component that ever reads it.
    pub api_key_env: String,
    pub base_url: String,
    /// Keep-alive connections per provider pool.
    pub pool_keepalive: usize,
    /// Total connections per provider pool.
    pub pool_max_total: usize,
    pub request_timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: String::new(),
            base_url: String::new(),
            pool_keepalive: 200,
            pool_max_total: 1000,
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Global semaphore cap on outbound provider calls.
    pub max_concurrent_calls: usize,
    /// Response cache TTL in seconds.
    pub cache_ttl_secs: u64,
    /// Response cache capacity (entries).
    pub cache_capacity: usize,
    /// Number of lock shards backing the cache (≥8, per §5 locking discipline).
    pub cache_shards: usize,
    /// Retry backoff steps in milliseconds for `UpstreamTimeout`/`RateLimited`.
    pub retry_backoff_ms: Vec<u64>,
    /// Per-provider-family settings, keyed by provider name.
    pub providers: HashMap<String, ProviderConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "jina".to_string(),
            ProviderConfig {
                api_key_env: "JINA_API_KEY".to_string(),
                base_url: "https://api.jina.ai/v1".to_string(),
                ..ProviderConfig::default()
            },
        );
        providers.insert(
            "nebius".to_string(),
            ProviderConfig {
                api_key_env: "NEBIUS_API_KEY".to_string(),
                base_url: "https://api.studio.nebius.ai/v1".to_string(),
                ..ProviderConfig::default()
            },
        );
        providers.insert(
            "sambanova".to_string(),
            ProviderConfig {
                api_key_env: "SAMBANOVA_API_KEY".to_string(),
                base_url: "https://api.sambanova.ai/v1".to_string(),
                ..ProviderConfig::default()
            },
        );
        providers.insert(
            "bge".to_string(),
            ProviderConfig {
                api_key_env: "BGE_API_KEY".to_string(),
                base_url: "http://localhost:8008".to_string(),
                ..ProviderConfig::default()
            },
        );

        Self {
            max_concurrent_calls: 50,
            cache_ttl_secs: 2 * 60 * 60,
            cache_capacity: 10_000,
            cache_shards: 16,
            retry_backoff_ms: vec![250, 750],
            providers,
        }
    }
}
