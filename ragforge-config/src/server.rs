//! HTTP surface and deadline configuration (§5, §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlinesConfig {
    pub health_check_ms: u64,
    pub embedder_call_ms: u64,
    pub metadata_call_ms: u64,
    pub compressor_call_ms: u64,
    pub answer_call_ms: u64,
    pub full_ingest_ms: u64,
    pub full_retrieval_ms: u64,
}

impl Default for DeadlinesConfig {
    fn default() -> Self {
        Self {
            health_check_ms: 2_000,
            embedder_call_ms: 30_000,
            metadata_call_ms: 60_000,
            compressor_call_ms: 60_000,
            answer_call_ms: 60_000,
            full_ingest_ms: 120_000,
            full_retrieval_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub deadlines: DeadlinesConfig,
    /// Grace period for SIGTERM drain; bounded by the longest request
    /// deadline per §6.
    pub shutdown_grace_period_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            deadlines: DeadlinesConfig::default(),
            shutdown_grace_period_secs: 120,
        }
    }
}
