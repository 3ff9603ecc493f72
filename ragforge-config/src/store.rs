//! Vector Store Facade configuration (§4.1).

use serde::{Deserialize, Serialize};

/// Which `VectorBackend` the facade should construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackendKind {
    /// In-process reference backend; default for local dev and tests.
    #[default]
    InMemory,
    /// Milvus-like REST collection API over HTTP/1.1 keep-alive JSON.
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackendKind,
    /// Base URL of the backing store, used only when `backend == Http`.
    pub base_url: String,
    /// Shared connection pool size (§5: ≤10 clients).
    pub pool_size: usize,
    pub request_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackendKind::InMemory,
            base_url: "http://localhost:19121".to_string(),
            pool_size: 10,
            request_timeout_ms: 10_000,
        }
    }
}
