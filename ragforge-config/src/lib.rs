//! Central configuration management for the RAGforge service.
//!
//! Layering order (lowest to highest precedence), following the teacher's
//! `llmspell-config` idiom of defaults → file → environment:
//!
//! 1. [`RagForgeConfig::default()`]
//! 2. An optional TOML file (`RAGFORGE_CONFIG` env var, or `ragforge.toml`
//!    in the current directory)
//! 3. `RAGFORGE_*` environment variable overrides for the handful of
//!    settings operators change most often (bind address, store backend,
//!    gateway concurrency)
//!
//! Config is read once at process start and frozen; nothing in this crate
//! mutates a loaded [`RagForgeConfig`] afterwards (§9 design note).

pub mod chunking;
pub mod embedding;
pub mod gateway;
pub mod metadata;
pub mod retrieval;
pub mod server;
pub mod store;

pub use chunking::{ChunkingConfig, ChunkingMethod};
pub use embedding::EmbeddingConfig;
pub use gateway::{GatewayConfig, ProviderConfig};
pub use metadata::MetadataConfig;
pub use retrieval::RetrievalConfig;
pub use server::{DeadlinesConfig, ServerConfig};
pub use store::{StoreBackendKind, StoreConfig};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// File search order when `RAGFORGE_CONFIG` is not set.
const CONFIG_SEARCH_PATHS: &[&str] = &["ragforge.toml", ".ragforge.toml", "config/ragforge.toml"];

/// Root configuration object, composed of one section per component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagForgeConfig {
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub metadata: MetadataConfig,
    pub gateway: GatewayConfig,
    pub store: StoreConfig,
    pub retrieval: RetrievalConfig,
    pub server: ServerConfig,
}

impl RagForgeConfig {
    /// Load configuration following the layering order documented above.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured file path exists but cannot be
    /// read or does not parse as valid TOML.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::discover_config_path() {
            debug!(path = %path.display(), "loading ragforge config file");
            config = Self::load_file(&path)?;
        } else {
            debug!("no config file found, using built-in defaults");
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load a specific TOML file, bypassing discovery. Useful for tests and
    /// explicit `--config` CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    fn discover_config_path() -> Option<std::path::PathBuf> {
        if let Ok(path) = std::env::var("RAGFORGE_CONFIG") {
            return Some(std::path::PathBuf::from(path));
        }
        CONFIG_SEARCH_PATHS
            .iter()
            .map(std::path::PathBuf::from)
            .find(|p| p.exists())
    }

    /// Apply the small set of environment variables operators are expected
    /// to reach for without editing a file.
    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("RAGFORGE_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Ok(backend) = std::env::var("RAGFORGE_STORE_BACKEND") {
            self.store.backend = match backend.as_str() {
                "http" => StoreBackendKind::Http,
                _ => StoreBackendKind::InMemory,
            };
        }
        if let Ok(url) = std::env::var("RAGFORGE_STORE_BASE_URL") {
            self.store.base_url = url;
        }
        if let Ok(n) = std::env::var("RAGFORGE_GATEWAY_MAX_CONCURRENT") {
            if let Ok(n) = n.parse() {
                self.gateway.max_concurrent_calls = n;
            }
        }
    }

    /// Clamp and sanity-check the loaded configuration.
    fn validate(&mut self) -> Result<()> {
        self.chunking = std::mem::take(&mut self.chunking).clamped();
        anyhow::ensure!(
            self.gateway.cache_shards >= 8,
            "gateway.cache_shards must be >= 8 per the locking discipline in §5"
        );
        anyhow::ensure!(
            self.retrieval.max_context_chunks <= self.retrieval.rerank_top_k.max(1)
                || !self.retrieval.enable_reranking,
            "retrieval.max_context_chunks should not exceed rerank_top_k when reranking is enabled"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        let mut config = RagForgeConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_file_roundtrips_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragforge.toml");
        std::fs::write(&path, "[server]\nbind_addr = \"127.0.0.1:9000\"\n").unwrap();
        let config = RagForgeConfig::load_file(&path).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
    }

    #[test]
    fn env_override_wins_over_file() {
        std::env::set_var("RAGFORGE_BIND_ADDR", "127.0.0.1:7000");
        let mut config = RagForgeConfig::default();
        config.apply_env_overrides();
        assert_eq!(config.server.bind_addr, "127.0.0.1:7000");
        std::env::remove_var("RAGFORGE_BIND_ADDR");
    }
}
