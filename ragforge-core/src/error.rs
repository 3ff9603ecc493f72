//! Unified error taxonomy for the ingestion and retrieval pipelines.

use thiserror::Error;

/// Top-level error enum shared across `ragforge-*` crates.
///
/// Individual crates may define narrower leaf errors (`StoreError`,
/// `GatewayError`) and convert into this enum at orchestration boundaries,
/// the way the teacher's `LLMSpellError` is the single currency components
/// convert into once they cross a crate seam.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("collection not found: {name}")]
    CollectionNotFound { name: String },

    #[error("collection already exists: {name}")]
    CollectionExists { name: String },

    #[error("dimension mismatch: collection {collection} expects {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    #[error("document produced zero chunks: {document_id}")]
    EmptyDocument { document_id: String },

    #[error("chunking failed: {message}")]
    ChunkingFailed { message: String },

    #[error("model unknown: {model}")]
    ModelUnknown { model: String },

    #[error("provider unavailable: {provider}: {message}")]
    ProviderUnavailable { provider: String, message: String },

    #[error("rate limited by provider {provider}")]
    RateLimited { provider: String },

    #[error("gateway busy, outbound concurrency budget exhausted")]
    GatewayBusy,

    #[error("upstream timed out after {elapsed_ms}ms")]
    UpstreamTimeout { elapsed_ms: u64 },

    #[error("invalid upstream response: {message}")]
    InvalidResponse { message: String },

    #[error("vector store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("invalid filter expression: {expr}")]
    InvalidFilter { expr: String },

    #[error("request cancelled: {reason}")]
    RequestCancelled { reason: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl RagError {
    /// Whether retrying the same request with backoff is expected to help.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. } | Self::RateLimited { .. } | Self::UpstreamTimeout { .. }
        )
    }

    /// Convenience constructor for ad hoc internal-error conversions.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Convenience Result alias used at crate seams.
pub type Result<T> = std::result::Result<T, RagError>;
