//! The single egress point for every provider call the system makes:
//! chat completion, embedding, and reranking, plus the caching, rate
//! budgeting, and provider registry behind them (§1, §4.2).

#![warn(missing_debug_implementations)]

pub mod cache;
pub mod gateway;
pub mod limiter;
pub mod model;
pub mod transport;

pub use cache::{canonical_key, ShardedCache};
pub use gateway::{strip_think_tags, LlmGateway};
pub use limiter::RateLimiter;
pub use model::{normalize_model_id, resolve_model, ModelKind, ModelSpec, ModelTier, Provider};
pub use transport::{
    ChatMessage, ChatRole, CompleteRequest, CompleteResponse, HealthReport, HealthStatus,
    RerankOutcome,
};
