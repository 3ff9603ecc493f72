//! Wire-level request/response shapes.
//!
//! All inter-component and provider calls are JSON over HTTP/1.1
//! keep-alive per §6; the exact vendor schema is out of scope (the
//! providers themselves are external collaborators), so these are a
//! single OpenAI-compatible-ish shape reused across the three provider
//! families the gateway multiplexes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A `complete()` request (§4.2).
#[derive(Debug, Clone, Serialize)]
pub struct CompleteRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompleteResponse {
    pub text: String,
    /// True when served from the response cache rather than upstream.
    #[serde(default)]
    pub cached: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChatChoice {
    pub message: WireChatMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChatMessage {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChatCompletion {
    pub choices: Vec<WireChatChoice>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireEmbedRequest<'a> {
    pub model: &'a str,
    pub input: &'a [String],
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEmbedDatum {
    pub embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEmbedResponse {
    pub data: Vec<WireEmbedDatum>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireRerankRequest<'a> {
    pub model: &'a str,
    pub query: &'a str,
    pub documents: &'a [String],
    pub top_n: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireRerankResult {
    pub index: usize,
    pub relevance_score: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireRerankResponse {
    pub results: Vec<WireRerankResult>,
}

/// One scored candidate returned by `rerank()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankOutcome {
    pub index: usize,
    pub score: f32,
}

/// Gateway-wide health snapshot (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub uptime_seconds: u64,
    pub dependencies: std::collections::HashMap<String, HealthStatus>,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}
