//! The LLM Gateway: the single egress point for chat-completion,
//! embedding, and rerank traffic (§4.2).

use crate::cache::{canonical_key, ShardedCache};
use crate::limiter::RateLimiter;
use crate::model::{resolve_model, ModelKind, Provider};
use crate::transport::{
    ChatMessage, CompleteRequest, CompleteResponse, HealthReport, HealthStatus, RerankOutcome,
    WireChatRequest, WireChatCompletion, WireEmbedRequest, WireEmbedResponse, WireRerankRequest,
    WireRerankResponse,
};
use ragforge_config::GatewayConfig;
use ragforge_core::RagError;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Single entry point through which Metadata, Compressor, Answer, and
/// Intent talk to any supported provider (§1, §4.2). Holds every provider
/// API key; no other component is allowed to.
pub struct LlmGateway {
    config: GatewayConfig,
    clients: HashMap<Provider, reqwest::Client>,
    budget: RateLimiter,
    response_cache: ShardedCache<String>,
    started_at: Instant,
}

impl std::fmt::Debug for LlmGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmGateway")
            .field("providers", &self.clients.keys().map(Provider::as_str).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl LlmGateway {
    /// Build the gateway. Per-provider `reqwest::Client`s are created once
    /// here and live for the process's lifetime (§9: HTTP clients are
    /// per-process singletons, created at startup and torn down at
    /// shutdown — never closed from a probe path).
    ///
    /// # Panics
    ///
    /// Panics if a provider's pool configuration cannot be turned into a
    /// valid `reqwest::Client` (malformed timeout is the only realistic
    /// cause, and that indicates a broken config that should fail fast at
    /// startup rather than surface as a runtime error deep in a request).
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        let mut clients = HashMap::new();
        for provider in [Provider::Jina, Provider::Nebius, Provider::SambaNova, Provider::Bge] {
            let provider_config = config.providers.get(provider.as_str()).cloned().unwrap_or_default();
            let client = reqwest::Client::builder()
                .pool_max_idle_per_host(provider_config.pool_keepalive)
                .timeout(Duration::from_millis(provider_config.request_timeout_ms))
                .build()
                .expect("provider HTTP client configuration must be valid");
            clients.insert(provider, client);
        }

        let response_cache = ShardedCache::new(
            config.cache_capacity,
            config.cache_shards,
            Duration::from_secs(config.cache_ttl_secs),
        );
        let budget = RateLimiter::new("gateway.outbound", config.max_concurrent_calls);

        Self {
            config,
            clients,
            budget,
            response_cache,
            started_at: Instant::now(),
        }
    }

    fn client_for(&self, provider: Provider) -> &reqwest::Client {
        self.clients
            .get(&provider)
            .expect("all four providers are constructed in LlmGateway::new")
    }

    fn provider_config(&self, provider: Provider) -> ragforge_config::ProviderConfig {
        self.config.providers.get(provider.as_str()).cloned().unwrap_or_default()
    }

    fn api_key(&self, provider: Provider) -> Option<String> {
        let config = self.provider_config(provider);
        if config.api_key_env.is_empty() {
            return None;
        }
        std::env::var(&config.api_key_env).ok()
    }

    /// Run `f` with the retry policy of §7: one retry on
    /// `UpstreamTimeout`/`RateLimited` with exponential backoff from
    /// `config.retry_backoff_ms`; no retry on `InvalidResponse` or
    /// `ModelUnknown`.
    async fn with_retry<F, Fut, T>(&self, mut f: F) -> Result<T, RagError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, RagError>>,
    {
        let mut attempt = 0usize;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.config.retry_backoff_ms.len() => {
                    let backoff = self.config.retry_backoff_ms[attempt];
                    warn!(attempt, backoff_ms = backoff, error = %err, "retrying gateway call");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Issue a chat-completion request. Response cache is keyed by the
    /// SHA-256 of `(model, temperature, messages)` (§4.2).
    ///
    /// # Errors
    ///
    /// Returns `ModelUnknown` if `request.model` is not registered,
    /// `GatewayBusy` if the outbound budget is exhausted within
    /// `deadline`, or a provider/transport error otherwise.
    pub async fn complete(
        &self,
        request: CompleteRequest,
        deadline: Duration,
    ) -> Result<CompleteResponse, RagError> {
        let spec = resolve_model(&request.model)?;
        if !matches!(spec.kind, ModelKind::Chat { .. }) {
            return Err(RagError::InvalidRequest {
                message: format!("model {} is not a chat-completion model", request.model),
            });
        }

        let messages_repr = request
            .messages
            .iter()
            .map(|m| format!("{:?}:{}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\u{1}");
        let cache_key = canonical_key(&[&request.model, &request.temperature.to_string(), &messages_repr]);

        if let Some(text) = self.response_cache.get(&cache_key) {
            debug!(model = request.model, "gateway cache hit");
            return Ok(CompleteResponse { text, cached: true });
        }

        let (_permit, _wait) = self
            .budget
            .acquire_timed(deadline)
            .await
            .map_err(|()| RagError::GatewayBusy)?;

        let provider_config = self.provider_config(spec.provider);
        let url = format!("{}{}", provider_config.base_url, spec.endpoint_path);
        let api_key = self.api_key(spec.provider);
        let client = self.client_for(spec.provider);

        let text = self
            .with_retry(|| async {
                let wire = WireChatRequest {
                    model: &request.model,
                    messages: &request.messages,
                    temperature: request.temperature,
                };
                let mut builder = client.post(&url).json(&wire);
                if let Some(key) = &api_key {
                    builder = builder.bearer_auth(key);
                }
                let response = builder.send().await.map_err(transport_error)?;
                let status = response.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    return Err(RagError::RateLimited {
                        provider: spec.provider.as_str().to_string(),
                    });
                }
                if status.is_server_error() {
                    return Err(RagError::ProviderUnavailable {
                        provider: spec.provider.as_str().to_string(),
                        message: status.to_string(),
                    });
                }
                if !status.is_success() {
                    return Err(RagError::InvalidResponse {
                        message: format!("unexpected status {status}"),
                    });
                }
                let body: WireChatCompletion = response.json().await.map_err(|e| RagError::InvalidResponse {
                    message: e.to_string(),
                })?;
                body.choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .ok_or_else(|| RagError::InvalidResponse {
                        message: "empty choices array".to_string(),
                    })
            })
            .await?;

        self.response_cache.put(cache_key, text.clone());
        Ok(CompleteResponse { text, cached: false })
    }

    /// Generate embeddings for a batch of texts (§4.3's wire boundary; the
    /// embedder crate owns caching/normalization/failover on top of this).
    ///
    /// # Errors
    ///
    /// Returns `ModelUnknown` if `model` is not an embedding model, or a
    /// provider/transport error otherwise.
    pub async fn embed(
        &self,
        texts: &[String],
        model: &str,
        deadline: Duration,
    ) -> Result<Vec<Vec<f32>>, RagError> {
        let spec = resolve_model(model)?;
        let ModelKind::Embedding { dimension } = spec.kind else {
            return Err(RagError::InvalidRequest {
                message: format!("model {model} is not an embedding model"),
            });
        };

        let (_permit, _wait) = self
            .budget
            .acquire_timed(deadline)
            .await
            .map_err(|()| RagError::GatewayBusy)?;

        let provider_config = self.provider_config(spec.provider);
        let url = format!("{}{}", provider_config.base_url, spec.endpoint_path);
        let api_key = self.api_key(spec.provider);
        let client = self.client_for(spec.provider);

        let vectors = self
            .with_retry(|| async {
                let wire = WireEmbedRequest { model, input: texts };
                let mut builder = client.post(&url).json(&wire);
                if let Some(key) = &api_key {
                    builder = builder.bearer_auth(key);
                }
                let response = builder.send().await.map_err(transport_error)?;
                let status = response.status();
                if !status.is_success() {
                    return Err(status_error(status, spec.provider));
                }
                let body: WireEmbedResponse = response.json().await.map_err(|e| RagError::InvalidResponse {
                    message: e.to_string(),
                })?;
                Ok(body.data.into_iter().map(|d| d.embedding).collect::<Vec<_>>())
            })
            .await?;

        for vector in &vectors {
            if vector.len() != dimension {
                return Err(RagError::InvalidResponse {
                    message: format!(
                        "embedding model {model} returned {}-dim vector, expected {dimension}",
                        vector.len()
                    ),
                });
            }
        }

        Ok(vectors)
    }

    /// Rerank `docs` against `query`, returning the `top_k` highest-scoring
    /// (index, score) pairs sorted descending (§4.9's wire boundary).
    ///
    /// # Errors
    ///
    /// Returns `ModelUnknown` if `model` is not a rerank model, or a
    /// provider/transport error otherwise.
    pub async fn rerank(
        &self,
        query: &str,
        docs: &[String],
        top_k: usize,
        model: &str,
        deadline: Duration,
    ) -> Result<Vec<RerankOutcome>, RagError> {
        let spec = resolve_model(model)?;
        if !matches!(spec.kind, ModelKind::Rerank) {
            return Err(RagError::InvalidRequest {
                message: format!("model {model} is not a rerank model"),
            });
        }

        let (_permit, _wait) = self
            .budget
            .acquire_timed(deadline)
            .await
            .map_err(|()| RagError::GatewayBusy)?;

        let provider_config = self.provider_config(spec.provider);
        let url = format!("{}{}", provider_config.base_url, spec.endpoint_path);
        let api_key = self.api_key(spec.provider);
        let client = self.client_for(spec.provider);

        self.with_retry(|| async {
            let wire = WireRerankRequest {
                model,
                query,
                documents: docs,
                top_n: top_k,
            };
            let mut builder = client.post(&url).json(&wire);
            if let Some(key) = &api_key {
                builder = builder.bearer_auth(key);
            }
            let response = builder.send().await.map_err(transport_error)?;
            let status = response.status();
            if !status.is_success() {
                return Err(status_error(status, spec.provider));
            }
            let body: WireRerankResponse = response.json().await.map_err(|e| RagError::InvalidResponse {
                message: e.to_string(),
            })?;
            let mut results: Vec<RerankOutcome> = body
                .results
                .into_iter()
                .map(|r| RerankOutcome {
                    index: r.index,
                    score: r.relevance_score,
                })
                .collect();
            results.sort_by(|a, b| b.score.total_cmp(&a.score));
            results.truncate(top_k);
            Ok(results)
        })
        .await
    }

    /// Clear the response cache. Exposed for operational use and tests.
    pub fn clear_cache(&self) {
        self.response_cache.clear();
    }

    /// Probe each configured provider with a cheap request under a 2s
    /// timeout (§6). Unreachable providers are reported `degraded`, never
    /// abort the overall check.
    pub async fn health_check(&self) -> HealthReport {
        let mut dependencies = HashMap::new();
        for provider in [Provider::Jina, Provider::Nebius, Provider::SambaNova, Provider::Bge] {
            let config = self.provider_config(provider);
            let client = self.client_for(provider);
            let status = probe_provider(client, &config.base_url).await;
            dependencies.insert(provider.as_str().to_string(), status);
        }

        let status = if dependencies.values().any(|s| *s == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if dependencies.values().any(|s| *s == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        let (hits, misses) = self.response_cache.stats();
        HealthReport {
            status,
            uptime_seconds: self.started_at.elapsed().as_secs(),
            dependencies,
            cache_hits: hits,
            cache_misses: misses,
        }
    }
}

async fn probe_provider(client: &reqwest::Client, base_url: &str) -> HealthStatus {
    if base_url.is_empty() {
        return HealthStatus::Degraded;
    }
    let result = tokio::time::timeout(Duration::from_secs(2), client.get(base_url).send()).await;
    match result {
        Ok(Ok(response)) if response.status().is_success() || response.status().is_client_error() => {
            HealthStatus::Healthy
        }
        Ok(Ok(_)) => HealthStatus::Degraded,
        _ => HealthStatus::Degraded,
    }
}

fn transport_error(err: reqwest::Error) -> RagError {
    if err.is_timeout() {
        RagError::UpstreamTimeout { elapsed_ms: 0 }
    } else {
        RagError::InvalidResponse { message: err.to_string() }
    }
}

fn status_error(status: reqwest::StatusCode, provider: Provider) -> RagError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        RagError::RateLimited {
            provider: provider.as_str().to_string(),
        }
    } else if status.is_server_error() {
        RagError::ProviderUnavailable {
            provider: provider.as_str().to_string(),
            message: status.to_string(),
        }
    } else {
        RagError::InvalidResponse {
            message: format!("unexpected status {status}"),
        }
    }
}

/// Strip `<think>...</think>` spans from model output. `complete` returns
/// provider text untouched; only `AnswerGenerator` calls this today, which
/// is where reasoning-model output is actually rendered to an end user.
#[must_use]
pub fn strip_think_tags(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        match rest.find("<think>") {
            Some(start) => {
                result.push_str(&rest[..start]);
                match rest[start..].find("</think>") {
                    Some(end_rel) => {
                        let end = start + end_rel + "</think>".len();
                        rest = &rest[end..];
                    }
                    None => {
                        // Unterminated tag: drop the remainder rather than
                        // leaking partial reasoning into the answer.
                        rest = "";
                    }
                }
            }
            None => {
                result.push_str(rest);
                break;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_think_tags_removes_single_span() {
        let input = "<think>internal reasoning</think>The answer is 42.";
        assert_eq!(strip_think_tags(input), "The answer is 42.");
    }

    #[test]
    fn strip_think_tags_removes_multiple_spans() {
        let input = "a<think>x</think>b<think>y</think>c";
        assert_eq!(strip_think_tags(input), "abc");
    }

    #[test]
    fn strip_think_tags_is_noop_without_tags() {
        assert_eq!(strip_think_tags("plain text"), "plain text");
    }

    #[test]
    fn strip_think_tags_drops_unterminated_span() {
        assert_eq!(strip_think_tags("before<think>dangling"), "before");
    }
}
