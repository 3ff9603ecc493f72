//! Provider-neutral embedding API: batches, caches, and L2-normalizes
//! vectors fetched through the gateway.

use ragforge_config::EmbeddingConfig;
use ragforge_core::Result;
use ragforge_gateway::{canonical_key, HealthReport, HealthStatus, LlmGateway, RateLimiter, ShardedCache};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Text → dense vector, with caching and L2 normalization layered over
/// the gateway's raw `embed` call.
pub struct Embedder {
    gateway: Arc<LlmGateway>,
    config: EmbeddingConfig,
    cache: ShardedCache<Vec<f32>>,
    limiter: RateLimiter,
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder").field("default_model", &self.config.default_model).finish_non_exhaustive()
    }
}

impl Embedder {
    #[must_use]
    pub fn new(gateway: Arc<LlmGateway>, config: EmbeddingConfig) -> Self {
        let cache = ShardedCache::new(config.cache_capacity, 16, Duration::from_secs(2 * 60 * 60));
        let limiter = RateLimiter::new("embedder.outbound", config.max_concurrent_calls);
        Self { gateway, config, cache, limiter }
    }

    /// Embed `texts`, batching outbound calls at `max_batch_size` and
    /// serving already-seen `(model, text)` pairs from cache.
    ///
    /// # Errors
    ///
    /// Propagates the gateway's `ModelUnknown`/provider/transport errors.
    pub async fn embed(
        &self,
        texts: &[String],
        model: Option<&str>,
        deadline: Duration,
    ) -> Result<Vec<Vec<f32>>> {
        let model = model.unwrap_or(&self.config.default_model);
        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut misses: Vec<usize> = Vec::new();

        for (index, text) in texts.iter().enumerate() {
            let key = canonical_key(&[model, text]);
            if let Some(vector) = self.cache.get(&key) {
                results[index] = Some(vector);
            } else {
                misses.push(index);
            }
        }

        for batch in misses.chunks(self.config.max_batch_size.max(1)) {
            let batch_texts: Vec<String> = batch.iter().map(|&i| texts[i].clone()).collect();
            let (_permit, _wait) = self
                .limiter
                .acquire_timed(deadline)
                .await
                .map_err(|()| ragforge_core::RagError::GatewayBusy)?;
            let vectors = self.gateway.embed(&batch_texts, model, deadline).await?;
            for (&index, vector) in batch.iter().zip(vectors.into_iter()) {
                let vector = if self.config.normalize { l2_normalize(vector) } else { vector };
                let key = canonical_key(&[model, &texts[index]]);
                self.cache.put(key, vector.clone());
                results[index] = Some(vector);
            }
        }

        Ok(results.into_iter().map(|v| v.expect("every index is filled from cache or a batch")).collect())
    }

    /// Probe the underlying gateway. Unreachable providers degrade the
    /// reported status but never fail the call outright.
    pub async fn health_check(&self) -> HealthReport {
        let report = self.gateway.health_check().await;
        debug!(status = ?report.status, "embedder health check");
        report
    }

    #[must_use]
    pub fn is_healthy(report: &HealthReport) -> bool {
        report.status != HealthStatus::Unhealthy
    }
}

fn l2_normalize(vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return vector;
    }
    vector.into_iter().map(|x| x / norm).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_normalize_produces_unit_vector() {
        let normalized = l2_normalize(vec![3.0, 4.0]);
        let norm: f32 = normalized.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn l2_normalize_leaves_zero_vector_untouched() {
        assert_eq!(l2_normalize(vec![0.0, 0.0]), vec![0.0, 0.0]);
    }
}
