//! The Retrieval Orchestrator: Intent ∥ Search → Rerank → Compress? →
//! Answer (§4.12).

use crate::answer::AnswerGenerator;
use crate::compressor::Compressor;
use crate::intent::IntentClassifier;
use crate::reranker::Reranker;
use crate::search::Search;
use ragforge_config::{DeadlinesConfig, RetrievalConfig};
use ragforge_core::{Answer, Result, StageReport, StageReports};
use ragforge_gateway::RateLimiter;
use ragforge_store::SearchHit;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Request shape mirroring §6's `POST /v1/retrieve` body.
#[derive(Debug, Clone)]
pub struct RetrieveRequest {
    pub query: String,
    pub collection_name: String,
    pub tenant_id: Option<String>,
    pub search_top_k: Option<usize>,
    pub rerank_top_k: Option<usize>,
    pub max_context_chunks: Option<usize>,
    pub enable_reranking: Option<bool>,
    pub enable_compression: Option<bool>,
    pub compression_ratio: Option<f32>,
    pub score_threshold: Option<f32>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub enable_citations: Option<bool>,
    pub use_metadata_boost: Option<bool>,
    pub embedding_model: Option<String>,
}

/// `{answer, citations, contextChunks, stages, totalMs, counts per stage}`.
#[derive(Debug, Clone)]
pub struct RetrieveReport {
    pub answer: Answer,
    pub context_chunks: Vec<SearchHit>,
    pub stages: StageReports,
    pub total_time_ms: u64,
    pub search_results_count: usize,
    pub reranked_count: usize,
    pub compressed_count: usize,
    pub context_count: usize,
}

pub struct RetrievalOrchestrator {
    intent: Arc<IntentClassifier>,
    search: Arc<Search>,
    reranker: Arc<Reranker>,
    compressor: Arc<Compressor>,
    answer: Arc<AnswerGenerator>,
    config: RetrievalConfig,
    deadlines: DeadlinesConfig,
    /// Concurrent full-retrieval cap (§5: default 20).
    limiter: RateLimiter,
}

impl std::fmt::Debug for RetrievalOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalOrchestrator").finish_non_exhaustive()
    }
}

impl RetrievalOrchestrator {
    #[must_use]
    pub fn new(
        intent: Arc<IntentClassifier>,
        search: Arc<Search>,
        reranker: Arc<Reranker>,
        compressor: Arc<Compressor>,
        answer: Arc<AnswerGenerator>,
        config: RetrievalConfig,
        deadlines: DeadlinesConfig,
    ) -> Self {
        let limiter = RateLimiter::new("retrieval.concurrent", config.max_concurrent_retrievals);
        Self { intent, search, reranker, compressor, answer, config, deadlines, limiter }
    }

    /// Run the full retrieval flow (§4.12 steps 1-6).
    ///
    /// # Errors
    ///
    /// Returns an error if Search or Answer fail (fatal per §7), or if
    /// the concurrent-retrieval budget is exhausted past the request
    /// deadline.
    pub async fn retrieve(&self, request: RetrieveRequest) -> Result<RetrieveReport> {
        let overall_deadline = Duration::from_millis(self.deadlines.full_retrieval_ms);
        let (_permit, _wait) = self
            .limiter
            .acquire_timed(overall_deadline)
            .await
            .map_err(|()| ragforge_core::RagError::GatewayBusy)?;

        let start = Instant::now();
        let mut stages = StageReports::new();

        let search_top_k = request.search_top_k.unwrap_or(self.config.search_top_k);
        let rerank_top_k = request.rerank_top_k.unwrap_or(self.config.rerank_top_k);
        let max_context_chunks = request.max_context_chunks.unwrap_or(self.config.max_context_chunks);
        let enable_reranking = request.enable_reranking.unwrap_or(self.config.enable_reranking);
        let enable_compression = request.enable_compression.unwrap_or(self.config.enable_compression);
        let compression_ratio = request.compression_ratio.unwrap_or(self.config.compression_ratio);
        let score_threshold = request.score_threshold.unwrap_or(self.config.score_threshold);
        let enable_citations = request.enable_citations.unwrap_or(self.config.enable_citations);
        let use_metadata_boost = request.use_metadata_boost.unwrap_or(self.config.use_metadata_boost);
        let temperature = request.temperature.unwrap_or(self.config.temperature);

        // Step 1: Intent runs concurrently with Stage 1 (Search); both
        // share the request deadline. Intent is best-effort (§4.12 step 1).
        let intent_future = self.intent.classify(&request.query, overall_deadline);
        let search_future = self.search.search(
            &request.query,
            &request.collection_name,
            request.tenant_id.as_deref(),
            search_top_k,
            use_metadata_boost,
            request.embedding_model.as_deref(),
            overall_deadline,
        );

        let intent_start = Instant::now();
        let search_start = Instant::now();
        let (intent, search_result) = tokio::join!(intent_future, search_future);
        let intent_elapsed = intent_start.elapsed();

        let search_hits = match search_result {
            Ok(hits) => hits,
            Err(err) => {
                stages.insert("search".to_string(), StageReport::failed(search_start.elapsed().as_millis() as u64));
                warn!(error = %err, "search failed, aborting retrieval");
                return Err(err);
            }
        };
        let search_results_count = search_hits.len();
        stages.insert(
            "search".to_string(),
            StageReport::ok(search_start.elapsed().as_millis() as u64)
                .with_metadata("count".to_string(), search_results_count.into()),
        );
        stages.insert(
            "intent".to_string(),
            StageReport::ok(intent_elapsed.as_millis() as u64)
                .with_metadata("intent".to_string(), intent.label.as_str().into())
                .with_metadata("confidence".to_string(), serde_json::json!(intent.confidence)),
        );

        // Step 2 (Rerank): reduce to rerank_top_k (§4.12 step 3). Degraded
        // on failure, never fatal.
        let rerank_start = Instant::now();
        let (reranked, rerank_success) = if enable_reranking {
            let candidates: Vec<SearchHit> =
                search_hits.into_iter().take(self.config.reranker_max_candidates).collect();
            self.reranker.rerank(&request.query, candidates, rerank_top_k, overall_deadline).await
        } else {
            let mut hits = search_hits;
            hits.truncate(rerank_top_k);
            (hits, true)
        };
        let reranked_count = reranked.len();
        stages.insert(
            "reranking".to_string(),
            if !enable_reranking {
                StageReport::skipped()
            } else if rerank_success {
                StageReport::ok(rerank_start.elapsed().as_millis() as u64)
            } else {
                StageReport::failed(rerank_start.elapsed().as_millis() as u64)
            },
        );

        // Step 3 (Compress, default off): degraded on failure, never fatal.
        let compress_start = Instant::now();
        let compress_deadline = Duration::from_millis(self.deadlines.compressor_call_ms);
        let (compressed, compressed_count) = if enable_compression {
            let (compressed, success) = self
                .compressor
                .compress(&request.query, reranked, compression_ratio, score_threshold, compress_deadline)
                .await;
            let count = compressed.len();
            stages.insert(
                "compression".to_string(),
                if success {
                    StageReport::ok(compress_start.elapsed().as_millis() as u64)
                } else {
                    StageReport::failed(compress_start.elapsed().as_millis() as u64)
                },
            );
            (compressed, count)
        } else {
            stages.insert("compression".to_string(), StageReport::skipped());
            let count = reranked.len();
            (reranked, count)
        };

        // Step 4 (Answer): at most max_context_chunks from the stage-3
        // output (§4.12 step 5).
        let context_chunks: Vec<SearchHit> = compressed.into_iter().take(max_context_chunks).collect();
        let context_count = context_chunks.len();

        let answer_start = Instant::now();
        let answer_deadline = Duration::from_millis(self.deadlines.answer_call_ms);
        let answer_result = self
            .answer
            .generate(
                &request.query,
                &intent,
                &context_chunks,
                request.model.as_deref(),
                temperature,
                enable_citations,
                answer_deadline,
            )
            .await;

        let answer = match answer_result {
            Ok(answer) => {
                stages.insert("answer".to_string(), StageReport::ok(answer_start.elapsed().as_millis() as u64));
                answer
            }
            Err(err) => {
                stages.insert("answer".to_string(), StageReport::failed(answer_start.elapsed().as_millis() as u64));
                warn!(error = %err, "answer generation failed, aborting retrieval");
                return Err(err);
            }
        };

        info!(
            collection = request.collection_name,
            intent = intent.label.as_str(),
            context_count,
            "retrieval completed"
        );

        Ok(RetrieveReport {
            answer,
            context_chunks,
            stages,
            total_time_ms: start.elapsed().as_millis() as u64,
            search_results_count,
            reranked_count,
            compressed_count,
            context_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieve_request_defaults_are_overridable() {
        let request = RetrieveRequest {
            query: "q".to_string(),
            collection_name: "c".to_string(),
            tenant_id: None,
            search_top_k: Some(5),
            rerank_top_k: None,
            max_context_chunks: None,
            enable_reranking: Some(false),
            enable_compression: None,
            compression_ratio: None,
            score_threshold: None,
            model: None,
            temperature: None,
            enable_citations: None,
            use_metadata_boost: None,
            embedding_model: None,
        };
        assert_eq!(request.search_top_k, Some(5));
        assert_eq!(request.enable_reranking, Some(false));
    }
}
