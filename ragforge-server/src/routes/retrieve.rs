//! `POST /v1/retrieve` (§6).

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use ragforge_core::{Answer, StageReports};
use ragforge_rag::RetrieveRequest;
use ragforge_store::SearchHit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RetrieveBody {
    pub query: String,
    pub collection_name: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub search_top_k: Option<usize>,
    #[serde(default)]
    pub rerank_top_k: Option<usize>,
    #[serde(default)]
    pub max_context_chunks: Option<usize>,
    #[serde(default)]
    pub enable_reranking: Option<bool>,
    #[serde(default)]
    pub enable_compression: Option<bool>,
    #[serde(default)]
    pub compression_ratio: Option<f32>,
    #[serde(default)]
    pub score_threshold: Option<f32>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub enable_citations: Option<bool>,
    #[serde(default)]
    pub use_metadata_boost: Option<bool>,
    #[serde(default)]
    pub embedding_model: Option<String>,
}

impl From<RetrieveBody> for RetrieveRequest {
    fn from(body: RetrieveBody) -> Self {
        Self {
            query: body.query,
            collection_name: body.collection_name,
            tenant_id: body.tenant_id,
            search_top_k: body.search_top_k,
            rerank_top_k: body.rerank_top_k,
            max_context_chunks: body.max_context_chunks,
            enable_reranking: body.enable_reranking,
            enable_compression: body.enable_compression,
            compression_ratio: body.compression_ratio,
            score_threshold: body.score_threshold,
            model: body.model,
            temperature: body.temperature,
            enable_citations: body.enable_citations,
            use_metadata_boost: body.use_metadata_boost,
            embedding_model: body.embedding_model,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RetrieveResponse {
    pub success: bool,
    pub answer: String,
    pub citations: Vec<ragforge_core::Citation>,
    pub context_chunks: Vec<SearchHit>,
    pub stages: StageReports,
    pub total_time_ms: u64,
    pub search_results_count: usize,
    pub reranked_count: usize,
    pub compressed_count: usize,
    pub context_count: usize,
}

impl From<ragforge_rag::RetrieveReport> for RetrieveResponse {
    fn from(report: ragforge_rag::RetrieveReport) -> Self {
        let Answer { text, citations } = report.answer;
        Self {
            success: true,
            answer: text,
            citations,
            context_chunks: report.context_chunks,
            stages: report.stages,
            total_time_ms: report.total_time_ms,
            search_results_count: report.search_results_count,
            reranked_count: report.reranked_count,
            compressed_count: report.compressed_count,
            context_count: report.context_count,
        }
    }
}

pub async fn retrieve(
    State(state): State<AppState>,
    Json(body): Json<RetrieveBody>,
) -> Result<Json<RetrieveResponse>, ApiError> {
    let _guard = state.begin_request()?;
    let report = state.retrieval.retrieve(body.into()).await?;
    Ok(Json(report.into()))
}
