//! `POST /v1/ingest`, `PUT /v1/documents/{id}`, `DELETE /v1/documents/{id}` (§6).

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use ragforge_config::ChunkingMethod;
use ragforge_rag::IngestRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Wire body shared by `POST /v1/ingest` and `PUT /v1/documents/{id}`;
/// the latter omits `document_id` since the path segment supplies it.
#[derive(Debug, Deserialize)]
pub struct IngestBody {
    pub text: String,
    #[serde(default)]
    pub document_id: Option<String>,
    pub collection_name: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub chunking_method: Option<ChunkingMethod>,
    #[serde(default)]
    pub max_chunk_size: Option<usize>,
    #[serde(default)]
    pub chunk_overlap: Option<usize>,
    #[serde(default)]
    pub separators: Option<Vec<String>>,
    #[serde(default)]
    pub markdown_headers: Option<Vec<String>>,
    #[serde(default)]
    pub generate_metadata: Option<bool>,
    #[serde(default)]
    pub keywords_count: Option<usize>,
    #[serde(default)]
    pub topics_count: Option<usize>,
    #[serde(default)]
    pub questions_count: Option<usize>,
    #[serde(default)]
    pub summary_length: Option<String>,
    #[serde(default)]
    pub generate_embeddings: Option<bool>,
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default)]
    pub storage_mode: Option<String>,
}

impl IngestBody {
    fn into_request(self, document_id: String) -> IngestRequest {
        IngestRequest {
            document_id,
            tenant_id: self.tenant_id.unwrap_or_else(|| "default".to_string()),
            collection_name: self.collection_name,
            text: self.text,
            chunking_method: self.chunking_method,
            max_chunk_size: self.max_chunk_size,
            chunk_overlap: self.chunk_overlap,
            separators: self.separators,
            markdown_headers: self.markdown_headers,
            generate_metadata: self.generate_metadata,
            keywords_count: self.keywords_count,
            topics_count: self.topics_count,
            questions_count: self.questions_count,
            summary_length: self.summary_length,
            generate_embeddings: self.generate_embeddings,
            embedding_model: self.embedding_model,
            storage_mode: self.storage_mode,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub document_id: String,
    pub collection_name: String,
    pub chunks_created: usize,
    pub chunks_inserted: usize,
    pub processing_time_ms: u64,
    pub stages: ragforge_core::StageReports,
}

impl From<ragforge_rag::IngestReport> for IngestResponse {
    fn from(report: ragforge_rag::IngestReport) -> Self {
        Self {
            success: true,
            document_id: report.document_id,
            collection_name: report.collection_name,
            chunks_created: report.chunks_created,
            chunks_inserted: report.chunks_inserted,
            processing_time_ms: report.processing_time_ms,
            stages: report.stages,
        }
    }
}

pub async fn ingest(
    State(state): State<AppState>,
    Json(body): Json<IngestBody>,
) -> Result<Json<IngestResponse>, ApiError> {
    let _guard = state.begin_request()?;
    let document_id = body
        .document_id
        .clone()
        .ok_or_else(|| ApiError(ragforge_core::RagError::InvalidRequest {
            message: "document_id is required".to_string(),
        }))?;
    let request = body.into_request(document_id);
    let report = state.ingestion.ingest(request).await?;
    Ok(Json(report.into()))
}

pub async fn update_document(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
    Json(body): Json<IngestBody>,
) -> Result<Json<IngestResponse>, ApiError> {
    let _guard = state.begin_request()?;
    let request = body.into_request(document_id);
    let report = state.ingestion.update_document(request).await?;
    Ok(Json(report.into()))
}

#[derive(Debug, Serialize)]
pub struct DeleteDocumentResponse {
    pub success: bool,
    pub deleted_chunks: usize,
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<DeleteDocumentResponse>, ApiError> {
    let _guard = state.begin_request()?;
    let collection_name = params.get("collection_name").ok_or_else(|| {
        ApiError(ragforge_core::RagError::InvalidRequest {
            message: "collection_name query parameter is required".to_string(),
        })
    })?;
    let tenant_id = params.get("tenant_id").map(String::as_str);
    let deleted = state
        .ingestion
        .delete_document(collection_name, &document_id, tenant_id)
        .await?;
    Ok(Json(DeleteDocumentResponse { success: true, deleted_chunks: deleted }))
}
