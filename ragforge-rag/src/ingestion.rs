//! The Ingestion Orchestrator: composes Chunker → Metadata Extractor ∥
//! Embedder → Vector Store for one document (§4.6).

use crate::chunker;
use crate::embedding::Embedder;
use crate::metadata::{MetadataExtractor, MetadataOverrides};
use chrono::Utc;
use ragforge_config::{ChunkingConfig, ChunkingMethod, DeadlinesConfig};
use ragforge_core::{Chunk, RagError, Result, StageReport, StageReports};
use ragforge_store::VectorStoreFacade;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// §3's `document_id`/`tenant_id` length bound.
const MAX_ID_LEN: usize = 100;
/// §3's per-chunk `text` upper bound.
const MAX_CHUNK_TEXT_LEN: usize = 65_535;

/// Request shape mirroring §6's `POST /v1/ingest` body. The HTTP layer
/// maps its JSON body onto this type; `document_id` is omitted by
/// `PUT /v1/documents/{id}` (the id comes from the path there instead).
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub document_id: String,
    pub tenant_id: String,
    pub collection_name: String,
    pub text: String,
    pub chunking_method: Option<ChunkingMethod>,
    pub max_chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub separators: Option<Vec<String>>,
    pub markdown_headers: Option<Vec<String>>,
    /// `generateMetadata` toggle (§4.4); `None` defers to config default.
    pub generate_metadata: Option<bool>,
    /// Per-request overrides for the extraction prompt's requested counts
    /// (§6's `keywordsCount`/`topicsCount`/`questionsCount`); `None` defers
    /// to `MetadataConfig`'s defaults.
    pub keywords_count: Option<usize>,
    pub topics_count: Option<usize>,
    pub questions_count: Option<usize>,
    /// `summaryLength` override, e.g. `"one sentence"` or `"2-3 sentences"`.
    pub summary_length: Option<String>,
    /// `None` defers to config default; generating embeddings is required
    /// for the chunks to ever become searchable, so `Some(false)` skips
    /// the Embedder and Vector Store stages entirely (chunking-only dry
    /// run), returning `chunks_inserted = 0`.
    pub generate_embeddings: Option<bool>,
    pub embedding_model: Option<String>,
    /// `"strict"` fails instead of auto-creating a missing collection;
    /// any other value (including `None`) auto-creates on first insert,
    /// per §4.1's `createIfMissing` flag.
    pub storage_mode: Option<String>,
}

impl IngestRequest {
    fn create_if_missing(&self) -> bool {
        !matches!(self.storage_mode.as_deref(), Some("strict"))
    }

    fn chunking_config(&self, base: &ChunkingConfig) -> ChunkingConfig {
        let mut config = base.clone();
        if let Some(method) = self.chunking_method {
            config.method = method;
        }
        if let Some(max_size) = self.max_chunk_size {
            config.max_size = max_size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.overlap = overlap;
        }
        if let Some(separators) = &self.separators {
            config.separators = separators.clone();
        }
        if let Some(headers) = &self.markdown_headers {
            config.markdown_headers = headers.clone();
        }
        config.clamped()
    }

    fn metadata_overrides(&self) -> MetadataOverrides {
        MetadataOverrides {
            keywords_count: self.keywords_count,
            topics_count: self.topics_count,
            questions_count: self.questions_count,
            summary_length: self.summary_length.clone(),
        }
    }
}

/// `{chunksCreated, chunksInserted, totalTimeMs}` plus the per-stage
/// report map every orchestrator response carries (§3, §4.6).
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub document_id: String,
    pub collection_name: String,
    pub chunks_created: usize,
    pub chunks_inserted: usize,
    pub processing_time_ms: u64,
    pub stages: StageReports,
}

pub struct IngestionOrchestrator {
    chunking_config: ChunkingConfig,
    metadata: Arc<MetadataExtractor>,
    embedder: Arc<Embedder>,
    store: Arc<VectorStoreFacade>,
    deadlines: DeadlinesConfig,
}

impl std::fmt::Debug for IngestionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionOrchestrator").finish_non_exhaustive()
    }
}

impl IngestionOrchestrator {
    #[must_use]
    pub fn new(
        chunking_config: ChunkingConfig,
        metadata: Arc<MetadataExtractor>,
        embedder: Arc<Embedder>,
        store: Arc<VectorStoreFacade>,
        deadlines: DeadlinesConfig,
    ) -> Self {
        Self { chunking_config, metadata, embedder, store, deadlines }
    }

    /// Run the full ingest flow for one document (§4.6 steps 1-5).
    ///
    /// # Errors
    ///
    /// Returns `EmptyDocument` if chunking yields zero pieces, or
    /// propagates a fatal Embedder/Vector Store error. Metadata failures
    /// degrade to empty fields and never fail the call.
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestReport> {
        validate_ids(&request.document_id, &request.tenant_id)?;

        let start = Instant::now();
        let mut stages = StageReports::new();

        // Stage 1: chunking.
        let chunk_start = Instant::now();
        let config = request.chunking_config(&self.chunking_config);
        let drafts = chunker::split(&request.text, &config)?;
        if drafts.is_empty() {
            return Err(RagError::EmptyDocument { document_id: request.document_id });
        }
        if let Some(oversized) = drafts.iter().position(|d| d.char_count > MAX_CHUNK_TEXT_LEN) {
            return Err(RagError::InvalidRequest {
                message: format!(
                    "chunk {oversized} of document {} is {} characters, exceeding the {MAX_CHUNK_TEXT_LEN}-character bound",
                    request.document_id, drafts[oversized].char_count
                ),
            });
        }
        stages.insert(
            "chunking".to_string(),
            StageReport::ok(chunk_start.elapsed().as_millis() as u64)
                .with_metadata("chunk_count".to_string(), drafts.len().into()),
        );
        let texts: Vec<String> = drafts.iter().map(|d| d.text.clone()).collect();

        let generate_metadata = request.generate_metadata.unwrap_or(true);
        let generate_embeddings = request.generate_embeddings.unwrap_or(true);

        if !generate_embeddings {
            stages.insert("embedding".to_string(), StageReport::skipped());
            stages.insert("storage".to_string(), StageReport::skipped());
            info!(
                document_id = request.document_id,
                chunks = drafts.len(),
                "ingest completed without embeddings (dry run)"
            );
            return Ok(IngestReport {
                document_id: request.document_id,
                collection_name: request.collection_name,
                chunks_created: drafts.len(),
                chunks_inserted: 0,
                processing_time_ms: start.elapsed().as_millis() as u64,
                stages,
            });
        }

        // Stage 2: Metadata Extractor ∥ Embedder (§5: independent stages,
        // serializing them would be a correctness-neutral pessimization).
        let metadata_deadline = Duration::from_millis(self.deadlines.metadata_call_ms);
        let embed_deadline = Duration::from_millis(self.deadlines.embedder_call_ms);
        let overrides = request.metadata_overrides();
        let metadata_future = async {
            if generate_metadata {
                let start = Instant::now();
                let result = self.metadata.extract_batch(&texts, Some(&overrides), metadata_deadline).await;
                (result, start.elapsed(), true)
            } else {
                (vec![crate::metadata::ChunkMetadata::default(); texts.len()], Duration::ZERO, false)
            }
        };
        let embed_future = async {
            let start = Instant::now();
            let result = self.embedder.embed(&texts, request.embedding_model.as_deref(), embed_deadline).await;
            (result, start.elapsed())
        };

        let ((metadata_results, metadata_elapsed, metadata_ran), (embed_result, embed_elapsed)) =
            tokio::join!(metadata_future, embed_future);

        stages.insert(
            "metadata".to_string(),
            if metadata_ran {
                StageReport::ok(metadata_elapsed.as_millis() as u64)
            } else {
                StageReport::skipped()
            },
        );

        let vectors = match embed_result {
            Ok(vectors) => {
                stages.insert("embedding".to_string(), StageReport::ok(embed_elapsed.as_millis() as u64));
                vectors
            }
            Err(err) => {
                stages.insert("embedding".to_string(), StageReport::failed(embed_elapsed.as_millis() as u64));
                warn!(document_id = request.document_id, error = %err, "embedder failed, aborting ingest");
                return Err(err);
            }
        };

        // Stage 3: zip into full Chunk records.
        let now = Utc::now();
        let chunks: Vec<Chunk> = drafts
            .into_iter()
            .zip(metadata_results)
            .zip(vectors)
            .enumerate()
            .map(|(index, ((draft, meta), vector))| Chunk {
                id: Chunk::derive_id(&request.document_id, index as u32),
                document_id: request.document_id.clone(),
                tenant_id: request.tenant_id.clone(),
                chunk_index: index as u32,
                text: draft.text,
                char_count: draft.char_count,
                token_count: draft.token_count,
                dense_vector: vector,
                keywords: meta.keywords,
                topics: meta.topics,
                questions: meta.questions,
                summary: meta.summary,
                created_at: now,
                updated_at: now,
            })
            .collect();

        // Stage 4: Vector Store insert, idempotent on document_id by
        // deleting any existing chunks for it first (§6 idempotency: the
        // caller's document_id replaces via delete-then-insert).
        let store_start = Instant::now();
        let _ = self
            .store
            .delete_by_document(&request.collection_name, &request.document_id, Some(&request.tenant_id))
            .await;
        let outcome = match self
            .store
            .insert(&request.collection_name, &chunks, request.create_if_missing())
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                stages.insert("storage".to_string(), StageReport::failed(store_start.elapsed().as_millis() as u64));
                return Err(err);
            }
        };
        stages.insert("storage".to_string(), StageReport::ok(store_start.elapsed().as_millis() as u64));

        info!(
            document_id = request.document_id,
            collection = request.collection_name,
            chunks_inserted = outcome.inserted_count,
            "ingest completed"
        );

        Ok(IngestReport {
            document_id: request.document_id,
            collection_name: request.collection_name,
            chunks_created: chunks.len(),
            chunks_inserted: outcome.inserted_count,
            processing_time_ms: start.elapsed().as_millis() as u64,
            stages,
        })
    }

    /// `updateDocument(docId, newText, …)`: delete-then-reinsert (§4.6).
    /// `ingest` already deletes any existing chunks for `document_id`
    /// before inserting, so an update is just an ingest against the same
    /// id — the two steps are not atomic across an external failure; on
    /// reinsert failure the collection is left without that document and
    /// callers needing atomicity must retry.
    pub async fn update_document(&self, request: IngestRequest) -> Result<IngestReport> {
        self.ingest(request).await
    }

    /// `deleteDocument(docId, collection)`: a tenant-optional
    /// `deleteByFilter(document_id==docId)` (§4.6).
    pub async fn delete_document(
        &self,
        collection: &str,
        document_id: &str,
        tenant_id: Option<&str>,
    ) -> Result<usize> {
        self.store.delete_by_document(collection, document_id, tenant_id).await
    }
}

/// Validate the §3 length bounds on `document_id`/`tenant_id` at the
/// ingest boundary (the one place both fields are fixed for every chunk
/// a document produces).
fn validate_ids(document_id: &str, tenant_id: &str) -> Result<()> {
    if document_id.is_empty() || document_id.chars().count() > MAX_ID_LEN {
        return Err(RagError::InvalidRequest {
            message: format!("document_id must be 1-{MAX_ID_LEN} characters"),
        });
    }
    if tenant_id.chars().count() > MAX_ID_LEN {
        return Err(RagError::InvalidRequest {
            message: format!("tenant_id must be at most {MAX_ID_LEN} characters"),
        });
    }
    Ok(())
}
