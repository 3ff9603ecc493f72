//! Domain types shared by the ingestion and retrieval pipelines.
//!
//! These mirror `spec.md` §3 (Data Model) exactly: `Document` is the
//! ephemeral external input, `Chunk` is the unit of storage, `Collection`
//! is the store-side container, and `Query`/`Answer`/`Intent`/`StageReport`
//! carry the retrieval path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default tenant used when a caller omits `tenant_id`.
pub const DEFAULT_TENANT: &str = "default";

/// Number of partitions a collection is sharded into (§4.1, immutable).
pub const NUM_PARTITIONS: u32 = 256;

/// An external input to the ingestion pipeline. Not persisted as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Caller-assigned, stable identifier. Doubles as the idempotency key.
    pub document_id: String,
    /// Tenant the document belongs to.
    #[serde(default = "default_tenant")]
    pub tenant_id: String,
    /// Target collection name.
    pub collection_name: String,
    /// Raw UTF-8 text, bounded by the caller.
    pub text: String,
}

fn default_tenant() -> String {
    DEFAULT_TENANT.to_string()
}

/// The unit of storage and retrieval (§3, invariants 1-5).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Primary key, derived deterministically from `document_id` + `chunk_index`.
    pub id: String,
    /// Owning document (≤100 chars enforced at ingest boundary).
    pub document_id: String,
    /// Partition-key tenant (≤100 chars enforced at ingest boundary).
    pub tenant_id: String,
    /// 0-based, strictly ascending within a document.
    pub chunk_index: u32,
    /// UTF-8 chunk text, 1-65,535 characters.
    pub text: String,
    /// Character count, derived at chunk time.
    pub char_count: usize,
    /// Token count, derived at chunk time.
    pub token_count: usize,
    /// Dense embedding. Length must equal the owning collection's dimension.
    pub dense_vector: Vec<f32>,
    /// Comma/line-separated keyword list, ≤500 chars.
    #[serde(default)]
    pub keywords: String,
    /// Topic labels, ≤500 chars.
    #[serde(default)]
    pub topics: String,
    /// Candidate questions this chunk answers, ≤1000 chars.
    #[serde(default)]
    pub questions: String,
    /// Short summary, ≤1000 chars.
    #[serde(default)]
    pub summary: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Chunk {
    /// Deterministic chunk id: `{document_id}_chunk_{chunk_index}`.
    ///
    /// Stable across re-ingest of the same document, as required by
    /// invariant 1 of §3 combined with the idempotency contract of §6.
    #[must_use]
    pub fn derive_id(document_id: &str, chunk_index: u32) -> String {
        format!("{document_id}_chunk_{chunk_index}")
    }
}

/// A named, typed container of chunks in the vector store (§3, §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    /// Immutable once set; determined by auto-dimension detection or an
    /// explicit `createCollection` call.
    pub dimension: usize,
    /// Immutable, fixed at 256.
    pub num_partitions: u32,
    pub description: Option<String>,
}

impl Collection {
    #[must_use]
    pub fn new(name: impl Into<String>, dimension: usize, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            dimension,
            num_partitions: NUM_PARTITIONS,
            description,
        }
    }
}

/// The closed set of 15 intent labels (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentLabel {
    SimpleLookup,
    ListEnumeration,
    YesNo,
    DefinitionExplanation,
    FactualRetrieval,
    Comparison,
    Aggregation,
    Temporal,
    RelationshipMapping,
    ContextualExplanation,
    NegativeLogic,
    CrossReference,
    Synthesis,
    DocumentNavigation,
    ExceptionHandling,
}

impl IntentLabel {
    /// All 15 labels, used to render classifier prompts and validate output.
    pub const ALL: [IntentLabel; 15] = [
        Self::SimpleLookup,
        Self::ListEnumeration,
        Self::YesNo,
        Self::DefinitionExplanation,
        Self::FactualRetrieval,
        Self::Comparison,
        Self::Aggregation,
        Self::Temporal,
        Self::RelationshipMapping,
        Self::ContextualExplanation,
        Self::NegativeLogic,
        Self::CrossReference,
        Self::Synthesis,
        Self::DocumentNavigation,
        Self::ExceptionHandling,
    ];

    /// Simple intents map to the "fast" model tier (§4.11).
    #[must_use]
    pub fn is_simple(self) -> bool {
        matches!(
            self,
            Self::SimpleLookup
                | Self::ListEnumeration
                | Self::YesNo
                | Self::DefinitionExplanation
                | Self::FactualRetrieval
        )
    }

    /// Complex intents map to the "strong" model tier (§4.11).
    #[must_use]
    pub fn is_complex(self) -> bool {
        matches!(
            self,
            Self::CrossReference
                | Self::Synthesis
                | Self::Aggregation
                | Self::Temporal
                | Self::RelationshipMapping
                | Self::NegativeLogic
        )
    }

    /// The documented fallback label used when classification fails (§4.7).
    #[must_use]
    pub fn fallback() -> Self {
        Self::FactualRetrieval
    }

    /// Short machine name, used both for prompt rendering and logging.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SimpleLookup => "simple_lookup",
            Self::ListEnumeration => "list_enumeration",
            Self::YesNo => "yes_no",
            Self::DefinitionExplanation => "definition_explanation",
            Self::FactualRetrieval => "factual_retrieval",
            Self::Comparison => "comparison",
            Self::Aggregation => "aggregation",
            Self::Temporal => "temporal",
            Self::RelationshipMapping => "relationship_mapping",
            Self::ContextualExplanation => "contextual_explanation",
            Self::NegativeLogic => "negative_logic",
            Self::CrossReference => "cross_reference",
            Self::Synthesis => "synthesis",
            Self::DocumentNavigation => "document_navigation",
            Self::ExceptionHandling => "exception_handling",
        }
    }
}

impl std::fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query-time classification result (§3, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub label: IntentLabel,
    /// 0.0-1.0
    pub confidence: f32,
    /// ISO language code detected from the query.
    pub language: String,
    /// A gateway-known model identifier hint for the Answer stage.
    pub recommended_model: String,
}

impl Intent {
    /// The documented fallback used on parse failure / classifier timeout.
    #[must_use]
    pub fn fallback(default_model: impl Into<String>) -> Self {
        Self {
            label: IntentLabel::fallback(),
            confidence: 0.5,
            language: "en".to_string(),
            recommended_model: default_model.into(),
        }
    }
}

/// One entry in an `Answer`'s citation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based index matching `[Source N]` markers in the answer text.
    pub source_id: u32,
    pub chunk_id: String,
    pub document_id: String,
    pub text_preview: String,
}

/// The result of the retrieval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// Per-stage outcome, attached to every orchestrator response (§3, §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub time_ms: u64,
    pub success: bool,
    pub skipped: bool,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl StageReport {
    #[must_use]
    pub fn ok(time_ms: u64) -> Self {
        Self {
            time_ms,
            success: true,
            skipped: false,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn skipped() -> Self {
        Self {
            time_ms: 0,
            success: true,
            skipped: true,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn failed(time_ms: u64) -> Self {
        Self {
            time_ms,
            success: false,
            skipped: false,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A named map of stage reports keyed by stage name (`"chunking"`,
/// `"metadata"`, `"embedding"`, `"storage"`, `"intent"`, `"search"`,
/// `"reranking"`, `"compression"`, `"answer"`).
pub type StageReports = HashMap<String, StageReport>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_is_deterministic() {
        assert_eq!(Chunk::derive_id("doc_1", 0), "doc_1_chunk_0");
        assert_eq!(Chunk::derive_id("doc_1", 0), Chunk::derive_id("doc_1", 0));
    }

    #[test]
    fn intent_tiers_are_disjoint() {
        for label in IntentLabel::ALL {
            assert!(!(label.is_simple() && label.is_complex()));
        }
    }

    #[test]
    fn fallback_intent_uses_factual_retrieval() {
        let intent = Intent::fallback("fast-default");
        assert_eq!(intent.label, IntentLabel::FactualRetrieval);
        assert!((intent.confidence - 0.5).abs() < f32::EPSILON);
    }
}
