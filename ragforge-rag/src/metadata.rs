//! Parallel LLM-driven extraction of the four semantic metadata fields
//! attached to every chunk.

use ragforge_config::MetadataConfig;
use ragforge_gateway::{ChatMessage, CompleteRequest, LlmGateway, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// The four canonical metadata fields. Schemas are immutable; adding a
/// fifth field requires a new collection, not a change here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMetadata {
    pub keywords: String,
    pub topics: String,
    pub questions: String,
    pub summary: String,
}

/// Per-call overrides for the caller-specified counts in §6's ingest
/// body (`keywords_count`, `topics_count`, `questions_count`,
/// `summary_length`). `None` fields defer to `MetadataConfig`'s defaults.
#[derive(Debug, Clone, Default)]
pub struct MetadataOverrides {
    pub keywords_count: Option<usize>,
    pub topics_count: Option<usize>,
    pub questions_count: Option<usize>,
    pub summary_length: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ExtractedJson {
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    questions: Vec<String>,
    #[serde(default)]
    summary: String,
}

impl From<ExtractedJson> for ChunkMetadata {
    fn from(value: ExtractedJson) -> Self {
        Self {
            keywords: value.keywords.join(", "),
            topics: value.topics.join(", "),
            questions: value.questions.join("\n"),
            summary: value.summary,
        }
    }
}

/// Extracts `ChunkMetadata` from chunk text via the gateway. Individual
/// chunk failures degrade to empty fields rather than failing the batch.
pub struct MetadataExtractor {
    gateway: Arc<LlmGateway>,
    config: MetadataConfig,
    limiter: RateLimiter,
    model: String,
}

impl std::fmt::Debug for MetadataExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataExtractor").field("enabled", &self.config.enabled).finish_non_exhaustive()
    }
}

impl MetadataExtractor {
    #[must_use]
    pub fn new(gateway: Arc<LlmGateway>, config: MetadataConfig, model: impl Into<String>) -> Self {
        let limiter = RateLimiter::new("metadata.outbound", config.max_concurrent_calls);
        Self { gateway, config, limiter, model: model.into() }
    }

    /// Extract metadata for every chunk in `texts`, isolating per-chunk
    /// failures. Returns `config.enabled == false` placeholders (all
    /// fields empty) without issuing any calls when the toggle is off.
    /// `overrides` lets a single caller request different counts than
    /// `MetadataConfig`'s defaults for this batch (§6's ingest body).
    pub async fn extract_batch(
        &self,
        texts: &[String],
        overrides: Option<&MetadataOverrides>,
        deadline: Duration,
    ) -> Vec<ChunkMetadata> {
        if !self.config.enabled {
            return vec![ChunkMetadata::default(); texts.len()];
        }

        let prompt = self.prompt(overrides);
        let futures = texts.iter().map(|text| self.extract_one(text, &prompt, deadline));
        futures::future::join_all(futures).await
    }

    async fn extract_one(&self, text: &str, prompt: &str, deadline: Duration) -> ChunkMetadata {
        let Ok((_permit, _wait)) = self.limiter.acquire_timed(deadline).await else {
            warn!("metadata extraction budget exhausted, returning empty fields");
            return ChunkMetadata::default();
        };

        match self.try_extract(text, prompt, 0.2, deadline).await {
            Some(metadata) => metadata,
            None => match self.try_extract(text, prompt, 0.0, deadline).await {
                Some(metadata) => metadata,
                None => {
                    warn!("metadata extraction failed twice, returning empty fields");
                    ChunkMetadata::default()
                }
            },
        }
    }

    async fn try_extract(&self, text: &str, prompt: &str, temperature: f32, deadline: Duration) -> Option<ChunkMetadata> {
        let request = CompleteRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(prompt.to_string()),
                ChatMessage::user(text.to_string()),
            ],
            temperature,
        };
        let response = self.gateway.complete(request, deadline).await.ok()?;
        let parsed: ExtractedJson = serde_json::from_str(response.text.trim()).ok()?;
        Some(parsed.into())
    }

    fn prompt(&self, overrides: Option<&MetadataOverrides>) -> String {
        let keywords_count = overrides.and_then(|o| o.keywords_count).unwrap_or(self.config.keywords_count);
        let topics_count = overrides.and_then(|o| o.topics_count).unwrap_or(self.config.topics_count);
        let questions_count = overrides.and_then(|o| o.questions_count).unwrap_or(self.config.questions_count);
        let summary_length = overrides
            .and_then(|o| o.summary_length.as_deref())
            .unwrap_or(self.config.summary_length.as_str());

        format!(
            "Extract metadata from the given text. Respond with a single JSON object \
             with exactly these keys: \"keywords\" ({keywords_count} strings), \"topics\" ({topics_count} strings), \
             \"questions\" ({questions_count} candidate questions this text answers), and \"summary\" \
             ({summary_length}). Only extract what is present in the text; do not invent facts."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracted_json_joins_list_fields() {
        let parsed = ExtractedJson {
            keywords: vec!["a".to_string(), "b".to_string()],
            topics: vec!["x".to_string()],
            questions: vec!["q1?".to_string(), "q2?".to_string()],
            summary: "short summary".to_string(),
        };
        let metadata: ChunkMetadata = parsed.into();
        assert_eq!(metadata.keywords, "a, b");
        assert_eq!(metadata.questions, "q1?\nq2?");
    }

    #[test]
    fn default_metadata_is_all_empty() {
        let metadata = ChunkMetadata::default();
        assert!(metadata.keywords.is_empty());
        assert!(metadata.summary.is_empty());
    }
}
