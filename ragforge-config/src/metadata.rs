//! Metadata extractor configuration (§4.4).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// `generateMetadata` toggle; skipping yields a documented 40-60%
    /// ingestion latency reduction.
    pub enabled: bool,
    pub keywords_count: usize,
    pub topics_count: usize,
    pub questions_count: usize,
    /// Free-form length hint passed into the extraction prompt.
    pub summary_length: String,
    /// Max parallel outbound LLM calls for extraction.
    pub max_concurrent_calls: usize,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keywords_count: 5,
            topics_count: 3,
            questions_count: 3,
            summary_length: "1-2 sentences".to_string(),
            max_concurrent_calls: 20,
        }
    }
}
