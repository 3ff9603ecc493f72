//! Optional LLM sentence-extraction over top candidates (§4.10).

use ragforge_gateway::{ChatMessage, CompleteRequest, LlmGateway};
use ragforge_store::SearchHit;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, serde::Deserialize)]
struct CompressedJson {
    #[serde(default)]
    sentences: Vec<ScoredSentence>,
}

#[derive(Debug, serde::Deserialize)]
struct ScoredSentence {
    text: String,
    relevance: f32,
}

/// `compress(query, chunks[], ratio, scoreThreshold) → compressedChunks[]`.
pub struct Compressor {
    gateway: Arc<LlmGateway>,
    model: String,
}

impl std::fmt::Debug for Compressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compressor").field("model", &self.model).finish_non_exhaustive()
    }
}

impl Compressor {
    #[must_use]
    pub fn new(gateway: Arc<LlmGateway>, model: impl Into<String>) -> Self {
        Self { gateway, model: model.into() }
    }

    /// Compress each chunk's text to the sentences required to answer
    /// `query`, targeting `ratio × input length`, dropping any sentence
    /// scored below `score_threshold`. A chunk whose every sentence falls
    /// below threshold is dropped entirely (never kept empty, §4.10).
    ///
    /// A per-chunk compression failure falls back to that chunk's
    /// original, uncompressed text (§4.10 failure policy) — this method
    /// never fails the overall stage.
    pub async fn compress(
        &self,
        query: &str,
        candidates: Vec<SearchHit>,
        ratio: f32,
        score_threshold: f32,
        deadline: Duration,
    ) -> (Vec<SearchHit>, bool) {
        let mut any_failed = false;
        let mut result = Vec::with_capacity(candidates.len());

        for mut candidate in candidates {
            match self.try_compress(query, &candidate.chunk.text, ratio, score_threshold, deadline).await {
                Some(Some(compressed)) => {
                    candidate.chunk.text = compressed;
                    result.push(candidate);
                }
                Some(None) => {
                    // Every sentence fell below threshold: chunk is dropped.
                }
                None => {
                    any_failed = true;
                    result.push(candidate);
                }
            }
        }

        (result, !any_failed)
    }

    /// Returns `Some(Some(text))` on a successful compression that kept at
    /// least one sentence, `Some(None)` when every sentence was below
    /// threshold, and `None` on any parse/transport failure.
    async fn try_compress(
        &self,
        query: &str,
        text: &str,
        ratio: f32,
        score_threshold: f32,
        deadline: Duration,
    ) -> Option<Option<String>> {
        let request = CompleteRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(self.prompt(query, ratio)), ChatMessage::user(text.to_string())],
            temperature: 0.0,
        };
        let response = match self.gateway.complete(request, deadline).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "compression call failed, keeping original text");
                return None;
            }
        };

        let parsed: CompressedJson = match serde_json::from_str(response.text.trim()) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "compression response did not parse, keeping original text");
                return None;
            }
        };

        let kept: Vec<&str> = parsed
            .sentences
            .iter()
            .filter(|s| s.relevance >= score_threshold)
            .map(|s| s.text.as_str())
            .collect();

        if kept.is_empty() {
            Some(None)
        } else {
            Some(Some(kept.join(" ")))
        }
    }

    fn prompt(&self, query: &str, ratio: f32) -> String {
        format!(
            "Given the question: \"{query}\", extract only the sentences from the \
             provided text that are required to answer it, preserving original wording \
             exactly. Target roughly {:.0}% of the original length. Respond with a \
             single JSON object: {{\"sentences\": [{{\"text\": <verbatim sentence>, \
             \"relevance\": <0.0-1.0>}}]}}. Never invent or rephrase text that is not \
             already present in the input.",
            ratio * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressed_json_parses_sentence_list() {
        let raw = r#"{"sentences":[{"text":"A17 Pro chip.","relevance":0.9},{"text":"Ships in blue.","relevance":0.1}]}"#;
        let parsed: CompressedJson = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.sentences.len(), 2);
        let kept: Vec<&str> = parsed.sentences.iter().filter(|s| s.relevance >= 0.3).map(|s| s.text.as_str()).collect();
        assert_eq!(kept, vec!["A17 Pro chip."]);
    }

    #[test]
    fn empty_sentence_list_parses_as_no_keepers() {
        let raw = r#"{"sentences":[]}"#;
        let parsed: CompressedJson = serde_json::from_str(raw).unwrap();
        assert!(parsed.sentences.is_empty());
    }
}
