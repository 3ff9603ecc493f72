//! Query → `Intent` classification: a single LLM call against the closed
//! 15-label set, with a documented fallback on parse failure or timeout.

use ragforge_core::{Intent, IntentLabel};
use ragforge_gateway::{ChatMessage, CompleteRequest, LlmGateway};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, serde::Deserialize)]
struct ClassifiedJson {
    label: String,
    #[serde(default = "default_confidence")]
    confidence: f32,
    #[serde(default = "default_language")]
    language: String,
}

fn default_confidence() -> f32 {
    0.5
}

fn default_language() -> String {
    "en".to_string()
}

/// Classifies query text into one of the 15 intent labels. Built on a
/// single long-lived gateway handle shared across the process — never
/// torn down between calls, including health probes.
pub struct IntentClassifier {
    gateway: Arc<LlmGateway>,
    model: String,
    fast_model: String,
    strong_model: String,
}

impl std::fmt::Debug for IntentClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentClassifier").field("model", &self.model).finish_non_exhaustive()
    }
}

impl IntentClassifier {
    #[must_use]
    pub fn new(
        gateway: Arc<LlmGateway>,
        model: impl Into<String>,
        fast_model: impl Into<String>,
        strong_model: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            model: model.into(),
            fast_model: fast_model.into(),
            strong_model: strong_model.into(),
        }
    }

    /// Classify `query`. Never returns an error: on any failure the
    /// documented fallback (`factual_retrieval`, confidence 0.5) is
    /// returned instead so the enclosing retrieval request is unaffected.
    pub async fn classify(&self, query: &str, deadline: Duration) -> Intent {
        match self.try_classify(query, deadline).await {
            Some(intent) => intent,
            None => {
                warn!("intent classification failed or timed out, falling back to factual_retrieval");
                Intent::fallback(&self.fast_model)
            }
        }
    }

    async fn try_classify(&self, query: &str, deadline: Duration) -> Option<Intent> {
        let request = CompleteRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(self.prompt()), ChatMessage::user(query.to_string())],
            temperature: 0.0,
        };
        let response = tokio::time::timeout(deadline, self.gateway.complete(request, deadline))
            .await
            .ok()?
            .ok()?;
        let parsed: ClassifiedJson = serde_json::from_str(response.text.trim()).ok()?;
        let label = IntentLabel::ALL.into_iter().find(|l| l.as_str() == parsed.label)?;
        let recommended_model = if label.is_complex() {
            self.strong_model.clone()
        } else {
            self.fast_model.clone()
        };
        Some(Intent {
            label,
            confidence: parsed.confidence.clamp(0.0, 1.0),
            language: parsed.language,
            recommended_model,
        })
    }

    fn prompt(&self) -> String {
        let labels = IntentLabel::ALL.iter().map(|l| l.as_str()).collect::<Vec<_>>().join(", ");
        format!(
            "Classify the user's query into exactly one of these intent labels: {labels}. \
             Respond with a single JSON object: {{\"label\": <one of the labels above>, \
             \"confidence\": <0.0-1.0>, \"language\": <ISO language code>}}."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classified_json_parses_known_label() {
        let raw = r#"{"label":"comparison","confidence":0.8,"language":"en"}"#;
        let parsed: ClassifiedJson = serde_json::from_str(raw).unwrap();
        let label = IntentLabel::ALL.into_iter().find(|l| l.as_str() == parsed.label);
        assert_eq!(label, Some(IntentLabel::Comparison));
    }

    #[test]
    fn unknown_label_string_does_not_match_any_variant() {
        let label = IntentLabel::ALL.into_iter().find(|l| l.as_str() == "not_a_real_label");
        assert!(label.is_none());
    }
}
