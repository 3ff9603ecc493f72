//! Intent-adapted prompt assembly, citation extraction, and
//! `<think>`-tag stripping (§4.11).

use ragforge_core::{Answer, Citation, Intent, IntentLabel};
use ragforge_gateway::{canonical_key, strip_think_tags, ChatMessage, CompleteRequest, LlmGateway, ShardedCache};
use ragforge_store::SearchHit;
use std::sync::Arc;
use std::time::Duration;

/// One entry per intent label (§9 design note: prompt templates are data,
/// not a code branch per intent). Each template constrains answer shape:
/// definitions lead with a definition, comparisons use tabular structure,
/// negative-logic answers explicitly state absence when appropriate.
const PROMPT_TEMPLATES: [(IntentLabel, &str); 15] = [
    (
        IntentLabel::SimpleLookup,
        "Answer the question directly and concisely using only the supplied sources. \
         State the fact plainly without extra caveats.",
    ),
    (
        IntentLabel::ListEnumeration,
        "Answer as a list. Enumerate every item the sources support, one per line, \
         and nothing the sources don't mention.",
    ),
    (
        IntentLabel::YesNo,
        "Answer with a direct yes or no first, then a one-sentence justification \
         grounded in the sources.",
    ),
    (
        IntentLabel::DefinitionExplanation,
        "Lead with a one-sentence definition of the term, then elaborate using only \
         the supplied sources.",
    ),
    (
        IntentLabel::FactualRetrieval,
        "Answer the question using only facts present in the supplied sources. If the \
         sources do not contain the fact, say so explicitly.",
    ),
    (
        IntentLabel::Comparison,
        "Compare the subjects using a compact table or parallel bullet structure, \
         covering only the dimensions the sources actually support.",
    ),
    (
        IntentLabel::Aggregation,
        "Aggregate the relevant figures or items across all supplied sources and state \
         the combined result, showing which sources contributed.",
    ),
    (
        IntentLabel::Temporal,
        "Answer with attention to chronological order; state dates or sequence \
         explicitly where the sources provide them.",
    ),
    (
        IntentLabel::RelationshipMapping,
        "Describe how the entities in the question relate to one another, citing the \
         source for each relationship.",
    ),
    (
        IntentLabel::ContextualExplanation,
        "Explain the answer in context, briefly noting the surrounding circumstances \
         the sources describe.",
    ),
    (
        IntentLabel::NegativeLogic,
        "Carefully check whether the sources support the asserted condition. If they \
         do not, state the absence explicitly rather than guessing — asserting absence \
         is the correct outcome when nothing supports the positive case.",
    ),
    (
        IntentLabel::CrossReference,
        "Cross-reference all supplied sources before answering. State plainly if no \
         connection between them is supported by the text.",
    ),
    (
        IntentLabel::Synthesis,
        "Synthesize a single coherent answer that draws on every relevant source, \
         noting where sources agree or add distinct information.",
    ),
    (
        IntentLabel::DocumentNavigation,
        "Point the reader to exactly which source(s) address the question before \
         giving a brief answer.",
    ),
    (
        IntentLabel::ExceptionHandling,
        "Identify any exceptions, edge cases, or caveats the sources describe before \
         giving the general answer.",
    ),
];

const GROUNDING_RULE: &str = "Answer only from the numbered sources below. Cite every \
claim with a [Source N] marker matching the source it came from. Never introduce a \
claim the sources do not support; if the sources are insufficient, say so explicitly.";

fn template_for(label: IntentLabel) -> &'static str {
    PROMPT_TEMPLATES
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, template)| *template)
        .unwrap_or_else(|| template_for(IntentLabel::fallback()))
}

/// `generate(query, intent, contextChunks[], model?, temperature, enableCitations)
/// → {answer, citations[]}`.
pub struct AnswerGenerator {
    gateway: Arc<LlmGateway>,
    cache: ShardedCache<Answer>,
    default_model: String,
}

impl std::fmt::Debug for AnswerGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerGenerator").field("default_model", &self.default_model).finish_non_exhaustive()
    }
}

impl AnswerGenerator {
    #[must_use]
    pub fn new(gateway: Arc<LlmGateway>, default_model: impl Into<String>) -> Self {
        let cache = ShardedCache::new(10_000, 16, Duration::from_secs(2 * 60 * 60));
        Self { gateway, cache, default_model: default_model.into() }
    }

    /// Generate a cited answer from `context_chunks`. Model selection is
    /// caller-supplied > `intent.recommended_model` > the configured
    /// default (§4.11 step 1).
    ///
    /// # Errors
    ///
    /// Propagates the gateway's errors; Answer failures are fatal to the
    /// enclosing retrieval request (§4.12, §7).
    pub async fn generate(
        &self,
        query: &str,
        intent: &Intent,
        context_chunks: &[SearchHit],
        model_override: Option<&str>,
        temperature: f32,
        enable_citations: bool,
        deadline: Duration,
    ) -> ragforge_core::Result<Answer> {
        let model = model_override
            .map(str::to_string)
            .unwrap_or_else(|| intent.recommended_model.clone());
        let model = if model.is_empty() { self.default_model.clone() } else { model };

        let ordered_ids: Vec<&str> = context_chunks.iter().map(|c| c.chunk.id.as_str()).collect();
        let cache_key = canonical_key(&[
            query,
            intent.label.as_str(),
            &ordered_ids.join(","),
            &model,
            &temperature.to_string(),
        ]);
        if let Some(answer) = self.cache.get(&cache_key) {
            return Ok(answer);
        }

        let system_prompt = format!("{}\n\n{}", template_for(intent.label), GROUNDING_RULE);
        let sources = render_sources(context_chunks);
        let user_prompt = format!("{sources}\n\nQuestion: {query}");

        let request = CompleteRequest {
            model,
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)],
            temperature,
        };
        let response = self.gateway.complete(request, deadline).await?;
        let clean_text = strip_think_tags(&response.text);

        let answer = if enable_citations {
            build_citations(&clean_text, context_chunks)
        } else {
            Answer { text: clean_text, citations: Vec::new() }
        };

        self.cache.put(cache_key, answer.clone());
        Ok(answer)
    }
}

fn render_sources(context_chunks: &[SearchHit]) -> String {
    context_chunks
        .iter()
        .enumerate()
        .map(|(index, hit)| format!("Source {}: {}", index + 1, hit.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Scan `text` for `[Source N]` markers, keep only those with `N` within
/// `context_chunks`, strip the rest from the text, and build one
/// `Citation` per distinct in-range `N` (§4.11 step 6).
fn build_citations(text: &str, context_chunks: &[SearchHit]) -> Answer {
    let k = context_chunks.len();
    let mut referenced: Vec<u32> = Vec::new();
    let mut cleaned = String::with_capacity(text.len());
    let mut rest = text;

    loop {
        match rest.find("[Source ") {
            None => {
                cleaned.push_str(rest);
                break;
            }
            Some(start) => {
                cleaned.push_str(&rest[..start]);
                let after = &rest[start + "[Source ".len()..];
                match after.find(']') {
                    Some(end_rel) => {
                        let digits = &after[..end_rel];
                        let next = &after[end_rel + 1..];
                        match digits.trim().parse::<u32>() {
                            Ok(n) if n >= 1 && (n as usize) <= k => {
                                cleaned.push_str(&format!("[Source {n}]"));
                                if !referenced.contains(&n) {
                                    referenced.push(n);
                                }
                            }
                            _ => {
                                // Out-of-range or malformed marker: stripped
                                // from the text entirely (§4.11 step 6).
                            }
                        }
                        rest = next;
                    }
                    None => {
                        cleaned.push_str(&rest[start..]);
                        break;
                    }
                }
            }
        }
    }

    referenced.sort_unstable();
    let citations = referenced
        .into_iter()
        .filter_map(|n| {
            let hit = context_chunks.get((n - 1) as usize)?;
            Some(Citation {
                source_id: n,
                chunk_id: hit.chunk.id.clone(),
                document_id: hit.chunk.document_id.clone(),
                text_preview: preview(&hit.chunk.text),
            })
        })
        .collect();

    Answer { text: cleaned, citations }
}

fn preview(text: &str) -> String {
    const MAX: usize = 160;
    let mut preview: String = text.chars().take(MAX).collect();
    if text.chars().count() > MAX {
        preview.push('…');
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ragforge_core::Chunk;

    fn hit(id: &str, doc: &str, text: &str) -> SearchHit {
        let now = Utc::now();
        SearchHit {
            chunk: Chunk {
                id: id.to_string(),
                document_id: doc.to_string(),
                tenant_id: "default".to_string(),
                chunk_index: 0,
                text: text.to_string(),
                char_count: text.len(),
                token_count: 1,
                dense_vector: vec![1.0],
                keywords: String::new(),
                topics: String::new(),
                questions: String::new(),
                summary: String::new(),
                created_at: now,
                updated_at: now,
            },
            score: 1.0,
        }
    }

    #[test]
    fn every_template_slot_is_filled() {
        for label in IntentLabel::ALL {
            assert!(!template_for(label).is_empty());
        }
    }

    #[test]
    fn citations_are_built_only_for_referenced_sources() {
        let chunks = vec![hit("a", "doc1", "alpha text"), hit("b", "doc2", "beta text")];
        let answer = build_citations("The chip is fast [Source 1]. See also details.", &chunks);
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.citations[0].chunk_id, "a");
        assert!(answer.text.contains("[Source 1]"));
    }

    #[test]
    fn references_beyond_k_are_stripped_from_text() {
        let chunks = vec![hit("a", "doc1", "alpha text")];
        let answer = build_citations("Claim [Source 1] and another [Source 9].", &chunks);
        assert_eq!(answer.citations.len(), 1);
        assert!(!answer.text.contains("[Source 9]"));
    }

    #[test]
    fn duplicate_references_yield_one_citation() {
        let chunks = vec![hit("a", "doc1", "alpha text")];
        let answer = build_citations("[Source 1] repeated again [Source 1].", &chunks);
        assert_eq!(answer.citations.len(), 1);
    }
}
