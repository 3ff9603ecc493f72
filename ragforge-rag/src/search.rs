//! Dense search with a metadata-boosted re-score (§4.8).

use crate::embedding::Embedder;
use ragforge_core::Result;
use ragforge_store::{SearchHit, VectorStoreFacade};
use std::sync::Arc;
use std::time::Duration;

/// Additive boost weights, summed and capped at `CAP` (§4.8 canonical
/// values; the §9 design note that other weights appear in source
/// fragments is resolved in favor of these).
const QUESTIONS_BOOST: f32 = 0.20;
const KEYWORDS_BOOST: f32 = 0.15;
const TOPICS_BOOST: f32 = 0.10;
const SUMMARY_BOOST: f32 = 0.05;
const BOOST_CAP: f32 = 0.50;

/// `search(query, collection, tenant?, topK, metadataBoost?) → candidates[]`.
pub struct Search {
    embedder: Arc<Embedder>,
    store: Arc<VectorStoreFacade>,
}

impl std::fmt::Debug for Search {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Search").finish_non_exhaustive()
    }
}

impl Search {
    #[must_use]
    pub fn new(embedder: Arc<Embedder>, store: Arc<VectorStoreFacade>) -> Self {
        Self { embedder, store }
    }

    /// Embed `query`, search `collection`, and (when `metadata_boost` is
    /// on) re-score and re-sort candidates by additive metadata overlap
    /// before truncating to `top_k`.
    ///
    /// # Errors
    ///
    /// Propagates the embedder's and store's errors; both are fatal to
    /// the enclosing retrieval request (§4.12, §7).
    pub async fn search(
        &self,
        query: &str,
        collection: &str,
        tenant_id: Option<&str>,
        top_k: usize,
        metadata_boost: bool,
        embedding_model: Option<&str>,
        deadline: Duration,
    ) -> Result<Vec<SearchHit>> {
        let vectors = self.embedder.embed(&[query.to_string()], embedding_model, deadline).await?;
        let query_vector = vectors.into_iter().next().expect("embed returns one vector per input text");

        // Over-fetch before a metadata re-sort so boosted candidates that
        // ranked just outside the raw top-k still have a chance to surface.
        let fetch_k = if metadata_boost { top_k.saturating_mul(3).max(top_k) } else { top_k };
        let mut hits = self.store.search(collection, &query_vector, fetch_k, tenant_id).await?;

        if metadata_boost {
            let terms = query_terms(query);
            for hit in &mut hits {
                hit.score += metadata_boost_for(&terms, &hit.chunk);
            }
            hits.sort_by(|a, b| {
                b.score
                    .total_cmp(&a.score)
                    .then_with(|| a.chunk.chunk_index.cmp(&b.chunk.chunk_index))
            });
        }

        hits.truncate(top_k);
        Ok(hits)
    }
}

fn query_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn metadata_boost_for(terms: &[String], chunk: &ragforge_core::Chunk) -> f32 {
    let mut boost = 0.0;
    if field_overlaps(terms, &chunk.questions) {
        boost += QUESTIONS_BOOST;
    }
    if field_overlaps(terms, &chunk.keywords) {
        boost += KEYWORDS_BOOST;
    }
    if field_overlaps(terms, &chunk.topics) {
        boost += TOPICS_BOOST;
    }
    if field_overlaps(terms, &chunk.summary) {
        boost += SUMMARY_BOOST;
    }
    boost.min(BOOST_CAP)
}

fn field_overlaps(terms: &[String], field: &str) -> bool {
    if field.is_empty() {
        return false;
    }
    let field_lower = field.to_lowercase();
    terms.iter().any(|t| !t.is_empty() && field_lower.contains(t.as_str()))
}
