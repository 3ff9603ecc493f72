//! Provider/model registry (§4.2, §9 re-architecture guidance).
//!
//! The source this was distilled from used string-typed model keys looked
//! up ad hoc at each call site. Per §9 we reformulate that as a tagged
//! variant over the closed set of supported providers plus a single
//! `resolve_model` function that rejects unknown ids at request-parse
//! time rather than at the provider boundary.

use ragforge_core::RagError;
use std::collections::HashMap;
use std::sync::OnceLock;

/// The provider families the gateway multiplexes across (§1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Jina,
    Nebius,
    SambaNova,
    Bge,
}

impl Provider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jina => "jina",
            Self::Nebius => "nebius",
            Self::SambaNova => "sambanova",
            Self::Bge => "bge",
        }
    }
}

/// What a resolved model is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Chat-completion model, tiered fast/balanced/advanced (§4.11).
    Chat { tier: ModelTier },
    /// Embedding model with a fixed output dimension (§4.3).
    Embedding { dimension: usize },
    /// Cross-encoder or hosted reranker (§4.9).
    Rerank,
}

/// Chat-completion capability tier. Intents route to `Fast` or `Advanced`
/// per §4.11; `Balanced` is available for explicit caller overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Fast,
    Balanced,
    Advanced,
}

/// A fully-resolved model: which provider serves it, what endpoint path to
/// call, and what it is capable of.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub id: &'static str,
    pub provider: Provider,
    pub endpoint_path: &'static str,
    pub kind: ModelKind,
}

fn registry() -> &'static HashMap<&'static str, ModelSpec> {
    static REGISTRY: OnceLock<HashMap<&'static str, ModelSpec>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let specs = [
            // Chat completion models, tiered per provider family.
            ModelSpec {
                id: "nebius-fast",
                provider: Provider::Nebius,
                endpoint_path: "/chat/completions",
                kind: ModelKind::Chat {
                    tier: ModelTier::Fast,
                },
            },
            ModelSpec {
                id: "nebius-balanced",
                provider: Provider::Nebius,
                endpoint_path: "/chat/completions",
                kind: ModelKind::Chat {
                    tier: ModelTier::Balanced,
                },
            },
            ModelSpec {
                id: "nebius-advanced",
                provider: Provider::Nebius,
                endpoint_path: "/chat/completions",
                kind: ModelKind::Chat {
                    tier: ModelTier::Advanced,
                },
            },
            ModelSpec {
                id: "sambanova-fast",
                provider: Provider::SambaNova,
                endpoint_path: "/chat/completions",
                kind: ModelKind::Chat {
                    tier: ModelTier::Fast,
                },
            },
            ModelSpec {
                id: "sambanova-advanced",
                provider: Provider::SambaNova,
                endpoint_path: "/chat/completions",
                kind: ModelKind::Chat {
                    tier: ModelTier::Advanced,
                },
            },
            ModelSpec {
                id: "fast-default",
                provider: Provider::Nebius,
                endpoint_path: "/chat/completions",
                kind: ModelKind::Chat {
                    tier: ModelTier::Fast,
                },
            },
            ModelSpec {
                id: "strong-default",
                provider: Provider::SambaNova,
                endpoint_path: "/chat/completions",
                kind: ModelKind::Chat {
                    tier: ModelTier::Advanced,
                },
            },
            // Embedding models (§4.3 dimension table).
            ModelSpec {
                id: "jina-embeddings-v3",
                provider: Provider::Jina,
                endpoint_path: "/embeddings",
                kind: ModelKind::Embedding { dimension: 1024 },
            },
            ModelSpec {
                id: "jina-embeddings-v4",
                provider: Provider::Jina,
                endpoint_path: "/embeddings",
                kind: ModelKind::Embedding { dimension: 2048 },
            },
            ModelSpec {
                id: "bge-multilingual-gemma2",
                provider: Provider::Nebius,
                endpoint_path: "/embeddings",
                kind: ModelKind::Embedding { dimension: 3584 },
            },
            ModelSpec {
                id: "e5-mistral-7b-instruct",
                provider: Provider::Nebius,
                endpoint_path: "/embeddings",
                kind: ModelKind::Embedding { dimension: 4096 },
            },
            ModelSpec {
                id: "bge-en-icl",
                provider: Provider::Nebius,
                endpoint_path: "/embeddings",
                kind: ModelKind::Embedding { dimension: 4096 },
            },
            ModelSpec {
                id: "qwen3-8b",
                provider: Provider::SambaNova,
                endpoint_path: "/embeddings",
                kind: ModelKind::Embedding { dimension: 4096 },
            },
            // Rerankers.
            ModelSpec {
                id: "bge-reranker-v2-m3",
                provider: Provider::Bge,
                endpoint_path: "/rerank",
                kind: ModelKind::Rerank,
            },
            ModelSpec {
                id: "jina-reranker-v2",
                provider: Provider::Jina,
                endpoint_path: "/rerank",
                kind: ModelKind::Rerank,
            },
        ];
        specs.into_iter().map(|s| (s.id, s)).collect()
    })
}

/// Resolve a caller-supplied model identifier into a provider/endpoint/
/// capability tuple. Unknown ids are rejected here, at parse time, rather
/// than surfacing as an opaque provider-side 404. The id is matched
/// case-insensitively via [`normalize_model_id`] so vendor-cased spellings
/// (e.g. `E5-Mistral-7B-Instruct`) resolve to the same registry entry.
///
/// # Errors
///
/// Returns [`RagError::ModelUnknown`] if `id` is not in the registry.
pub fn resolve_model(id: &str) -> Result<&'static ModelSpec, RagError> {
    registry()
        .get(normalize_model_id(id).as_str())
        .ok_or_else(|| RagError::ModelUnknown { model: id.to_string() })
}

/// Model identifier matching `model.identifier.normalize()`, case-insensitive
/// and tolerant of the vendor-cased spellings used in §8's seed scenarios
/// (e.g. `E5-Mistral-7B-Instruct`).
#[must_use]
pub fn normalize_model_id(id: &str) -> String {
    id.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_embedding_models_to_documented_dimensions() {
        let cases = [
            ("jina-embeddings-v3", 1024),
            ("jina-embeddings-v4", 2048),
            ("bge-multilingual-gemma2", 3584),
            ("e5-mistral-7b-instruct", 4096),
            ("bge-en-icl", 4096),
            ("qwen3-8b", 4096),
        ];
        for (id, dim) in cases {
            let spec = resolve_model(id).unwrap();
            assert_eq!(spec.kind, ModelKind::Embedding { dimension: dim });
        }
    }

    #[test]
    fn unknown_model_is_rejected() {
        let err = resolve_model("made-up-model").unwrap_err();
        assert!(matches!(err, RagError::ModelUnknown { .. }));
    }

    #[test]
    fn normalize_lowercases_vendor_casing() {
        assert_eq!(normalize_model_id("E5-Mistral-7B-Instruct"), "e5-mistral-7b-instruct");
    }

    #[test]
    fn resolve_model_tolerates_vendor_casing() {
        let spec = resolve_model("E5-Mistral-7B-Instruct").unwrap();
        assert_eq!(spec.id, "e5-mistral-7b-instruct");
    }
}
