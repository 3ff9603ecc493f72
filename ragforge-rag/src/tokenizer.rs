//! Token accounting for chunk-size budgeting, compatible with the
//! embedder's tokenizer (§4.5: "a BPE-like scheme compatible with the
//! embedder's tokenizer").
//!
//! Grounded on the teacher's `TokenCounter`/`TiktokenCounter`/
//! `CharacterTokenCounter`/`TokenCounterFactory` shape
//! (`llmspell-rag/src/chunking/tokenizer.rs`): a `tiktoken-rs`
//! `cl100k_base` BPE counter built once per process, falling back to a
//! character estimate only if the BPE tables fail to load.

use std::sync::OnceLock;
use tiktoken_rs::{cl100k_base, CoreBPE};

/// Characters-per-token estimate used only if the BPE tables fail to load
/// (mirrors the teacher's `CharacterTokenCounter::default_estimate`).
const FALLBACK_CHARS_PER_TOKEN: usize = 4;

fn bpe() -> &'static Option<CoreBPE> {
    static BPE: OnceLock<Option<CoreBPE>> = OnceLock::new();
    BPE.get_or_init(|| cl100k_base().ok())
}

/// Count tokens in `text` against the `cl100k_base` BPE vocabulary,
/// falling back to a character-count estimate if the tokenizer failed to
/// build.
#[must_use]
pub fn token_count(text: &str) -> usize {
    match bpe() {
        Some(tokenizer) => tokenizer.encode_ordinary(text).len(),
        None => text.chars().count() / FALLBACK_CHARS_PER_TOKEN,
    }
}

/// Split `text` into the whitespace-delimited units the chunker's
/// windowing logic slices on. Distinct from `token_count`: windowing
/// needs stable `&str` byte offsets into the original text, which BPE
/// token boundaries don't guarantee across subword splits.
#[must_use]
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}
