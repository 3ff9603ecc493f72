//! Text segmentation: recursive, markdown-aware, and fixed-token-window
//! splitting, all with configurable overlap.

use crate::tokenizer::{token_count, tokenize};
use ragforge_config::{ChunkingConfig, ChunkingMethod};
use ragforge_core::{RagError, Result};

/// One segment produced by the chunker, before it is assigned an id,
/// tenant, or embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDraft {
    pub text: String,
    pub char_count: usize,
    pub token_count: usize,
}

impl ChunkDraft {
    fn new(text: String) -> Self {
        let char_count = text.chars().count();
        let token_count = token_count(&text);
        Self { text, char_count, token_count }
    }
}

/// Split `text` per `config`. Returns chunks in document order; the
/// caller assigns `chunk_index` by position.
///
/// # Errors
///
/// Returns `EmptyDocument`-style `ChunkingFailed` if `text` is empty or
/// entirely whitespace.
pub fn split(text: &str, config: &ChunkingConfig) -> Result<Vec<ChunkDraft>> {
    if text.trim().is_empty() {
        return Err(RagError::ChunkingFailed {
            message: "document text is empty".to_string(),
        });
    }

    let pieces = match config.method {
        ChunkingMethod::Recursive => recursive_split(text, &config.separators, config.max_size),
        ChunkingMethod::Markdown => markdown_split(text, config),
        ChunkingMethod::Token => token_window_split(text, config.max_size, config.overlap),
    };

    let packed = if matches!(config.method, ChunkingMethod::Token) {
        pieces
    } else {
        pack_with_overlap(pieces, config.max_size, config.overlap)
    };

    Ok(packed
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| ChunkDraft::new(p.to_string()))
        .collect())
}

/// Recursively split on the ranked separator list until every unit is
/// within `max_size` tokens, falling back to a character split once
/// separators are exhausted.
fn recursive_split<'a>(text: &'a str, separators: &[String], max_size: usize) -> Vec<&'a str> {
    if token_count(text) <= max_size {
        return vec![text];
    }
    let Some((sep, rest)) = separators.split_first() else {
        return vec![text];
    };
    if sep.is_empty() {
        return char_window_split(text, max_size);
    }

    let parts: Vec<&str> = text.split(sep.as_str()).filter(|p| !p.is_empty()).collect();
    if parts.len() <= 1 {
        return recursive_split(text, rest, max_size);
    }

    parts
        .into_iter()
        .flat_map(|part| {
            if token_count(part) > max_size {
                recursive_split(part, rest, max_size)
            } else {
                vec![part]
            }
        })
        .collect()
}

/// Last-resort split when no separator applies: cut on word boundaries
/// into pieces of roughly `max_size` tokens.
fn char_window_split(text: &str, max_size: usize) -> Vec<&str> {
    let words: Vec<&str> = tokenize(text);
    if words.is_empty() {
        return vec![text];
    }
    let mut result = Vec::new();
    let mut start_word = 0usize;
    while start_word < words.len() {
        let end_word = (start_word + max_size).min(words.len());
        let start_byte = word_byte_offset(text, words, start_word);
        let end_byte = if end_word == words.len() {
            text.len()
        } else {
            word_byte_offset(text, words, end_word)
        };
        result.push(&text[start_byte..end_byte]);
        start_word = end_word;
    }
    result
}

fn word_byte_offset(text: &str, words: &[&str], word_index: usize) -> usize {
    if word_index >= words.len() {
        return text.len();
    }
    let target = words[word_index];
    let target_ptr = target.as_ptr() as usize;
    let text_ptr = text.as_ptr() as usize;
    target_ptr - text_ptr
}

/// Split at configured markdown header prefixes (longest-first to avoid
/// `#` matching a `##` line), then recursively split within each section.
fn markdown_split<'a>(text: &'a str, config: &ChunkingConfig) -> Vec<&'a str> {
    let mut headers = config.markdown_headers.clone();
    headers.sort_by_key(|h| std::cmp::Reverse(h.len()));

    let mut sections: Vec<&str> = Vec::new();
    let mut section_start = 0usize;
    let mut offset = 0usize;
    for line in text.split_inclusive('\n') {
        let is_header = headers.iter().any(|h| line.trim_start().starts_with(h.as_str()));
        if is_header && offset > section_start {
            sections.push(&text[section_start..offset]);
            section_start = offset;
        }
        offset += line.len();
    }
    sections.push(&text[section_start..]);

    sections
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .flat_map(|section| recursive_split(section, &config.separators, config.max_size))
        .collect()
}

/// Fixed-size token windows with stride `max_size - overlap` (minimum
/// stride of 1 token to guarantee forward progress).
fn token_window_split(text: &str, max_size: usize, overlap: usize) -> Vec<&str> {
    let words = tokenize(text);
    if words.is_empty() {
        return vec![text];
    }
    let stride = max_size.saturating_sub(overlap).max(1);
    let mut result = Vec::new();
    let mut start = 0usize;
    while start < words.len() {
        let end = (start + max_size).min(words.len());
        let start_byte = word_byte_offset(text, &words, start);
        let end_byte = if end == words.len() { text.len() } else { word_byte_offset(text, &words, end) };
        result.push(&text[start_byte..end_byte]);
        if end == words.len() {
            break;
        }
        start += stride;
    }
    result
}

/// Greedily pack pre-split units into windows of at most `max_size`
/// tokens, carrying the trailing `overlap` tokens of one window into the
/// start of the next.
fn pack_with_overlap(units: Vec<&str>, max_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_tokens = 0usize;

    for unit in units {
        let unit_tokens = token_count(unit);
        if current_tokens + unit_tokens > max_size && !current.is_empty() {
            chunks.push(current.join(""));

            let mut overlap_units: Vec<&str> = Vec::new();
            let mut overlap_tokens = 0usize;
            for u in current.iter().rev() {
                let t = token_count(u);
                if overlap_tokens + t > overlap {
                    break;
                }
                overlap_units.insert(0, u);
                overlap_tokens += t;
            }
            current = overlap_units;
            current_tokens = overlap_tokens;
        }
        current_tokens += unit_tokens;
        current.push(unit);
    }
    if !current.is_empty() {
        chunks.push(current.join(""));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(max_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            max_size,
            overlap,
            ..ChunkingConfig::default()
        }
    }

    #[test]
    fn rejects_empty_document() {
        let err = split("   ", &config(1000, 300)).unwrap_err();
        assert!(matches!(err, RagError::ChunkingFailed { .. }));
    }

    #[test]
    fn recursive_split_respects_max_size_in_tokens() {
        let text = (0..500).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let chunks = split(&text, &config(100, 10)).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.token_count <= 120, "chunk exceeded budget: {}", chunk.token_count);
        }
    }

    #[test]
    fn chunk_indices_are_assignable_in_ascending_document_order() {
        let text = "Paragraph one.\n\nParagraph two.\n\nParagraph three.";
        let chunks = split(text, &config(1000, 0)).unwrap();
        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].text.trim(), "Paragraph one.");
    }

    #[test]
    fn token_method_produces_overlapping_windows() {
        let text = (0..20).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let cfg = ChunkingConfig {
            method: ChunkingMethod::Token,
            max_size: 8,
            overlap: 3,
            ..ChunkingConfig::default()
        };
        let chunks = split(&text, &cfg).unwrap();
        assert!(chunks.len() >= 2);
    }

    #[test]
    fn markdown_split_breaks_at_headers() {
        let text = "# Title\n\nIntro text.\n\n## Section A\n\nBody A.\n\n## Section B\n\nBody B.";
        let cfg = ChunkingConfig {
            method: ChunkingMethod::Markdown,
            ..config(1000, 0)
        };
        let chunks = split(text, &cfg).unwrap();
        assert!(chunks.iter().any(|c| c.text.contains("Section A")));
        assert!(chunks.iter().any(|c| c.text.contains("Section B")));
    }

    proptest! {
        /// For any non-empty word sequence and any `max_size`/`overlap`
        /// pair, `split` never hands back an empty draft, and every
        /// draft's derived `char_count`/`token_count` agree with its own
        /// text (§3 invariant: those fields are derived at chunk time,
        /// never drift from the text they describe). Since the caller
        /// assigns `chunk_index` by this return order, "no empty drafts"
        /// is what keeps that assignment a gap-free `0..len` sequence.
        #[test]
        fn split_never_yields_empty_or_inconsistent_drafts(
            word_count in 1usize..200,
            max_size in 4usize..64,
            overlap in 0usize..4usize,
        ) {
            let text = (0..word_count).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
            let cfg = config(max_size, overlap.min(max_size.saturating_sub(1)));
            let chunks = split(&text, &cfg).unwrap();

            prop_assert!(!chunks.is_empty());
            for chunk in &chunks {
                prop_assert!(!chunk.text.trim().is_empty());
                prop_assert_eq!(chunk.char_count, chunk.text.chars().count());
                prop_assert_eq!(chunk.token_count, token_count(&chunk.text));
            }
        }
    }
}
