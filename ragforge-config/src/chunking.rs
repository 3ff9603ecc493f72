//! Chunking configuration (§4.5).

use serde::{Deserialize, Serialize};

/// Segmentation method used by the chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingMethod {
    /// Ranked-separator recursive split (paragraph/line/sentence/word/char).
    #[default]
    Recursive,
    /// Header-aware split, then recursive within each section.
    Markdown,
    /// Fixed-size token windows with overlap stride.
    Token,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub method: ChunkingMethod,
    /// Tokens per chunk, clamped to `[100, 10_000]`.
    pub max_size: usize,
    /// Overlap between adjacent chunks in tokens, clamped to `[0, 1000]`.
    pub overlap: usize,
    /// Ranked separators for `recursive`, highest priority first.
    pub separators: Vec<String>,
    /// Markdown header prefixes that start a new section for `markdown`.
    pub markdown_headers: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            method: ChunkingMethod::Recursive,
            max_size: 1000,
            overlap: 300,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                ". ".to_string(),
                " ".to_string(),
                "".to_string(),
            ],
            markdown_headers: vec!["# ".to_string(), "## ".to_string(), "### ".to_string()],
        }
    }
}

impl ChunkingConfig {
    /// Clamp caller-supplied overrides into the documented bounds (§4.5).
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.max_size = self.max_size.clamp(100, 10_000);
        self.overlap = self.overlap.clamp(0, 1_000);
        self
    }
}
