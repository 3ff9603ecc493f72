//! Shared domain types and error taxonomy for the RAGforge ingestion and
//! retrieval pipelines.
//!
//! This crate sits at the bottom of the dependency graph: every other
//! `ragforge-*` crate depends on it, it depends on nothing in the
//! workspace. It owns only data — no I/O, no async traits.

#![warn(missing_debug_implementations)]

pub mod error;
pub mod types;

pub use error::{RagError, Result};
pub use types::{
    Answer, Chunk, Citation, Collection, Document, Intent, IntentLabel, StageReport, StageReports,
    DEFAULT_TENANT, NUM_PARTITIONS,
};
