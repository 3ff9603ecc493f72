//! The `VectorBackend` trait: everything a concrete store implementation
//! must provide. `VectorStoreFacade` owns partitioning, auto-dimension
//! detection, and collection bookkeeping on top of whichever backend is
//! configured (§4.1).

use async_trait::async_trait;
use ragforge_core::{Chunk, Result};
use serde::Serialize;

/// One scored hit from a `search` call.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// Collection statistics returned by `describe_collection` (§6 `/health`
/// and supplemented `describeCollection` stats).
#[derive(Debug, Clone)]
pub struct CollectionStats {
    pub name: String,
    pub dimension: usize,
    pub num_partitions: u32,
    pub chunk_count: usize,
}

/// A single backend's view of collection/partition storage, with no
/// knowledge of tenancy routing or dimension auto-detection — those are
/// the facade's job, so every backend implementation gets them for free.
#[async_trait]
pub trait VectorBackend: Send + Sync + std::fmt::Debug {
    /// Create a collection with a fixed dimension. Errors with
    /// `CollectionExists` if `name` is already present.
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<()>;

    /// Errors with `CollectionNotFound` if `name` is absent.
    async fn drop_collection(&self, name: &str) -> Result<()>;

    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Errors with `CollectionNotFound` if `name` is absent.
    async fn describe_collection(&self, name: &str) -> Result<CollectionStats>;

    /// Insert `chunks` into partition `partition` of `name`. Every chunk's
    /// `dense_vector` length MUST already equal the collection's dimension
    /// — the facade enforces this before calling in.
    async fn insert(&self, name: &str, partition: u32, chunks: &[Chunk]) -> Result<usize>;

    /// Delete every chunk matching `document_id` within `name`, optionally
    /// restricted to a single partition. Returns the number deleted.
    async fn delete_by_document(
        &self,
        name: &str,
        partition: Option<u32>,
        document_id: &str,
    ) -> Result<usize>;

    /// Search partition `partition` (or every partition, if `None`) of
    /// `name` for the `top_k` chunks with highest inner-product score
    /// against `query_vector`.
    async fn search(
        &self,
        name: &str,
        partition: Option<u32>,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>>;
}
