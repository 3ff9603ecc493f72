//! `VectorStoreFacade`: tenant partition routing, auto-dimension
//! detection, and the description field the raw backend trait doesn't
//! carry, layered over any `VectorBackend` (§4.1).

use crate::backend::{CollectionStats, SearchHit, VectorBackend};
use crate::partition::partition_for;
use dashmap::DashMap;
use ragforge_core::{Chunk, RagError, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of an `insert` call.
#[derive(Debug, Clone)]
pub struct InsertOutcome {
    pub inserted_count: usize,
    pub ids: Vec<String>,
}

/// The facade a consumer actually talks to. Wraps a `VectorBackend` with
/// partition routing and the auto-dimension contract (§4.1): the first
/// insert into a missing collection fixes its dimension; every later
/// insert with a mismatched vector length fails without partially
/// inserting.
pub struct VectorStoreFacade {
    backend: Arc<dyn VectorBackend>,
    descriptions: DashMap<String, Option<String>>,
}

impl std::fmt::Debug for VectorStoreFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStoreFacade").field("backend", &self.backend).finish()
    }
}

impl VectorStoreFacade {
    #[must_use]
    pub fn new(backend: Arc<dyn VectorBackend>) -> Self {
        Self {
            backend,
            descriptions: DashMap::new(),
        }
    }

    /// Explicit collection creation. Errors `CollectionExists` if `name`
    /// is already present.
    pub async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        description: Option<String>,
    ) -> Result<()> {
        self.backend.create_collection(name, dimension).await?;
        self.descriptions.insert(name.to_string(), description);
        info!(collection = name, dimension, "collection created");
        Ok(())
    }

    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.backend.drop_collection(name).await?;
        self.descriptions.remove(name);
        info!(collection = name, "collection deleted");
        Ok(())
    }

    pub async fn list_collections(&self) -> Result<Vec<String>> {
        self.backend.list_collections().await
    }

    pub async fn describe_collection(&self, name: &str) -> Result<CollectionStats> {
        self.backend.describe_collection(name).await
    }

    /// Insert `chunks` into `collection`, each chunk routed to the
    /// partition its `tenant_id` hashes to. If the collection does not
    /// exist and `create_if_missing` is true, it is created with the
    /// dimension of `chunks[0].dense_vector`. Validates every chunk's
    /// vector length against the (possibly just-detected) dimension
    /// before issuing any backend insert, so a mismatch never leaves a
    /// partial write behind (§4.1 auto-dimension contract).
    ///
    /// # Errors
    ///
    /// Returns `EmptyDocument`-adjacent `InvalidRequest` if `chunks` is
    /// empty, `CollectionNotFound` if the collection is missing and
    /// `create_if_missing` is false, or `DimensionMismatch` if any chunk's
    /// vector length disagrees with the collection's dimension.
    pub async fn insert(
        &self,
        collection: &str,
        chunks: &[Chunk],
        create_if_missing: bool,
    ) -> Result<InsertOutcome> {
        if chunks.is_empty() {
            return Err(RagError::InvalidRequest {
                message: "insert called with zero chunks".to_string(),
            });
        }

        let dimension = match self.backend.describe_collection(collection).await {
            Ok(stats) => stats.dimension,
            Err(RagError::CollectionNotFound { .. }) if create_if_missing => {
                let dimension = chunks[0].dense_vector.len();
                self.backend.create_collection(collection, dimension).await?;
                self.descriptions.insert(collection.to_string(), None);
                info!(collection, dimension, "collection auto-created on first insert");
                dimension
            }
            Err(err) => return Err(err),
        };

        for chunk in chunks {
            if chunk.dense_vector.len() != dimension {
                return Err(RagError::DimensionMismatch {
                    collection: collection.to_string(),
                    expected: dimension,
                    actual: chunk.dense_vector.len(),
                });
            }
        }

        let mut by_partition: std::collections::HashMap<u32, Vec<Chunk>> =
            std::collections::HashMap::new();
        for chunk in chunks {
            let partition = partition_for(&chunk.tenant_id);
            by_partition.entry(partition).or_default().push(chunk.clone());
        }

        let mut inserted_count = 0usize;
        for (partition, group) in &by_partition {
            inserted_count += self.backend.insert(collection, *partition, group).await?;
        }

        Ok(InsertOutcome {
            inserted_count,
            ids: chunks.iter().map(|c| c.id.clone()).collect(),
        })
    }

    /// Delete every chunk belonging to `document_id`. If `tenant_id` is
    /// supplied, only that tenant's partition is touched.
    pub async fn delete_by_document(
        &self,
        collection: &str,
        document_id: &str,
        tenant_id: Option<&str>,
    ) -> Result<usize> {
        let partition = tenant_id.map(partition_for);
        let deleted = self.backend.delete_by_document(collection, partition, document_id).await?;
        debug!(collection, document_id, deleted, "document deleted");
        Ok(deleted)
    }

    /// Search `collection` for the `top_k` nearest chunks to
    /// `query_vector`. When `tenant_id` is supplied, the search is
    /// restricted to that tenant's single partition (§4.1 invariant).
    pub async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        top_k: usize,
        tenant_id: Option<&str>,
    ) -> Result<Vec<SearchHit>> {
        let partition = tenant_id.map(partition_for);
        self.backend.search(collection, partition, query_vector, top_k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use chrono::Utc;

    fn chunk(id: &str, doc: &str, tenant: &str, index: u32, vector: Vec<f32>) -> Chunk {
        let now = Utc::now();
        Chunk {
            id: id.to_string(),
            document_id: doc.to_string(),
            tenant_id: tenant.to_string(),
            chunk_index: index,
            text: "hello".to_string(),
            char_count: 5,
            token_count: 1,
            dense_vector: vector,
            keywords: String::new(),
            topics: String::new(),
            questions: String::new(),
            summary: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn facade() -> VectorStoreFacade {
        VectorStoreFacade::new(Arc::new(InMemoryBackend::new()))
    }

    #[tokio::test]
    async fn auto_dim_freezes_on_first_insert() {
        let facade = facade();
        let outcome = facade
            .insert("c", &[chunk("a", "doc", "default", 0, vec![1.0, 0.0, 0.0, 0.0])], true)
            .await
            .unwrap();
        assert_eq!(outcome.inserted_count, 1);

        let err = facade
            .insert("c", &[chunk("b", "doc2", "default", 0, vec![1.0, 0.0])], true)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 4, actual: 2, .. }));

        let stats = facade.describe_collection("c").await.unwrap();
        assert_eq!(stats.chunk_count, 1, "mismatched insert must not partially write");
    }

    #[tokio::test]
    async fn tenant_isolation_restricts_search_to_one_partition() {
        let facade = facade();
        facade
            .insert(
                "c",
                &[
                    chunk("a", "d_a", "acme", 0, vec![1.0, 0.0]),
                    chunk("b", "d_b", "beta", 0, vec![1.0, 0.0]),
                ],
                true,
            )
            .await
            .unwrap();

        let hits = facade.search("c", &[1.0, 0.0], 10, Some("acme")).await.unwrap();
        assert!(hits.iter().all(|h| h.chunk.document_id != "d_b"));
    }

    #[tokio::test]
    async fn delete_then_search_returns_no_trace_of_document() {
        let facade = facade();
        facade
            .insert("c", &[chunk("a", "doc", "default", 0, vec![1.0, 0.0])], true)
            .await
            .unwrap();
        facade.delete_by_document("c", "doc", None).await.unwrap();
        let hits = facade.search("c", &[1.0, 0.0], 10, None).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn reinserting_same_document_id_is_idempotent_after_delete_then_insert() {
        let facade = facade();
        let c = chunk("doc_chunk_0", "doc", "default", 0, vec![1.0, 0.0]);
        facade.insert("c", &[c.clone()], true).await.unwrap();
        facade.delete_by_document("c", "doc", None).await.unwrap();
        facade.insert("c", &[c], true).await.unwrap();
        let stats = facade.describe_collection("c").await.unwrap();
        assert_eq!(stats.chunk_count, 1);
    }
}
