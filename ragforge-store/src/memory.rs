//! In-process reference `VectorBackend`. Default for local development and
//! the test suite; exercises the same contract an HTTP-backed Milvus-like
//! store would (§4.1).

use crate::backend::{CollectionStats, SearchHit, VectorBackend};
use async_trait::async_trait;
use dashmap::DashMap;
use ragforge_core::{Chunk, NUM_PARTITIONS, RagError, Result};
use std::sync::Arc;

struct CollectionData {
    dimension: usize,
    partitions: Vec<DashMap<String, Chunk>>,
}

impl CollectionData {
    fn new(dimension: usize) -> Self {
        let partitions = (0..NUM_PARTITIONS).map(|_| DashMap::new()).collect();
        Self { dimension, partitions }
    }

    fn chunk_count(&self) -> usize {
        self.partitions.iter().map(DashMap::len).sum()
    }
}

/// A plain-memory vector store. Not persisted; dropped with the process.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    collections: DashMap<String, Arc<CollectionData>>,
}

impl std::fmt::Debug for CollectionData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionData")
            .field("dimension", &self.dimension)
            .field("chunk_count", &self.chunk_count())
            .finish()
    }
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorBackend for InMemoryBackend {
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<()> {
        if self.collections.contains_key(name) {
            return Err(RagError::CollectionExists { name: name.to_string() });
        }
        self.collections.insert(name.to_string(), Arc::new(CollectionData::new(dimension)));
        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        self.collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RagError::CollectionNotFound { name: name.to_string() })
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self.collections.iter().map(|e| e.key().clone()).collect())
    }

    async fn describe_collection(&self, name: &str) -> Result<CollectionStats> {
        let entry = self
            .collections
            .get(name)
            .ok_or_else(|| RagError::CollectionNotFound { name: name.to_string() })?;
        Ok(CollectionStats {
            name: name.to_string(),
            dimension: entry.dimension,
            num_partitions: NUM_PARTITIONS,
            chunk_count: entry.chunk_count(),
        })
    }

    async fn insert(&self, name: &str, partition: u32, chunks: &[Chunk]) -> Result<usize> {
        let entry = self
            .collections
            .get(name)
            .ok_or_else(|| RagError::CollectionNotFound { name: name.to_string() })?;
        for chunk in chunks {
            if chunk.dense_vector.len() != entry.dimension {
                return Err(RagError::DimensionMismatch {
                    collection: name.to_string(),
                    expected: entry.dimension,
                    actual: chunk.dense_vector.len(),
                });
            }
        }
        let shard = &entry.partitions[partition as usize];
        for chunk in chunks {
            shard.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(chunks.len())
    }

    async fn delete_by_document(
        &self,
        name: &str,
        partition: Option<u32>,
        document_id: &str,
    ) -> Result<usize> {
        let entry = self
            .collections
            .get(name)
            .ok_or_else(|| RagError::CollectionNotFound { name: name.to_string() })?;
        let shards: Vec<&DashMap<String, Chunk>> = match partition {
            Some(p) => vec![&entry.partitions[p as usize]],
            None => entry.partitions.iter().collect(),
        };
        let mut deleted = 0usize;
        for shard in shards {
            let ids: Vec<String> = shard
                .iter()
                .filter(|e| e.value().document_id == document_id)
                .map(|e| e.key().clone())
                .collect();
            for id in ids {
                if shard.remove(&id).is_some() {
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }

    async fn search(
        &self,
        name: &str,
        partition: Option<u32>,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let entry = self
            .collections
            .get(name)
            .ok_or_else(|| RagError::CollectionNotFound { name: name.to_string() })?;
        let shards: Vec<&DashMap<String, Chunk>> = match partition {
            Some(p) => vec![&entry.partitions[p as usize]],
            None => entry.partitions.iter().collect(),
        };

        let mut hits: Vec<SearchHit> = Vec::new();
        for shard in shards {
            for item in shard.iter() {
                let chunk = item.value();
                let score = inner_product(query_vector, &chunk.dense_vector);
                hits.push(SearchHit { chunk: chunk.clone(), score });
            }
        }
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.chunk.chunk_index.cmp(&b.chunk.chunk_index))
        });
        hits.truncate(top_k);
        Ok(hits)
    }
}

fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn chunk(id: &str, doc: &str, index: u32, vector: Vec<f32>) -> Chunk {
        let now = Utc::now();
        Chunk {
            id: id.to_string(),
            document_id: doc.to_string(),
            tenant_id: "default".to_string(),
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

    #[tokio::test]
    async fn insert_rejects_dimension_mismatch_without_partial_insert() {
        let backend = InMemoryBackend::new();
        backend.create_collection("c", 3).await.unwrap();
        let chunks = vec![chunk("a", "doc", 0, vec![1.0, 0.0, 0.0]), chunk("b", "doc", 1, vec![1.0, 0.0])];
        let err = backend.insert("c", 0, &chunks).await.unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { .. }));
        let stats = backend.describe_collection("c").await.unwrap();
        assert_eq!(stats.chunk_count, 0);
    }

    #[tokio::test]
    async fn delete_by_document_removes_only_that_document() {
        let backend = InMemoryBackend::new();
        backend.create_collection("c", 2).await.unwrap();
        backend
            .insert(
                "c",
                0,
                &[chunk("a", "doc1", 0, vec![1.0, 0.0]), chunk("b", "doc2", 0, vec![0.0, 1.0])],
            )
            .await
            .unwrap();
        let deleted = backend.delete_by_document("c", None, "doc1").await.unwrap();
        assert_eq!(deleted, 1);
        let stats = backend.describe_collection("c").await.unwrap();
        assert_eq!(stats.chunk_count, 1);
    }

    #[tokio::test]
    async fn search_sorts_by_score_then_chunk_index() {
        let backend = InMemoryBackend::new();
        backend.create_collection("c", 2).await.unwrap();
        backend
            .insert(
                "c",
                0,
                &[
                    chunk("a", "doc", 0, vec![1.0, 0.0]),
                    chunk("b", "doc", 1, vec![0.0, 1.0]),
                ],
            )
            .await
            .unwrap();
        let hits = backend.search("c", None, &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits[0].chunk.id, "a");
    }
}
