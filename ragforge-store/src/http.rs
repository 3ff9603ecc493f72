//! HTTP-backed `VectorBackend` speaking a Milvus-like REST collection API
//! (§4.1). The exact wire shapes are out of scope per the spec — this is
//! one coherent JSON mapping onto the trait's operations, not a faithful
//! Milvus client.

use crate::backend::{CollectionStats, SearchHit, VectorBackend};
use async_trait::async_trait;
use ragforge_config::StoreConfig;
use ragforge_core::{Chunk, RagError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Speaks to an external Milvus-like collection service over HTTP/1.1
/// keep-alive JSON. The client is a per-process singleton built once in
/// `new`, matching the gateway's client-lifecycle rule (§9).
#[derive(Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// # Panics
    ///
    /// Panics if `config.request_timeout_ms` cannot be turned into a valid
    /// `reqwest::Client` (a malformed config should fail fast at startup).
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(config.pool_size)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .expect("store HTTP client configuration must be valid");
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Serialize)]
struct CreateCollectionBody<'a> {
    collection_name: &'a str,
    dimension: usize,
}

#[derive(Serialize)]
struct InsertBody<'a> {
    collection_name: &'a str,
    partition: u32,
    rows: &'a [Chunk],
}

#[derive(Deserialize)]
struct InsertResponse {
    inserted_count: usize,
}

#[derive(Serialize)]
struct DeleteBody<'a> {
    collection_name: &'a str,
    partition: Option<u32>,
    document_id: &'a str,
}

#[derive(Deserialize)]
struct DeleteResponse {
    deleted_count: usize,
}

#[derive(Serialize)]
struct SearchBody<'a> {
    collection_name: &'a str,
    partition: Option<u32>,
    vector: &'a [f32],
    top_k: usize,
}

#[derive(Deserialize)]
struct SearchResultRow {
    chunk: Chunk,
    score: f32,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchResultRow>,
}

#[derive(Deserialize)]
struct DescribeResponse {
    dimension: usize,
    num_partitions: u32,
    count: usize,
}

#[derive(Deserialize)]
struct ListCollectionsResponse {
    collections: Vec<String>,
}

fn map_transport_err(err: reqwest::Error) -> RagError {
    RagError::StoreUnavailable { message: err.to_string() }
}

fn map_status_err(status: reqwest::StatusCode, name: &str) -> RagError {
    match status {
        reqwest::StatusCode::NOT_FOUND => RagError::CollectionNotFound { name: name.to_string() },
        reqwest::StatusCode::CONFLICT => RagError::CollectionExists { name: name.to_string() },
        _ => RagError::StoreUnavailable { message: format!("unexpected status {status}") },
    }
}

#[async_trait]
impl VectorBackend for HttpBackend {
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<()> {
        let response = self
            .client
            .post(self.url("/collections"))
            .json(&CreateCollectionBody { collection_name: name, dimension })
            .send()
            .await
            .map_err(map_transport_err)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(map_status_err(response.status(), name))
        }
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/collections/{name}")))
            .send()
            .await
            .map_err(map_transport_err)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(map_status_err(response.status(), name))
        }
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.url("/collections"))
            .send()
            .await
            .map_err(map_transport_err)?;
        if !response.status().is_success() {
            return Err(RagError::StoreUnavailable {
                message: format!("unexpected status {}", response.status()),
            });
        }
        let body: ListCollectionsResponse = response.json().await.map_err(map_transport_err)?;
        Ok(body.collections)
    }

    async fn describe_collection(&self, name: &str) -> Result<CollectionStats> {
        let response = self
            .client
            .get(self.url(&format!("/collections/{name}")))
            .send()
            .await
            .map_err(map_transport_err)?;
        if !response.status().is_success() {
            return Err(map_status_err(response.status(), name));
        }
        let body: DescribeResponse = response.json().await.map_err(map_transport_err)?;
        Ok(CollectionStats {
            name: name.to_string(),
            dimension: body.dimension,
            num_partitions: body.num_partitions,
            chunk_count: body.count,
        })
    }

    async fn insert(&self, name: &str, partition: u32, chunks: &[Chunk]) -> Result<usize> {
        let response = self
            .client
            .post(self.url(&format!("/collections/{name}/insert")))
            .json(&InsertBody { collection_name: name, partition, rows: chunks })
            .send()
            .await
            .map_err(map_transport_err)?;
        if response.status() == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            return Err(RagError::DimensionMismatch {
                collection: name.to_string(),
                expected: 0,
                actual: 0,
            });
        }
        if !response.status().is_success() {
            return Err(map_status_err(response.status(), name));
        }
        let body: InsertResponse = response.json().await.map_err(map_transport_err)?;
        Ok(body.inserted_count)
    }

    async fn delete_by_document(
        &self,
        name: &str,
        partition: Option<u32>,
        document_id: &str,
    ) -> Result<usize> {
        let response = self
            .client
            .post(self.url(&format!("/collections/{name}/delete")))
            .json(&DeleteBody { collection_name: name, partition, document_id })
            .send()
            .await
            .map_err(map_transport_err)?;
        if !response.status().is_success() {
            return Err(map_status_err(response.status(), name));
        }
        let body: DeleteResponse = response.json().await.map_err(map_transport_err)?;
        Ok(body.deleted_count)
    }

    async fn search(
        &self,
        name: &str,
        partition: Option<u32>,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .post(self.url(&format!("/collections/{name}/search")))
            .json(&SearchBody { collection_name: name, partition, vector: query_vector, top_k })
            .send()
            .await
            .map_err(map_transport_err)?;
        if !response.status().is_success() {
            return Err(map_status_err(response.status(), name));
        }
        let body: SearchResponse = response.json().await.map_err(map_transport_err)?;
        Ok(body
            .results
            .into_iter()
            .map(|r| SearchHit { chunk: r.chunk, score: r.score })
            .collect())
    }
}
