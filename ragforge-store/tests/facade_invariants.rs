//! Property-based tests for the Vector Store Facade (spec §8 universal
//! invariants), in the style of the teacher's `property_tests.rs` files:
//! strategies generate arbitrary inputs, the test asserts an invariant
//! that must hold for every one of them.

use chrono::Utc;
use proptest::prelude::*;
use ragforge_core::{Chunk, RagError};
use ragforge_store::{InMemoryBackend, VectorStoreFacade};
use std::sync::Arc;

fn chunk(id: &str, document_id: &str, tenant_id: &str, chunk_index: u32, dense_vector: Vec<f32>) -> Chunk {
    let now = Utc::now();
    Chunk {
        id: id.to_string(),
        document_id: document_id.to_string(),
        tenant_id: tenant_id.to_string(),
        chunk_index,
        text: "text".to_string(),
        char_count: 4,
        token_count: 1,
        dense_vector,
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

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Runtime::new().unwrap()
}

proptest! {
    /// Auto-dim (§4.1, §8): whatever length the first inserted chunk's
    /// vector has becomes the collection's frozen dimension, and every
    /// later insert whose vectors disagree with it fails without
    /// changing the stored chunk count.
    #[test]
    fn auto_dim_freezes_to_first_insert_length(
        first_dim in 1usize..16,
        second_dim in 1usize..16,
    ) {
        let rt = runtime();
        rt.block_on(async {
            let facade = facade();
            facade
                .insert("c", &[chunk("a", "doc_a", "default", 0, vec![1.0; first_dim])], true)
                .await
                .unwrap();

            let result = facade
                .insert("c", &[chunk("b", "doc_b", "default", 0, vec![1.0; second_dim])], true)
                .await;

            if second_dim == first_dim {
                prop_assert!(result.is_ok());
            } else {
                let err = result.unwrap_err();
                prop_assert!(matches!(
                    err,
                    RagError::DimensionMismatch { expected, actual, .. }
                        if expected == first_dim && actual == second_dim
                ));
            }

            let stats = facade.describe_collection("c").await.unwrap();
            let expected_count = if second_dim == first_dim { 2 } else { 1 };
            prop_assert_eq!(stats.chunk_count, expected_count);
            Ok(())
        })?;
    }

    /// Tenant isolation (§4.1, §8): searching with a tenant filter never
    /// surfaces a chunk belonging to a different tenant, for any pair of
    /// distinct tenant ids.
    #[test]
    fn tenant_filtered_search_never_crosses_tenants(
        tenant_a in "[a-z]{3,10}",
        tenant_b in "[a-z]{3,10}",
    ) {
        prop_assume!(tenant_a != tenant_b);
        let rt = runtime();
        rt.block_on(async {
            let facade = facade();
            facade
                .insert(
                    "c",
                    &[
                        chunk("a", "doc_a", &tenant_a, 0, vec![1.0, 0.0]),
                        chunk("b", "doc_b", &tenant_b, 0, vec![1.0, 0.0]),
                    ],
                    true,
                )
                .await
                .unwrap();

            let hits = facade.search("c", &[1.0, 0.0], 10, Some(&tenant_a)).await.unwrap();
            prop_assert!(hits.iter().all(|h| h.chunk.tenant_id == tenant_a));
            Ok(())
        })?;
    }

    /// Deleting a document leaves no chunk of it behind, for any number
    /// of chunks that document was split into (§3 invariant 5, §8).
    #[test]
    fn delete_document_leaves_no_orphans(chunk_count in 1usize..8) {
        let rt = runtime();
        rt.block_on(async {
            let facade = facade();
            let chunks: Vec<Chunk> = (0..chunk_count as u32)
                .map(|i| chunk(&format!("doc_chunk_{i}"), "doc", "default", i, vec![1.0, 0.0]))
                .collect();
            facade.insert("c", &chunks, true).await.unwrap();

            facade.delete_by_document("c", "doc", None).await.unwrap();

            let hits = facade.search("c", &[1.0, 0.0], (chunk_count + 1) as usize, None).await.unwrap();
            prop_assert!(hits.iter().all(|h| h.chunk.document_id != "doc"));
            Ok(())
        })?;
    }
}
