//! Stable tenant → partition routing (§4.1).

use ragforge_core::NUM_PARTITIONS;
use std::hash::{Hash, Hasher};

/// Map a tenant id to one of `NUM_PARTITIONS` partitions by a stable hash.
/// Deterministic across process restarts: `DefaultHasher`'s algorithm is
/// fixed by its documented contract for a given Rust toolchain, and the
/// facade never needs cross-version stability beyond a single deployment.
#[must_use]
pub fn partition_for(tenant_id: &str) -> u32 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    tenant_id.hash(&mut hasher);
    (hasher.finish() % u64::from(NUM_PARTITIONS)) as u32
}
