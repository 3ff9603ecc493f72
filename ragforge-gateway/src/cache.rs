//! Sharded, TTL-bounded LRU cache shared by the gateway's response cache
//! and reused (per §9's consolidation note) by the embedder and answer
//! caches in `ragforge-rag`.
//!
//! Grounded on the same shape as the teacher's hand-rolled
//! `llmspell-rag::embeddings::cache::EmbeddingCache` (HashMap + stats +
//! manual eviction), generalized to: an actual `lru::LruCache` per shard
//! (so eviction is real LRU, not the teacher's documented
//! least-recently-accessed linear scan), and sharding so no single lock
//! serializes every cache access (§5 locking discipline: at least 8
//! shards).

use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

struct Shard<V> {
    lru: Mutex<LruCache<String, Entry<V>>>,
}

/// A sharded cache with a fixed capacity per shard and a TTL applied
/// uniformly to all entries.
pub struct ShardedCache<V> {
    shards: Vec<Shard<V>>,
    ttl: Duration,
    hits: std::sync::atomic::AtomicU64,
    misses: std::sync::atomic::AtomicU64,
}

impl<V: Clone> ShardedCache<V> {
    /// Build a cache with `shard_count` shards (clamped to a minimum of 8)
    /// each holding `capacity / shard_count` entries.
    #[must_use]
    pub fn new(capacity: usize, shard_count: usize, ttl: Duration) -> Self {
        let shard_count = shard_count.max(8);
        let per_shard = (capacity / shard_count).max(1);
        let cap = NonZeroUsize::new(per_shard).unwrap_or(NonZeroUsize::new(1).unwrap());
        let shards = (0..shard_count)
            .map(|_| Shard {
                lru: Mutex::new(LruCache::new(cap)),
            })
            .collect();
        Self {
            shards,
            ttl,
            hits: std::sync::atomic::AtomicU64::new(0),
            misses: std::sync::atomic::AtomicU64::new(0),
        }
    }

    fn shard_for(&self, key: &str) -> &Shard<V> {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        let idx = (hasher.finish() as usize) % self.shards.len();
        &self.shards[idx]
    }

    /// Fetch a value, evicting it first if its TTL has elapsed. Cache hits
    /// are indistinguishable from a live response except in latency, per
    /// §4.2.
    pub fn get(&self, key: &str) -> Option<V> {
        let shard = self.shard_for(key);
        let mut lru = shard.lru.lock();
        if let Some(entry) = lru.get(key) {
            if entry.inserted_at.elapsed() > self.ttl {
                lru.pop(key);
                self.misses.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                return None;
            }
            self.hits.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            Some(entry.value.clone())
        } else {
            self.misses.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            None
        }
    }

    pub fn put(&self, key: String, value: V) {
        let shard = self.shard_for(&key);
        let mut lru = shard.lru.lock();
        lru.put(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lru.lock().clear();
        }
    }

    #[must_use]
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(std::sync::atomic::Ordering::Relaxed),
            self.misses.load(std::sync::atomic::Ordering::Relaxed),
        )
    }
}

/// Canonical cache key: SHA-256 over a caller-supplied tuple, rendered as
/// hex. Used for `(model, temperature, messages)` completion keys,
/// `(model, text)` embedding keys, and `(query, intent, ordered_chunk_ids,
/// model, temperature)` answer keys — one key format across services, per
/// the §9 design note.
#[must_use]
pub fn canonical_key(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]); // separator, prevents ("ab","c") == ("a","bc")
    }
    format!("{:x}", hasher.finalize())
}
