//! Owns the persistent index: collection lifecycle, partition-key
//! tenancy, and the dimension-autodetection contract that lets multiple
//! embedding providers coexist (§4.1).

#![warn(missing_debug_implementations)]

pub mod backend;
pub mod facade;
pub mod http;
pub mod memory;
pub mod partition;

pub use backend::{CollectionStats, SearchHit, VectorBackend};
pub use facade::{InsertOutcome, VectorStoreFacade};
pub use http::HttpBackend;
pub use memory::InMemoryBackend;
pub use partition::partition_for;

use ragforge_config::{StoreBackendKind, StoreConfig};
use std::sync::Arc;

/// Build the configured backend behind a facade.
#[must_use]
pub fn build_facade(config: &StoreConfig) -> VectorStoreFacade {
    let backend: Arc<dyn VectorBackend> = match config.backend {
        StoreBackendKind::InMemory => Arc::new(InMemoryBackend::new()),
        StoreBackendKind::Http => Arc::new(HttpBackend::new(config)),
    };
    VectorStoreFacade::new(backend)
}
