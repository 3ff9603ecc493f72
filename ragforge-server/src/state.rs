//! Process-wide application state wired once at startup and shared
//! (via `Arc`) across every route handler.

use crate::error::ApiError;
use crate::shutdown::{OperationGuard, ShutdownCoordinator};
use ragforge_config::RagForgeConfig;
use ragforge_gateway::LlmGateway;
use ragforge_rag::{Embedder, IngestionOrchestrator, RetrievalOrchestrator};
use ragforge_store::VectorStoreFacade;
use std::sync::Arc;
use std::time::Instant;

/// Everything a handler needs: the two orchestrators, the lower-level
/// components health checks probe directly, the frozen config, and the
/// shutdown coordinator. Cloning an `AppState` is cheap (every field is
/// an `Arc` or `Copy`), matching axum's per-request `State` extraction.
#[derive(Clone)]
pub struct AppState {
    pub ingestion: Arc<IngestionOrchestrator>,
    pub retrieval: Arc<RetrievalOrchestrator>,
    pub store: Arc<VectorStoreFacade>,
    pub gateway: Arc<LlmGateway>,
    pub embedder: Arc<Embedder>,
    pub config: Arc<RagForgeConfig>,
    pub shutdown: Arc<ShutdownCoordinator>,
    pub started_at: Instant,
    pub version: &'static str,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").field("version", &self.version).finish_non_exhaustive()
    }
}

impl AppState {
    /// Rejects the request if the server is draining, otherwise registers
    /// it with the shutdown coordinator for the handler's lifetime.
    pub fn begin_request(&self) -> Result<OperationGuard<'_>, ApiError> {
        if self.shutdown.is_draining() {
            return Err(ApiError(ragforge_core::RagError::RequestCancelled {
                reason: "server is draining".to_string(),
            }));
        }
        Ok(self.shutdown.begin_operation())
    }
}
