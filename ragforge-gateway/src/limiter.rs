//! Semaphore-backed rate limiting with bounded wait.
//!
//! One mechanism, reused at four call sites per §5: the gateway's global
//! outbound-call budget, the embedder's concurrent-call cap, the metadata
//! extractor's per-chunk cap, and the retrieval orchestrator's concurrent-
//! retrieval cap. Grounded on the `Limiters::acquire_timed` pattern seen in
//! the retrieval pack's RAG service (semaphore acquire raced against a
//! deadline, with the wait duration surfaced for observability).

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::debug;

/// A named, bounded concurrency budget.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    name: &'static str,
    semaphore: Arc<Semaphore>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(name: &'static str, permits: usize) -> Self {
        Self {
            name,
            semaphore: Arc::new(Semaphore::new(permits.max(1))),
        }
    }

    /// Acquire a permit, waiting up to `deadline`. Returns the permit and
    /// how long the caller waited.
    ///
    /// # Errors
    ///
    /// Returns `Err(())` if `deadline` elapses before a permit is free;
    /// callers translate this into `GatewayBusy` or a stage-specific
    /// timeout error per §5.
    pub async fn acquire_timed(
        &self,
        deadline: Duration,
    ) -> Result<(SemaphorePermit<'_>, Duration), ()> {
        let start = Instant::now();
        match tokio::time::timeout(deadline, self.semaphore.acquire()).await {
            Ok(Ok(permit)) => {
                let wait = start.elapsed();
                debug!(limiter = self.name, wait_ms = wait.as_millis() as u64, "acquired permit");
                Ok((permit, wait))
            }
            _ => Err(()),
        }
    }

    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquires_immediately_when_permits_free() {
        let limiter = RateLimiter::new("test", 2);
        let (_permit, wait) = limiter.acquire_timed(Duration::from_millis(50)).await.unwrap();
        assert!(wait < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn times_out_when_exhausted() {
        let limiter = RateLimiter::new("test", 1);
        let _held = limiter.acquire_timed(Duration::from_millis(50)).await.unwrap();
        let result = limiter.acquire_timed(Duration::from_millis(20)).await;
        assert!(result.is_err());
    }
}
