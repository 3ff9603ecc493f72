//! Graceful drain coordinator for SIGTERM (§6: "stop accepting requests,
//! wait up to the longest request deadline, then exit").
//!
//! Grounded on the teacher's `llmspell-kernel::daemon::shutdown::
//! ShutdownCoordinator` (phase tracking + an active-operation counter +
//! a broadcast channel), generalized down to what a stateless request
//! server needs: no state-save phase, no client notification phase,
//! since persisted state lives entirely in the vector store (§6).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Drain phase, broadcast to every in-flight request guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainPhase {
    Running,
    Draining,
}

/// Tracks in-flight request count and the drain phase. One instance is
/// shared (via `Arc`) across every route handler in [`AppState`].
#[derive(Debug)]
pub struct ShutdownCoordinator {
    active: AtomicU64,
    phase_tx: watch::Sender<DrainPhase>,
    grace_period: Duration,
}

/// RAII guard incrementing the active-request counter for the lifetime of
/// one handler invocation; decrements on drop regardless of how the
/// handler exits (including on client disconnect/cancellation, per §5).
pub struct OperationGuard<'a> {
    coordinator: &'a ShutdownCoordinator,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ShutdownCoordinator {
    #[must_use]
    pub fn new(grace_period: Duration) -> Self {
        let (phase_tx, _) = watch::channel(DrainPhase::Running);
        Self {
            active: AtomicU64::new(0),
            phase_tx,
            grace_period,
        }
    }

    /// Whether new requests should still be accepted.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        *self.phase_tx.borrow() == DrainPhase::Draining
    }

    /// Begin tracking one in-flight request.
    pub fn begin_operation(&self) -> OperationGuard<'_> {
        self.active.fetch_add(1, Ordering::SeqCst);
        OperationGuard { coordinator: self }
    }

    #[must_use]
    pub fn active_operations(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    /// Enter the draining phase and wait for in-flight requests to finish,
    /// up to `grace_period`. Logs a warning (never panics) if operations
    /// are still outstanding when the grace period elapses — the caller
    /// proceeds to exit regardless, per §6's bounded drain.
    pub async fn drain(&self) {
        info!("shutdown requested, draining in-flight requests");
        let _ = self.phase_tx.send(DrainPhase::Draining);

        let deadline = tokio::time::Instant::now() + self.grace_period;
        while self.active_operations() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        let remaining = self.active_operations();
        if remaining > 0 {
            warn!(remaining, "grace period elapsed with requests still in flight");
        } else {
            info!("drain complete, no requests in flight");
        }
    }
}

/// Wait for a SIGTERM (or Ctrl-C on platforms without SIGTERM) and drive
/// `coordinator` through its drain sequence.
pub async fn wait_for_shutdown_signal(coordinator: Arc<ShutdownCoordinator>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("received ctrl-c");
    }

    coordinator.drain().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_returns_immediately_with_no_active_operations() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(200));
        coordinator.drain().await;
        assert!(coordinator.is_draining());
    }

    #[tokio::test]
    async fn operation_guard_decrements_on_drop() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(1));
        {
            let _guard = coordinator.begin_operation();
            assert_eq!(coordinator.active_operations(), 1);
        }
        assert_eq!(coordinator.active_operations(), 0);
    }

    #[tokio::test]
    async fn drain_waits_for_active_operation_to_finish() {
        let coordinator = Arc::new(ShutdownCoordinator::new(Duration::from_secs(2)));
        let guard_coordinator = Arc::clone(&coordinator);
        let handle = tokio::spawn(async move {
            let _guard = guard_coordinator.begin_operation();
            tokio::time::sleep(Duration::from_millis(100)).await;
        });
        coordinator.drain().await;
        handle.await.unwrap();
        assert_eq!(coordinator.active_operations(), 0);
    }
}
