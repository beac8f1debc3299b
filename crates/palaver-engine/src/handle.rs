//! A cloneable handle for controlling the loop from the hosting UI.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio_util::sync::CancellationToken;

/// A cloneable handle for controlling the loop from outside.
///
/// Liveness is a [`CancellationToken`] the loop re-checks at every
/// resumption point; revoking it never hard-cancels an in-flight request,
/// it only discards the request's effects.
#[derive(Clone)]
pub struct EngineHandle {
    cancel: CancellationToken,
    is_running: Arc<AtomicBool>,
    idle_notify: Arc<tokio::sync::Notify>,
}

impl EngineHandle {
    pub(crate) fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            is_running: Arc::new(AtomicBool::new(false)),
            idle_notify: Arc::new(tokio::sync::Notify::new()),
        }
    }

    /// Revoke liveness. Idempotent: revoking twice has the same effect as
    /// once.
    pub fn deactivate(&self) {
        self.cancel.cancel();
    }

    /// Whether the loop is still allowed to produce side effects.
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Whether the loop is currently running.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    /// Wait until the loop finishes running.
    pub async fn wait_for_idle(&self) {
        let notified = self.idle_notify.notified();
        if !self.is_running.load(Ordering::Acquire) {
            return;
        }
        notified.await;
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.is_running.store(running, Ordering::Release);
        if !running {
            self.idle_notify.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deactivate_is_idempotent() {
        let handle = EngineHandle::new();
        assert!(handle.is_active());
        handle.deactivate();
        assert!(!handle.is_active());
        handle.deactivate();
        assert!(!handle.is_active());
    }

    #[tokio::test]
    async fn test_wait_for_idle_returns_when_not_running() {
        let handle = EngineHandle::new();
        handle.wait_for_idle().await;
    }
}
