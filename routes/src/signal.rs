//! Request cancellation.
//!
//! An [`AbortController`] hands out [`AbortSignal`]s. Put a signal into the
//! `signal` configuration key of a route (or a single request) and calling
//! [`AbortController::abort`] cancels every request carrying it; those
//! requests fail with [`ClientError::Aborted`](crate::error::ClientError::Aborted).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct AbortState {
    aborted: AtomicBool,
    notify: Notify,
}

/// The observing half of a cancellation pair.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    state: Arc<AbortState>,
}

impl AbortSignal {
    /// Returns `true` once the owning controller has aborted.
    pub fn is_aborted(&self) -> bool {
        self.state.aborted.load(Ordering::Acquire)
    }

    /// Completes when the owning controller aborts.
    ///
    /// Completes immediately if it already has.
    pub async fn aborted(&self) {
        let notified = self.state.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.is_aborted() {
            return;
        }
        notified.await;
    }

    /// Returns `true` if both signals belong to the same controller.
    pub fn same_as(&self, other: &AbortSignal) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

/// The triggering half of a cancellation pair.
#[derive(Debug, Default)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a signal tied to this controller.
    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Aborts every request carrying this controller's signal.
    pub fn abort(&self) {
        if !self.signal.state.aborted.swap(true, Ordering::AcqRel) {
            self.signal.state.notify.notify_waiters();
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.signal.is_aborted()
    }
}
