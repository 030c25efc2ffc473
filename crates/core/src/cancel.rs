//! Cooperative cancellation (§5, §9).
//!
//! The session thread and the heartbeat thread each hold an independent
//! handle over the shared socket transport; cancellation is modeled as a
//! single atomic flag either side can set, never a shared mutable session
//! pointer. The flag is edge-triggered in spirit: setting it twice has the
//! same effect as setting it once, and every loop that reads from a
//! socket, reads from disk, or walks the fileset checks it at each
//! iteration boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable, shareable cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a fresh, not-yet-canceled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the token canceled. Idempotent: subsequent calls are no-ops.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether [`Self::cancel`] has been called on this token or any of
    /// its clones.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
