//! The two process-wide mutexes named in §5/§9.

use std::sync::Mutex;
use std::time::Duration;

/// Owns both process-wide serialization points, constructed once at
/// daemon startup and held for the process lifetime (§9, "Global
/// mutable state"). The session factory holds a shared reference; no
/// session owns or re-creates it.
#[derive(Debug, Default)]
pub struct ProcessLocks {
    auth_failure_sleep: Mutex<()>,
    vss_init: Mutex<()>,
}

impl ProcessLocks {
    /// Creates the process-wide locks. Call once from `main`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes the fixed post-auth-failure sleep (§4.6: 6 seconds)
    /// across concurrently failing connections, so a flood of bad
    /// credentials cannot fan out into unbounded parallel sleeps.
    pub fn throttle_auth_failure(&self, sleep: Duration) {
        let _guard = self.auth_failure_sleep.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        std::thread::sleep(sleep);
    }

    /// Runs `init` while holding the VSS-initialization lock, matching
    /// the platform constraint that volume-snapshot setup cannot run
    /// concurrently with another job's setup.
    pub fn with_vss_init<T>(&self, init: impl FnOnce() -> T) -> T {
        let _guard = self.vss_init.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn auth_failure_sleep_actually_sleeps() {
        let locks = ProcessLocks::new();
        let start = std::time::Instant::now();
        locks.throttle_auth_failure(Duration::from_millis(10));
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn vss_init_serializes_concurrent_callers() {
        let locks = Arc::new(ProcessLocks::new());
        let counter = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let locks = Arc::clone(&locks);
            let counter = Arc::clone(&counter);
            handles.push(std::thread::spawn(move || {
                locks.with_vss_init(|| {
                    let before = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    assert_eq!(before, 0, "overlapping VSS init detected");
                    std::thread::sleep(Duration::from_millis(5));
                    counter.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
                });
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
