//! The heartbeat thread (§5): one per session, reading from the
//! Storage-Daemon channel and writing to the Director channel only.
//!
//! Modeled per the design notes' resolution of the source's cyclic
//! session/heartbeat ownership: two independent handles over a shared
//! transport, coordinated by a single [`fd_core::cancel::CancelToken`] either
//! side can set, never a shared mutable session pointer.

use std::io;
use std::thread::JoinHandle;
use std::time::Duration;

use fd_core::cancel::CancelToken;

/// The longest the heartbeat thread will block in one
/// `wait_for_data_or_timeout` call (§5).
pub const MAX_WAIT: Duration = Duration::from_secs(5);

/// The Storage-Daemon/Director channel pair the heartbeat thread drives.
/// Implemented by the real socket pair in `filed`'s binary wiring and by a
/// fake in tests.
pub trait HeartbeatChannel: Send {
    /// Blocks for up to `timeout` waiting for data on the Storage-Daemon
    /// channel. Returns `true` if data became available, `false` on
    /// timeout.
    fn wait_for_data_or_timeout(&self, timeout: Duration) -> bool;

    /// Writes one heartbeat signal to the Director channel.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the write failed.
    fn send_heartbeat(&self) -> io::Result<()>;
}

/// A running heartbeat thread's handle.
pub struct HeartbeatHandle {
    cancel: CancelToken,
    join: Option<JoinHandle<()>>,
}

impl HeartbeatHandle {
    /// Sets the shared cancellation flag and waits for the thread to
    /// observe it and exit.
    pub fn stop(mut self) {
        self.cancel.cancel();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for HeartbeatHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Spawns the heartbeat thread for one session. `interval` bounds each
/// `wait_for_data_or_timeout` call; the thread re-checks `cancel` at every
/// loop boundary, so the bound is also the worst-case shutdown latency.
///
/// No heartbeat signal is sent if `interval` elapsed via data arriving
/// (rather than via timeout) — the channel was not idle, so there is
/// nothing to report.
pub fn spawn<C>(channel: C, cancel: CancelToken, interval: Duration) -> HeartbeatHandle
where
    C: HeartbeatChannel + 'static,
{
    let interval = interval.min(MAX_WAIT);
    let thread_cancel = cancel.clone();
    let join = std::thread::spawn(move || {
        while !thread_cancel.is_canceled() {
            let data_arrived = channel.wait_for_data_or_timeout(interval);
            if thread_cancel.is_canceled() {
                break;
            }
            if !data_arrived {
                if let Err(error) = channel.send_heartbeat() {
                    tracing::warn!(%error, "heartbeat write failed");
                    break;
                }
            }
        }
    });
    HeartbeatHandle {
        cancel,
        join: Some(join),
    }
}
