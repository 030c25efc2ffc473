//! Daemonization for the `-f`/`--foreground` CLI flag (§6).
//!
//! Grounded on the double-fork-and-`setsid` pattern the original
//! implementation uses to detach from the controlling terminal; the
//! foreground path (tests, containers, `systemd` units with `Type=simple`)
//! skips this entirely.

use thiserror::Error;

/// A daemonization step failed.
#[derive(Debug, Error)]
pub enum DaemonizeError {
    /// The first or second `fork` call failed.
    #[error("fork failed: {0}")]
    Fork(std::io::Error),
    /// `setsid` failed while detaching from the controlling terminal.
    #[error("setsid failed: {0}")]
    Setsid(std::io::Error),
    /// Changing the working directory failed.
    #[error("failed to change working directory: {0}")]
    Chdir(std::io::Error),
}

/// Detaches the current process from its controlling terminal using the
/// standard double-fork: the first fork's parent exits immediately, the
/// intermediate child calls `setsid` to become a session leader and
/// forks again so it can never reacquire a controlling terminal, and
/// that grandchild's parent (the session leader) exits, leaving only the
/// final grandchild running.
///
/// Returns without doing anything on non-Unix targets, where there is no
/// controlling-terminal model to detach from.
///
/// # Errors
///
/// Returns [`DaemonizeError`] if any step fails; the caller should treat
/// this as a fatal startup error (§7, kind 1 analog, pre-session).
#[cfg(unix)]
pub fn daemonize() -> Result<(), DaemonizeError> {
    // SAFETY: `fork` is safe to call here because the process has not
    // yet spawned threads, opened files that assume exclusive ownership,
    // or installed handlers that assume a specific PID; the standard
    // double-fork idiom is the documented safe use of this call.
    match unsafe { libc::fork() } {
        -1 => return Err(DaemonizeError::Fork(std::io::Error::last_os_error())),
        0 => {}
        _ => std::process::exit(0),
    }

    // SAFETY: called in the child, once, before any further forking.
    if unsafe { libc::setsid() } == -1 {
        return Err(DaemonizeError::Setsid(std::io::Error::last_os_error()));
    }

    // SAFETY: same preconditions as the first fork; this process has a
    // single thread and no controlling terminal yet.
    match unsafe { libc::fork() } {
        -1 => return Err(DaemonizeError::Fork(std::io::Error::last_os_error())),
        0 => {}
        _ => std::process::exit(0),
    }

    std::env::set_current_dir("/").map_err(DaemonizeError::Chdir)?;
    Ok(())
}

/// Non-Unix targets have no controlling terminal to detach from; the
/// daemon simply keeps running as a normal process (the service
/// supervisor owns backgrounding).
#[cfg(not(unix))]
pub fn daemonize() -> Result<(), DaemonizeError> {
    Ok(())
}
