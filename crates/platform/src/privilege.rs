//! Privilege drop for the `-u`/`-g` CLI options (§6).
//!
//! Grounded on the same "isolate the unsafe platform call behind a typed
//! error" shape as [`crate::daemonize`]: group is dropped before user,
//! since `setgid` requires privileges that `setuid` would already have
//! given up.

use thiserror::Error;

/// A privilege-drop step failed.
#[derive(Debug, Error)]
pub enum PrivilegeError {
    /// The named user does not exist.
    #[error("unknown user: {0}")]
    UnknownUser(String),
    /// The named group does not exist.
    #[error("unknown group: {0}")]
    UnknownGroup(String),
    /// `setgid`/`setuid` failed.
    #[error("failed to drop privileges: {0}")]
    Syscall(#[source] std::io::Error),
}

/// Drops the process's group, then user, to the named accounts.
///
/// Does nothing for a `None` argument, so a daemon started as a
/// non-privileged user under a service supervisor is unaffected.
///
/// # Errors
///
/// Returns [`PrivilegeError`] if either name does not resolve or the
/// underlying syscall fails (normally because the process is not
/// running as `root`).
#[cfg(unix)]
pub fn drop_privileges(user: Option<&str>, group: Option<&str>) -> Result<(), PrivilegeError> {
    if let Some(name) = group {
        let resolved = nix::unistd::Group::from_name(name)
            .map_err(|e| PrivilegeError::Syscall(std::io::Error::from(e)))?
            .ok_or_else(|| PrivilegeError::UnknownGroup(name.to_string()))?;
        nix::unistd::setgid(resolved.gid).map_err(|e| PrivilegeError::Syscall(std::io::Error::from(e)))?;
    }
    if let Some(name) = user {
        let resolved = nix::unistd::User::from_name(name)
            .map_err(|e| PrivilegeError::Syscall(std::io::Error::from(e)))?
            .ok_or_else(|| PrivilegeError::UnknownUser(name.to_string()))?;
        nix::unistd::setuid(resolved.uid).map_err(|e| PrivilegeError::Syscall(std::io::Error::from(e)))?;
    }
    Ok(())
}

/// Non-Unix targets have no POSIX user/group model; `-u`/`-g` are
/// accepted but have no effect.
#[cfg(not(unix))]
pub fn drop_privileges(_user: Option<&str>, _group: Option<&str>) -> Result<(), PrivilegeError> {
    Ok(())
}
