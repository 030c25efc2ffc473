//! The four-kind error taxonomy from the error-handling design.
//!
//! Fatal session errors terminate the job outright. Fatal per-file errors
//! abort only the file currently being processed. Soft per-file errors are
//! logged (capped at [`SOFT_ERROR_LOG_CAP`] occurrences per kind per job)
//! and otherwise swallowed into a counter. Informational events never
//! surface as an `Err` at all; they are plain log lines.

use std::io;

use thiserror::Error;

/// Maximum number of soft per-file errors of a single kind logged per job
/// before further occurrences of that kind are only counted.
pub const SOFT_ERROR_LOG_CAP: u32 = 25;

/// A fatal session error: the session thread cannot continue and the job
/// terminates with `ErrorTerminated`.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The Storage-Daemon or Director channel sent malformed framing.
    #[error("protocol framing violation: {0}")]
    Framing(String),
    /// Authentication with the peer failed or timed out.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// The underlying socket failed unrecoverably.
    #[error("socket error: {0}")]
    Socket(#[from] io::Error),
    /// A resource (memory, file descriptor) could not be obtained.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

/// A fatal per-file error: abort this file's pipeline, increment the
/// job-error counter, continue with the next file.
#[derive(Debug, Error)]
pub enum FileError {
    /// Sending the attributes record for this file failed.
    #[error("failed to send attributes: {0}")]
    AttributesSend(io::Error),
    /// Initializing the encryption context for this file failed.
    #[error("failed to initialize encryption context: {0}")]
    EncryptionInit(String),
    /// The transform chain reported a state corruption.
    #[error("transform chain error: {0}")]
    Transform(String),
}

/// The kind of a soft, rate-limited per-file error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SoftErrorKind {
    /// Gathering the file's ACL entries partially or fully failed.
    Acl,
    /// Gathering the file's extended attributes partially or fully failed.
    Xattr,
    /// The file could not be opened or read.
    Unreadable,
}

impl SoftErrorKind {
    /// Short label used in log lines and per-kind counters.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Acl => "ACL",
            Self::Xattr => "xattr",
            Self::Unreadable => "unreadable",
        }
    }
}

/// A job-terminal error produced when a [`SessionError`] is not recoverable.
#[derive(Debug, Error)]
#[error("job terminated: {0}")]
pub struct JobError(#[from] pub SessionError);
