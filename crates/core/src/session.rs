//! The session context (§3): the data held for one active Director
//! connection, from greeting to termination.

use zeroize::Zeroizing;

use crate::cancel::CancelToken;
use crate::counters::Counters;
use crate::job::{JobLevel, JobType};

/// A per-job monotonic file-index counter, the label carried by every
/// stream record for a given file (§6 glossary).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord)]
pub struct FileIndex(pub u32);

impl FileIndex {
    /// The index before any file has been assigned one.
    pub const NONE: Self = Self(0);

    /// Returns the next index in sequence.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// One active Director connection's state, created on the Director's
/// greeting and destroyed on session termination.
pub struct SessionContext {
    /// The job identifier assigned by the Director.
    pub job_id: u32,
    /// The Director-assigned job name.
    pub job_name: String,
    /// The negotiated backup level.
    pub level: JobLevel,
    /// The kind of job being serviced.
    pub job_type: JobType,
    /// Since-time negotiated for incremental/differential levels, as Unix
    /// seconds; meaningful only when `level` needs it.
    pub since_time: Option<i64>,
    /// The Storage-Daemon authorization key, zeroed as soon as the
    /// `Hello Start Job` handshake completes.
    pub storage_authorization: Zeroizing<String>,
    /// Whether accurate mode is active for this job.
    pub accurate: bool,
    /// Whether this job is a rerun of a previously interrupted job.
    pub rerun: bool,
    /// The next file-index to assign.
    pub next_file_index: FileIndex,
    /// Cumulative counters for this job.
    pub counters: Counters,
    /// The cooperative cancellation flag shared with the heartbeat
    /// thread.
    pub cancel: CancelToken,
}

impl SessionContext {
    /// Creates a new session context for a job, in the state it holds
    /// immediately after `JobId=` is received.
    #[must_use]
    pub fn new(job_id: u32, job_name: String, job_type: JobType) -> Self {
        Self {
            job_id,
            job_name,
            level: JobLevel::Full,
            job_type,
            since_time: None,
            storage_authorization: Zeroizing::new(String::new()),
            accurate: false,
            rerun: false,
            next_file_index: FileIndex::NONE,
            counters: Counters::new(),
            cancel: CancelToken::new(),
        }
    }

    /// Assigns and returns the next file-index, advancing the counter.
    pub fn assign_file_index(&mut self) -> FileIndex {
        self.next_file_index = self.next_file_index.next();
        self.next_file_index
    }
}
