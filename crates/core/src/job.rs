//! Job-level vocabulary: level, type, and termination code (§3, §6, §7).

use std::fmt;

/// The backup level negotiated for a job.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum JobLevel {
    /// Back up every selected file regardless of change state.
    Full,
    /// Back up files changed since the last Full or Differential.
    Differential,
    /// Back up files changed since the last backup of any level.
    Incremental,
    /// Full-level backup with base-job optimization enabled.
    Base,
    /// Back up files changed since an explicit timestamp, negotiated via
    /// the clock-sync sub-protocol (§4.6).
    SinceTime,
    /// Verify a previous job's catalog or volume contents without writing
    /// new backup data.
    Verify(VerifyLevel),
}

/// The sub-kind of a [`JobLevel::Verify`] job.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum VerifyLevel {
    /// Compare the current filesystem against the catalog.
    Catalog,
    /// Compare the current filesystem against a prior volume's contents.
    Volume,
    /// Verify data as it is being backed up, in the same session.
    InitCatalog,
}

/// The kind of job being serviced.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum JobType {
    /// Walk the fileset and send data to the Storage Daemon.
    Backup,
    /// Read data from the Storage Daemon and write it to the filesystem.
    Restore,
    /// Compare filesystem state against a catalog or volume.
    Verify,
    /// Estimate the size of a backup without transmitting data.
    Estimate,
}

/// Final status of a job, reported exactly once in the `EndJob` record.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TerminationCode {
    /// Completed with no errors.
    Ok,
    /// Completed, but soft errors were logged.
    OkWithWarnings,
    /// A fatal error terminated the job early.
    Errored,
    /// The Director canceled the job.
    Canceled,
    /// The job ended without completing its fileset (e.g. connection loss
    /// after partial progress, but not classified as a hard error).
    Incomplete,
}

impl TerminationCode {
    /// The numeric `TermCode=` value reported in the `EndJob` line (§6).
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Ok => 0,
            Self::OkWithWarnings => 1,
            Self::Errored => 2,
            Self::Canceled => 3,
            Self::Incomplete => 4,
        }
    }
}

impl fmt::Display for TerminationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ok => "OK",
            Self::OkWithWarnings => "OK -- with warnings",
            Self::Errored => "Error",
            Self::Canceled => "Canceled",
            Self::Incomplete => "Incomplete",
        };
        f.write_str(label)
    }
}
