//! Status reporting (§4.6 supplement), grounded on `status.c`'s report
//! builder. `status` and `.status` both render from one [`StatusReport`]
//! value so the human-readable and machine-readable forms cannot drift.

use std::collections::VecDeque;
use std::fmt::Write as _;

use fd_core::job::TerminationCode;

/// The fixed capacity of the terminated-job ring buffer, replacing the
/// original's unbounded `last_jobs_list` (§4.6 supplement).
pub const TERMINATED_JOB_HISTORY_CAPACITY: usize = 20;

/// One currently-running job's summary line.
#[derive(Clone, Debug)]
pub struct RunningJobSummary {
    /// The Director-assigned job name.
    pub job_name: String,
    /// The negotiated backup level, as a short label (`full`,
    /// `incremental`, ...).
    pub level: String,
    /// Files sent or examined so far.
    pub files: u64,
    /// Bytes sent so far.
    pub bytes: u64,
    /// Errors logged so far.
    pub errors: u64,
    /// Seconds elapsed since the job started.
    pub elapsed_seconds: u64,
}

/// One terminated job's summary, retained in the bounded history ring.
#[derive(Clone, Debug)]
pub struct TerminatedJobSummary {
    /// The Director-assigned job name.
    pub job_name: String,
    /// The job's final status.
    pub termination: TerminationCode,
    /// Files sent during the job.
    pub files: u64,
    /// Bytes sent during the job.
    pub bytes: u64,
}

/// A bounded ring of recently terminated jobs, replacing the original's
/// unbounded linked list (§4.6 supplement).
#[derive(Clone, Debug, Default)]
pub struct TerminatedJobHistory {
    ring: VecDeque<TerminatedJobSummary>,
}

impl TerminatedJobHistory {
    /// An empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a job's termination, evicting the oldest entry if the ring
    /// is already at [`TERMINATED_JOB_HISTORY_CAPACITY`].
    pub fn record(&mut self, summary: TerminatedJobSummary) {
        if self.ring.len() == TERMINATED_JOB_HISTORY_CAPACITY {
            self.ring.pop_front();
        }
        self.ring.push_back(summary);
    }

    /// Iterates the retained history, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TerminatedJobSummary> {
        self.ring.iter()
    }
}

/// The daemon identity fields every status report leads with.
#[derive(Clone, Debug)]
pub struct DaemonIdentity {
    /// The client resource's configured name.
    pub name: String,
    /// The crate's `version.workspace` value.
    pub version: String,
}

/// A point-in-time status report: the shared value both `status` and
/// `.status` render from.
#[derive(Clone, Debug)]
pub struct StatusReport {
    /// Daemon identity and version.
    pub identity: DaemonIdentity,
    /// Summaries for every job currently running.
    pub running: Vec<RunningJobSummary>,
    /// The bounded terminated-job history, rendered most-recent-first.
    pub terminated: Vec<TerminatedJobSummary>,
}

impl StatusReport {
    /// Renders the human-readable form.
    #[must_use]
    pub fn render_human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} Version: {}", self.identity.name, self.identity.version);
        if self.running.is_empty() {
            let _ = writeln!(out, "No jobs running.");
        } else {
            let _ = writeln!(out, "Running Jobs:");
            for job in &self.running {
                let _ = writeln!(
                    out,
                    "  {} level={} files={} bytes={} errors={} elapsed={}s",
                    job.job_name, job.level, job.files, job.bytes, job.errors, job.elapsed_seconds
                );
            }
        }
        if !self.terminated.is_empty() {
            let _ = writeln!(out, "Terminated Jobs:");
            for job in self.terminated.iter().rev() {
                let _ = writeln!(
                    out,
                    "  {} termination={} files={} bytes={}",
                    job.job_name, job.termination, job.files, job.bytes
                );
            }
        }
        out
    }

    /// Renders the machine-readable `api` form: one `key=value` pair per
    /// line, records separated by a blank line.
    #[must_use]
    pub fn render_api(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "name={} version={}", self.identity.name, self.identity.version);
        for job in &self.running {
            let _ = writeln!(
                out,
                "running.job={} running.level={} running.files={} running.bytes={} running.errors={} running.elapsed={}",
                job.job_name, job.level, job.files, job.bytes, job.errors, job.elapsed_seconds
            );
        }
        for job in self.terminated.iter().rev() {
            let _ = writeln!(
                out,
                "terminated.job={} terminated.code={} terminated.files={} terminated.bytes={}",
                job.job_name,
                job.termination.code(),
                job.files,
                job.bytes
            );
        }
        out
    }
}
