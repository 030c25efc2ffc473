//! Per-job counters (§3, §7): files examined/sent, bytes read/sent, and
//! rate-limited soft-error counts by kind.

use std::collections::HashMap;

use crate::error::{SOFT_ERROR_LOG_CAP, SoftErrorKind};

/// Cumulative counters for one job, reported in the `EndJob` record.
#[derive(Clone, Debug, Default)]
pub struct Counters {
    /// Files the fileset iterator examined, including skipped ones.
    pub files_examined: u64,
    /// Files for which at least an attributes record was sent.
    pub files_sent: u64,
    /// Bytes read from the local filesystem.
    pub bytes_read: u64,
    /// Bytes sent on the Storage-Daemon channel.
    pub bytes_sent: u64,
    /// Total errors of any kind (fatal per-file and soft, combined).
    pub errors: u64,
    soft_error_counts: HashMap<SoftErrorKind, u32>,
}

impl Counters {
    /// Creates a zeroed counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence of a soft per-file error of the given kind.
    /// Returns `true` if the occurrence should still be logged (the
    /// per-kind cap of [`SOFT_ERROR_LOG_CAP`] has not yet been reached).
    pub fn record_soft_error(&mut self, kind: SoftErrorKind) -> bool {
        self.errors += 1;
        let count = self.soft_error_counts.entry(kind).or_insert(0);
        *count += 1;
        *count <= SOFT_ERROR_LOG_CAP
    }

    /// Current occurrence count of a soft-error kind this job.
    #[must_use]
    pub fn soft_error_count(&self, kind: SoftErrorKind) -> u32 {
        self.soft_error_counts.get(&kind).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_errors_are_capped_for_logging_but_not_for_counting() {
        let mut counters = Counters::new();
        let mut loggable = 0;
        for _ in 0..SOFT_ERROR_LOG_CAP + 10 {
            if counters.record_soft_error(SoftErrorKind::Acl) {
                loggable += 1;
            }
        }
        assert_eq!(loggable, SOFT_ERROR_LOG_CAP);
        assert_eq!(counters.soft_error_count(SoftErrorKind::Acl), SOFT_ERROR_LOG_CAP + 10);
        assert_eq!(counters.errors, u64::from(SOFT_ERROR_LOG_CAP + 10));
    }

    #[test]
    fn distinct_kinds_have_independent_counts() {
        let mut counters = Counters::new();
        counters.record_soft_error(SoftErrorKind::Acl);
        counters.record_soft_error(SoftErrorKind::Xattr);
        counters.record_soft_error(SoftErrorKind::Xattr);
        assert_eq!(counters.soft_error_count(SoftErrorKind::Acl), 1);
        assert_eq!(counters.soft_error_count(SoftErrorKind::Xattr), 2);
    }
}
