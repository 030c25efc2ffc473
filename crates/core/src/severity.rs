//! Message severity used by every log line the session thread emits.

use std::fmt;

/// Severity of a logged event, independent of the [`crate::error`] taxonomy
/// (a soft per-file error is logged at [`Severity::Warning`]; an
/// informational skip is logged at [`Severity::Info`]).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default)]
pub enum Severity {
    /// Routine progress: file skipped, file unchanged, job started.
    #[default]
    Info,
    /// A soft per-file error or a notable but non-fatal condition.
    Warning,
    /// A fatal session or fatal per-file error.
    Error,
}

impl Severity {
    /// Short uppercase prefix used in log lines (`INFO`, `WARN`, `ERROR`).
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// Whether this severity is purely informational.
    #[must_use]
    pub const fn is_info(self) -> bool {
        matches!(self, Self::Info)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_info() {
        assert_eq!(Severity::default(), Severity::Info);
        assert!(Severity::Info.is_info());
        assert!(!Severity::Warning.is_info());
    }
}
