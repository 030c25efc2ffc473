#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! A thin `tracing` facade: wiring the process-wide subscriber, opening a
//! span for the duration of one job, and a small helper for the
//! per-kind-per-job soft error suppression cap (§4.4, §7).
//!
//! # Design
//!
//! Every event that matters to an operator goes through `tracing`, never
//! `println!`/`eprintln!`. [`install_subscriber`] is called once, from the
//! daemon binary's `main`, before any session is accepted. [`job_span`]
//! wraps the whole backup/restore/verify dispatch so every event emitted
//! downstream (transform chain, orchestrators, accurate store) carries
//! job context automatically.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing_subscriber::EnvFilter;

/// Installs the process-wide `tracing` subscriber.
///
/// `debug_level` is the CLI's `-d`/`--debug-level` flag; when set it wins
/// over `RUST_LOG`. With neither set, the default level is `info`.
pub fn install_subscriber(debug_level: Option<u8>) {
    let filter = match debug_level {
        Some(level) => EnvFilter::new(level_name(level)),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn level_name(debug_level: u8) -> &'static str {
    match debug_level {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Opens the span that should wrap one job's entire backup/restore/verify
/// dispatch, so every event emitted underneath carries `job_id` and
/// `level`.
#[must_use]
pub fn job_span(job_id: u32, level: &str) -> tracing::Span {
    tracing::info_span!("job", job_id, level)
}

/// Tracks how many times a per-kind soft error has been logged for the
/// current job, so logging stops (but counting does not) past the cap.
///
/// This is the logging-side half of the §4.4/§7 suppression contract;
/// `core::counters::Counters` tracks the counts themselves.
#[derive(Debug, Default)]
pub struct SuppressionGate {
    logged: AtomicU32,
    cap: u32,
    warned_at_cap: std::sync::atomic::AtomicBool,
}

impl SuppressionGate {
    /// Creates a gate that allows up to `cap` logged occurrences.
    #[must_use]
    pub fn new(cap: u32) -> Self {
        Self {
            logged: AtomicU32::new(0),
            cap,
            warned_at_cap: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Returns `true` if the caller should emit a log line for this
    /// occurrence. Once the cap is reached, logs a single `warn`-level
    /// notice that further occurrences are suppressed, then always
    /// returns `false`.
    pub fn should_log(&self, kind: &str) -> bool {
        let prior = self.logged.fetch_add(1, Ordering::Relaxed);
        if prior < self.cap {
            return true;
        }
        if !self.warned_at_cap.swap(true, Ordering::Relaxed) {
            tracing::warn!(kind, cap = self.cap, "further occurrences suppressed");
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_allows_exactly_cap_occurrences() {
        let gate = SuppressionGate::new(2);
        assert!(gate.should_log("acl"));
        assert!(gate.should_log("acl"));
        assert!(!gate.should_log("acl"));
        assert!(!gate.should_log("acl"));
    }

    #[test]
    fn level_name_maps_debug_levels() {
        assert_eq!(level_name(0), "info");
        assert_eq!(level_name(1), "debug");
        assert_eq!(level_name(5), "trace");
    }

    #[test]
    fn job_span_carries_job_id() {
        let span = job_span(42, "full");
        assert_eq!(span.metadata().map(tracing::Metadata::name), Some("job"));
    }

    #[test]
    fn level_name_reaches_trace_for_high_debug_levels() {
        assert_eq!(level_name(u8::MAX), "trace");
    }
}
