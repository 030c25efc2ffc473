//! The clock-sync sub-protocol (§4.6), the only place in the core that
//! performs time arithmetic across hosts.
//!
//! Triggered when `level=since_utime` is negotiated: the File Daemon polls
//! the Director for its wall clock 10 times, discards the first two
//! round-trips (warm-up, most affected by connection-setup jitter), and
//! averages the remaining 8 skews to adjust the negotiated since-time.

use tracing::{info, warn};

/// Exactly 10 round-trip skew samples, one Unix-second difference
/// (`director_clock - our_clock`) per poll, in poll order.
pub const POLL_COUNT: usize = 10;
const DISCARDED_WARMUP_POLLS: usize = 2;

/// Adjustment magnitudes beyond which the sub-protocol logs, per §4.6.
const LOGGED_ADJUSTMENT_SECONDS: i64 = 3;
const WARNED_ADJUSTMENT_SECONDS: i64 = 600;

/// The result of negotiating a since-time against the Director's clock.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClockSyncResult {
    /// The since-time after applying the averaged skew.
    pub adjusted_since_time: i64,
    /// The averaged skew applied, in seconds (positive: Director ahead).
    pub average_skew: i64,
}

/// Averages the 8 non-warm-up samples from `polls` and applies the result
/// to `since_time`, logging per the thresholds above.
///
/// # Panics
///
/// Panics if `polls.len() != POLL_COUNT`; the caller is expected to have
/// performed exactly [`POLL_COUNT`] round-trips before calling this.
#[must_use]
pub fn negotiate_since_time(since_time: i64, polls: &[i64]) -> ClockSyncResult {
    assert_eq!(polls.len(), POLL_COUNT, "clock-sync requires exactly {POLL_COUNT} polls");
    let samples = &polls[DISCARDED_WARMUP_POLLS..];
    let sum: i64 = samples.iter().sum();
    let average_skew = sum / samples.len() as i64;

    let magnitude = average_skew.abs();
    if magnitude > WARNED_ADJUSTMENT_SECONDS {
        warn!(average_skew, "clock-sync adjustment exceeds 600s, director clock may be misconfigured");
    } else if magnitude > LOGGED_ADJUSTMENT_SECONDS {
        info!(average_skew, "clock-sync adjusted since-time by more than 3s");
    }

    ClockSyncResult {
        adjusted_since_time: since_time + average_skew,
        average_skew,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warm_up_polls_are_discarded_from_the_average() {
        // First two polls are wild outliers; the remaining eight are all
        // a clean skew of 5s. The average must reflect only the latter.
        let mut polls = vec![1000, -1000];
        polls.extend(std::iter::repeat(5).take(8));
        let result = negotiate_since_time(1_700_000_000, &polls);
        assert_eq!(result.average_skew, 5);
        assert_eq!(result.adjusted_since_time, 1_700_000_005);
    }

    #[test]
    fn zero_skew_leaves_since_time_untouched() {
        let polls = vec![0; POLL_COUNT];
        let result = negotiate_since_time(42, &polls);
        assert_eq!(result.average_skew, 0);
        assert_eq!(result.adjusted_since_time, 42);
    }

    #[test]
    #[should_panic(expected = "exactly 10 polls")]
    fn wrong_poll_count_panics() {
        let _ = negotiate_since_time(0, &[1, 2, 3]);
    }
}
