//! Common time helpers for jarline_core.

use std::time::{Duration, Instant};

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: f64 = 1_000_000.0;

/// Time elapsed from `since` to `now`; zero if `now` is earlier.
#[inline]
pub fn elapsed(now: Instant, since: Instant) -> Duration {
    now.saturating_duration_since(since)
}

/// Whether at least `period` has passed since `since`. `None` counts as long ago.
#[inline]
pub fn period_elapsed(now: Instant, since: Option<Instant>, period: Duration) -> bool {
    since.is_none_or(|t| elapsed(now, t) >= period)
}

/// Saturating millisecond count for logging.
#[inline]
pub fn as_millis_u64(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Saturating microsecond count for logging.
#[inline]
pub fn as_micros_u64(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}
