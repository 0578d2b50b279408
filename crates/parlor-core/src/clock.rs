//! Wall clock used by the chat core.
//!
//! Presence timestamps are epoch milliseconds; message times are the same
//! instant rendered as `HH:MM:SS` (24-hour, zero-padded). Everything that
//! needs "now" goes through the [`Clock`] trait so the sweeper and the
//! registry can be driven deterministically in tests.
//!
//! # Design Principles
//!
//! - The epoch value is the source of truth; the formatted time is derived
//!   from it at write time and never parsed back.
//! - The formatted time carries no date, so two writes on different days
//!   can render identically.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Local, Utc};

/// Display format for message times.
const TIME_FORMAT: &str = "%H:%M:%S";

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The epoch value cannot be represented as a calendar time.
    #[error("timestamp out of range: {millis}ms")]
    OutOfRange {
        /// The offending epoch milliseconds.
        millis: i64,
    },
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds.
    fn now_millis(&self) -> i64;

    /// Format an epoch-millisecond instant as `HH:MM:SS`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::OutOfRange`] if `millis` is not a valid instant.
    fn format_time(&self, millis: i64) -> Result<String, ClockError>;
}

/// The real clock, formatting in the server's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a system clock.
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn format_time(&self, millis: i64) -> Result<String, ClockError> {
        let instant = to_utc(millis)?;
        Ok(instant.with_timezone(&Local).format(TIME_FORMAT).to_string())
    }
}

/// A clock that only moves when told to. Formats in UTC so results do not
/// depend on the host time zone.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `millis`.
    pub const fn new(millis: i64) -> Self {
        Self {
            now: AtomicI64::new(millis),
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::Release);
    }

    /// Move forward by `millis` (saturating). Returns the new instant.
    pub fn advance(&self, millis: i64) -> i64 {
        let previous = self
            .now
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |now| {
                Some(now.saturating_add(millis))
            })
            .unwrap_or_else(|current| current);
        previous.saturating_add(millis)
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::Acquire)
    }

    fn format_time(&self, millis: i64) -> Result<String, ClockError> {
        Ok(to_utc(millis)?.format(TIME_FORMAT).to_string())
    }
}

fn to_utc(millis: i64) -> Result<DateTime<Utc>, ClockError> {
    DateTime::from_timestamp_millis(millis).ok_or(ClockError::OutOfRange { millis })
}
