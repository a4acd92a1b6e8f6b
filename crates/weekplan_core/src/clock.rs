//! Wall-clock seam for freshness stamping and overdue checks.
//!
//! # Responsibility
//! - Provide "now" in epoch milliseconds and "today" as a calendar date
//!   behind one trait, so the grace-period and fork decisions are
//!   deterministic under test.
//!
//! # Invariants
//! - `today()` is derived from the same instant as `now_ms()`.

use chrono::{DateTime, Local, NaiveDate};
use std::sync::atomic::{AtomicI64, Ordering};

/// Time source consulted by the reconciliation engine.
pub trait Clock: Send + Sync {
    /// Current time as unix epoch milliseconds.
    fn now_ms(&self) -> i64;

    /// Current calendar date.
    fn today(&self) -> NaiveDate;
}

/// Production clock backed by the local system time.
///
/// Uses the local timezone for `today()` so "overdue" matches what the user
/// sees on the board.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Local::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually advanced clock for deterministic tests.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    /// Creates a clock pinned to the given epoch-millisecond instant.
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    /// Creates a clock pinned to midnight UTC of the given date.
    pub fn at_date(date: NaiveDate) -> Self {
        let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        Self::new(midnight.and_utc().timestamp_millis())
    }

    /// Moves the clock forward.
    pub fn advance_ms(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Pins the clock to a new instant.
    pub fn set_now_ms(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn today(&self) -> NaiveDate {
        DateTime::from_timestamp_millis(self.now_ms())
            .map(|instant| instant.date_naive())
            .unwrap_or_default()
    }
}
