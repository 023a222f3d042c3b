//! Time source injected into entities.
//!
//! Entities never read the system clock directly; audit stamps and temporal
//! intervals ask the [`Clock`] carried by their context. Tests pin time with
//! [`FixedClock`].

use crate::{Error, Result};
use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use std::sync::Mutex;

/// Offset applied to temporal bounds when none is configured (UTC+1).
pub const DEFAULT_OFFSET_SECONDS: i32 = 3600;

/// Returns the default temporal offset.
#[must_use]
pub fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// Builds an offset east of UTC, rejecting values outside ±24h.
pub fn offset_from_seconds(seconds: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(seconds).ok_or(Error::InvalidOffset(seconds))
}

/// A source of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    at: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock frozen at `at`.
    #[must_use]
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at: Mutex::new(at) }
    }

    /// Moves the clock to `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        if let Ok(mut guard) = self.at.lock() {
            *guard = at;
        }
    }

    /// Moves the clock forward (or backward, for negative durations).
    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.at.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at.lock().map(|guard| *guard).unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}
