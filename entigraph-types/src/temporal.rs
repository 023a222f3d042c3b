//! Validity interval for soft-deletable entities.
//!
//! An interval is `[valid_from, valid_to)`. Closing it (setting `valid_to`)
//! is how temporal entities are deleted; the `is_deleting` flag marks a close
//! that is still pending in the current edit session.

use crate::clock::default_offset;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an interval sits relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalState {
    /// Open-ended: `valid_to` is unset.
    Active,
    /// `valid_to` is set but still in the future.
    ScheduledInactive,
    /// `valid_to` has passed.
    Expired,
    /// A close is pending in the current edit, whatever `valid_to` says.
    PendingDelete,
}

/// The validity window of a temporal entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalInfo {
    /// Offset east of UTC, in seconds, applied to both bounds on write.
    offset_seconds: i32,
    valid_from: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    valid_to: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    is_deleting: bool,
}

impl TemporalInfo {
    /// Creates an open interval starting at the Unix epoch.
    #[must_use]
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset_seconds: offset.local_minus_utc(),
            valid_from: DateTime::<Utc>::default().with_timezone(&offset),
            valid_to: None,
            is_deleting: false,
        }
    }

    /// Returns the offset applied to the bounds.
    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.offset_seconds).unwrap_or_else(default_offset)
    }

    #[must_use]
    pub fn valid_from(&self) -> DateTime<FixedOffset> {
        self.valid_from
    }

    #[must_use]
    pub fn valid_to(&self) -> Option<DateTime<FixedOffset>> {
        self.valid_to
    }

    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.is_deleting
    }

    /// Sets the lower bound, converted to the interval's offset.
    pub fn set_valid_from<Tz: TimeZone>(&mut self, at: DateTime<Tz>) {
        self.valid_from = at.with_timezone(&self.offset());
    }

    /// Sets or clears the upper bound, converted to the interval's offset.
    pub fn set_valid_to<Tz: TimeZone>(&mut self, at: Option<DateTime<Tz>>) {
        let offset = self.offset();
        self.valid_to = at.map(|at| at.with_timezone(&offset));
    }

    pub fn set_deleting(&mut self, deleting: bool) {
        self.is_deleting = deleting;
    }

    /// Opens the interval at `now`, dropping any pending close.
    pub fn activate(&mut self, now: DateTime<Utc>) {
        self.set_valid_from(now);
        self.valid_to = None;
        self.is_deleting = false;
    }

    /// Closes the interval at `now`.
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.set_valid_to(Some(now));
    }

    /// Not deleting, and either open-ended or closing no earlier than `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        matches!(
            self.state(now),
            TemporalState::Active | TemporalState::ScheduledInactive
        )
    }

    #[must_use]
    pub fn state(&self, now: DateTime<Utc>) -> TemporalState {
        if self.is_deleting {
            return TemporalState::PendingDelete;
        }
        match self.valid_to {
            None => TemporalState::Active,
            Some(valid_to) if valid_to >= now.with_timezone(&self.offset()) => {
                TemporalState::ScheduledInactive
            }
            Some(_) => TemporalState::Expired,
        }
    }
}

impl Default for TemporalInfo {
    fn default() -> Self {
        Self::new(default_offset())
    }
}

impl fmt::Display for TemporalInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TemporalInfo with validity from {} to ", self.valid_from)?;
        match self.valid_to {
            Some(valid_to) => write!(f, "{valid_to}"),
            None => Ok(()),
        }
    }
}
