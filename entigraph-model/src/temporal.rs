//! Temporal lifecycle: deleting by closing the validity interval.
//!
//! Interval changes are recorded in the ledger under synthetic property
//! paths so they roll back with everything else.

use crate::entity::Entity;
use crate::event::IS_ACTIVE;
use crate::value::Value;
use chrono::{DateTime, FixedOffset, Utc};
use entigraph_types::{TemporalInfo, TemporalState};

/// Ledger path of the interval's lower bound.
pub const VALID_FROM_PATH: &str = "TemporalInfo.ValidFrom";

/// Ledger path of the interval's upper bound.
pub const VALID_TO_PATH: &str = "TemporalInfo.ValidTo";

impl Entity {
    #[must_use]
    pub fn temporal_info(&self) -> Option<&TemporalInfo> {
        self.temporal.as_ref()
    }

    #[must_use]
    pub fn temporal_state(&self) -> Option<TemporalState> {
        let now = self.context.now();
        self.temporal.as_ref().map(|temporal| temporal.state(now))
    }

    /// Temporal entities: the interval is active now. Others: not deleted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.is_inactive()
    }

    /// Temporal entities: the interval is closed or being closed. Others:
    /// marked deleted.
    #[must_use]
    pub fn is_inactive(&self) -> bool {
        match &self.temporal {
            Some(temporal) => !temporal.is_active(self.context.now()),
            None => self.is_deleted,
        }
    }

    /// A delete is pending in the current edit session.
    #[must_use]
    pub fn is_pending_delete(&self) -> bool {
        match &self.temporal {
            Some(temporal) => temporal.is_deleting(),
            None => self.is_deleted,
        }
    }

    /// Opens the interval now. Does nothing on non-temporal entities.
    pub fn activate(&mut self) {
        let now = self.context.now();
        let Some(temporal) = self.temporal.as_mut() else {
            return;
        };
        let previous = temporal.valid_from();
        temporal.activate(now);
        self.record_change(VALID_FROM_PATH, Value::DateTime(previous));
        self.notify_property_changed(IS_ACTIVE);
    }

    /// Closes the interval now, without marking a delete.
    pub fn deactivate(&mut self) {
        let now = self.context.now();
        let Some(temporal) = self.temporal.as_mut() else {
            return;
        };
        temporal.deactivate(now);
        self.notify_property_changed(IS_ACTIVE);
    }

    /// Moves the interval's lower bound, recording the change.
    pub fn set_valid_from(&mut self, at: DateTime<Utc>) -> bool {
        let Some(temporal) = self.temporal.as_mut() else {
            return false;
        };
        let previous = temporal.valid_from();
        temporal.set_valid_from(at);
        if temporal.valid_from() == previous {
            return false;
        }
        self.record_change(VALID_FROM_PATH, Value::DateTime(previous));
        self.notify_property_changed(IS_ACTIVE);
        true
    }

    pub(crate) fn close_interval(&mut self) {
        let now = self.context.now();
        let Some(temporal) = self.temporal.as_mut() else {
            return;
        };
        let previous = temporal.valid_to();
        temporal.set_valid_to(Some(now));
        temporal.set_deleting(true);
        self.record_change(VALID_TO_PATH, Value::from(previous));
        self.notify_property_changed(IS_ACTIVE);
    }

    pub(crate) fn reopen_interval(&mut self) {
        let Some(temporal) = self.temporal.as_mut() else {
            return;
        };
        temporal.set_valid_to(None::<DateTime<Utc>>);
        temporal.set_deleting(false);
        self.notify_property_changed(IS_ACTIVE);
    }

    /// Writes a recorded interval bound back. `false` if the path does not
    /// apply or the value has the wrong shape.
    pub(crate) fn restore_interval(&mut self, path: &str, original: &Value) -> bool {
        let Some(temporal) = self.temporal.as_mut() else {
            return false;
        };
        match (path, original) {
            (VALID_FROM_PATH, Value::DateTime(at)) => temporal.set_valid_from(*at),
            (VALID_TO_PATH, Value::DateTime(at)) => temporal.set_valid_to(Some(*at)),
            (VALID_TO_PATH, Value::Null) => temporal.set_valid_to(None::<DateTime<FixedOffset>>),
            _ => return false,
        }
        true
    }
}
