//! Audit stamps carried by audited entities.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Who created and last modified a record, and when.
///
/// `row_version` is the persistence layer's concurrency stamp; this crate
/// only carries it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_version: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
}

impl AuditInfo {
    /// Stamps both creation and modification.
    pub fn stamp_created(&mut self, login: &str, now: DateTime<Utc>) {
        let at: DateTime<FixedOffset> = now.into();
        self.created_on = Some(at);
        self.created_by = Some(login.to_string());
        self.modified_on = Some(at);
        self.modified_by = Some(login.to_string());
    }

    /// Stamps modification only.
    pub fn stamp_modified(&mut self, login: &str, now: DateTime<Utc>) {
        self.modified_on = Some(now.into());
        self.modified_by = Some(login.to_string());
    }

    /// Copies every stamp from `other`.
    pub fn copy_from(&mut self, other: &AuditInfo) {
        self.clone_from(other);
    }
}
