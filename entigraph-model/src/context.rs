//! Capabilities injected into every entity.

use crate::repository::RepositoryFinder;
use chrono::{DateTime, FixedOffset, Utc};
use entigraph_types::{Clock, SystemClock, default_offset};
use std::fmt;
use std::sync::Arc;

/// The clock, repository lookup and time-zone offset an entity consults.
///
/// Shared by every entity created with it; cheap to clone behind an `Arc`.
#[derive(Clone)]
pub struct EntityContext {
    clock: Arc<dyn Clock>,
    repositories: Option<Arc<dyn RepositoryFinder>>,
    offset: FixedOffset,
}

impl EntityContext {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            repositories: None,
            offset: default_offset(),
        }
    }

    pub fn with_repositories(mut self, repositories: Arc<dyn RepositoryFinder>) -> Self {
        self.repositories = Some(repositories);
        self
    }

    /// Offset applied to temporal bounds of entities created from now on.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    #[must_use]
    pub fn repositories(&self) -> Option<&Arc<dyn RepositoryFinder>> {
        self.repositories.as_ref()
    }
}

impl Default for EntityContext {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl fmt::Debug for EntityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityContext")
            .field("offset", &self.offset)
            .field("has_repositories", &self.repositories.is_some())
            .finish()
    }
}
