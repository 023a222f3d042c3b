use crate::value::Value;
use std::sync::Arc;

/// The generic identity rule: a key is new when it is unset or below 1.
/// Keys that are not integers are never new.
#[must_use]
pub fn is_new_identity(key: &Value) -> bool {
    if key.is_null() {
        return true;
    }
    key.as_key_int().is_some_and(|id| id < 1)
}

/// A persistence-side repository, as far as entities need to know about it.
///
/// Implementations live outside this crate. Only `is_new_key` influences
/// entity behavior; the rest is exposed for callers that route through the
/// finder.
pub trait EntityRepository: Send + Sync {
    /// Whether this repository stores entities of `entity_type`.
    fn handles(&self, entity_type: &str) -> bool;

    /// Identifier of the repository for local (offline) lookups.
    fn local_id(&self) -> &str;

    /// Whether the repository holds unsaved work.
    fn is_dirty(&self) -> bool {
        false
    }

    /// Forget a locally assigned key.
    fn unregister_key(&self, key: &str) {
        let _ = key;
    }

    /// Decide whether an entity with this key has never been persisted.
    /// Default is [`is_new_identity`].
    fn is_new_key(&self, key: &Value) -> bool {
        is_new_identity(key)
    }
}

/// Looks up the repository responsible for an entity type.
pub trait RepositoryFinder: Send + Sync {
    fn find_repository(&self, entity_type: &str) -> Option<Arc<dyn EntityRepository>>;

    fn find_by_local_id(&self, local_id: &str) -> Option<Arc<dyn EntityRepository>> {
        let _ = local_id;
        None
    }
}
