use crate::entity::Entity;
use crate::value::EntityRef;
use serde::{Deserialize, Serialize};

/// One finding produced by an [`EntityValidator`].
///
/// `target` names the entity the finding belongs to. `None` means the entity
/// being validated; a handle routes the finding to a nested entity.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub key: Option<String>,
    pub message: String,
    pub target: Option<EntityRef>,
}

impl ValidationResult {
    pub fn new(key: &str, message: &str) -> Self {
        Self {
            key: Some(key.into()),
            message: message.into(),
            target: None,
        }
    }

    /// A finding not tied to any property. Dropped by `invalidate`.
    pub fn unkeyed(message: &str) -> Self {
        Self {
            key: None,
            message: message.into(),
            target: None,
        }
    }

    pub fn on(mut self, target: EntityRef) -> Self {
        self.target = Some(target);
        self
    }
}

/// A validation error stored on an entity.
///
/// Two errors are the same when their keys match ignoring case and their
/// target identities match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub key: String,
    pub message: String,
    /// Display text of the entity the error belongs to.
    pub target: String,
}

impl ValidationError {
    pub fn new(key: &str, message: &str, target: &str) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
            target: target.into(),
        }
    }

    #[must_use]
    pub fn is_for(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key)
    }

    #[must_use]
    pub fn same_as(&self, other: &ValidationError) -> bool {
        self.is_for(&other.key) && self.target == other.target
    }
}

/// Validation rules for an entity type.
///
/// Anything that can inspect an entity and report findings plugs in here.
pub trait EntityValidator: Send + Sync {
    fn validate(&self, entity: &Entity) -> Vec<ValidationResult>;
}

impl<F> EntityValidator for F
where
    F: Fn(&Entity) -> Vec<ValidationResult> + Send + Sync,
{
    fn validate(&self, entity: &Entity) -> Vec<ValidationResult> {
        self(entity)
    }
}
