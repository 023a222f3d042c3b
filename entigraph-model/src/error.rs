//! Error types for the entity model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Configuration and serialization errors.
///
/// Validation problems are never reported through this type; they are
/// collected on the entity that owns them.
#[derive(Debug, Error)]
pub enum ModelError {
    /// More than one key marker at the same declaration level.
    #[error("entity type `{entity_type}` declares more than one key: `{first}` and `{second}`")]
    AmbiguousKey {
        entity_type: String,
        first: String,
        second: String,
    },

    /// A property name appears twice at the same declaration level.
    #[error("entity type `{entity_type}` declares property `{property}` more than once")]
    DuplicateProperty {
        entity_type: String,
        property: String,
    },

    /// A marker that does not make sense on the property it decorates.
    #[error("invalid marker on `{entity_type}.{property}`: {reason}")]
    InvalidMarker {
        entity_type: String,
        property: String,
        reason: String,
    },

    /// The schema extends a type that was never registered.
    #[error("entity type `{entity_type}` extends unregistered type `{base}`")]
    UnknownBaseType { entity_type: String, base: String },

    /// A thread panicked while holding the registry lock.
    #[error("schema registry lock poisoned")]
    RegistryPoisoned,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
