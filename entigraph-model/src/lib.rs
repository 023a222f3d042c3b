//! Entity graph engine for entigraph.
//!
//! Domain objects are [`Entity`] values shared through [`EntityRef`] handles
//! and described by [`EntityType`]s resolved from declarative
//! [`EntitySchema`]s:
//! - [`SchemaRegistry`]: resolves and caches per-type metadata (key, nesting list, aggregations)
//! - change tracking: a [`ChangeLedger`] of original values with begin/cancel/end edit
//! - validation: an [`EntityValidator`] per type, errors routed to their target entity
//! - shared aggregations: detached before persisting and reattached after
//! - temporal lifecycle: deletion by closing a validity interval
//!
//! Graph operations cascade through nesting-list properties and visit each
//! entity once, so cyclic graphs are safe.

mod aggregation;
mod audit;
mod context;
mod entity;
mod error;
pub mod event;
mod metadata;
mod repository;
mod schema;
mod temporal;
mod tracking;
mod traverse;
mod validation;
mod validator;
mod value;

pub use context::EntityContext;
pub use entity::Entity;
pub use error::{ModelError, ModelResult};
pub use event::{EntityEvent, Listener};
pub use metadata::{EntityMetadata, EntityType, KeyDescriptor, SchemaRegistry};
pub use repository::{EntityRepository, RepositoryFinder, is_new_identity};
pub use schema::{
    Aggregation, BASE_ENTITY, Capabilities, EntitySchema, ID_PROPERTY, KeyMarker, PropertyKind,
    PropertySchema, ScalarType,
};
pub use temporal::{VALID_FROM_PATH, VALID_TO_PATH};
pub use tracking::ChangeLedger;
pub use validator::{EntityValidator, ValidationError, ValidationResult};
pub use value::{EntityRef, Value};

pub use entigraph_types::{AuditInfo, Clock, FixedClock, SystemClock, TemporalInfo, TemporalState};
