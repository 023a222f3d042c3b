//! Core value types for entigraph.
//!
//! This crate defines the plain, serializable types that the entity graph
//! engine builds on but that know nothing about entities themselves:
//! - [`Clock`]: the injected time source ([`SystemClock`], [`FixedClock`])
//! - [`AuditInfo`]: created/modified stamps and the concurrency stamp
//! - [`TemporalInfo`]: the validity interval used for soft deletion
//!
//! Everything that walks an entity graph lives in `entigraph-model`.

mod audit;
mod clock;
mod temporal;

pub use audit::AuditInfo;
pub use clock::{Clock, DEFAULT_OFFSET_SECONDS, FixedClock, SystemClock, default_offset, offset_from_seconds};
pub use temporal::{TemporalInfo, TemporalState};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid time zone offset: {0} seconds")]
    InvalidOffset(i32),
}
