//! Core error types for filedb-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! the ways a record can fail to satisfy the data model.

use thiserror::Error;

/// Core errors produced by the filedb-core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A value that should have been a JSON object was something else.
    #[error("record must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// The caller supplied a field the store reserves for itself.
    #[error("Field '{field}' is not allowed")]
    ReservedField { field: &'static str },

    /// The reserved `id` field is missing or does not hold a valid identifier.
    #[error("invalid ID type in record: found {found}")]
    InvalidIdentifier { found: &'static str },
}
