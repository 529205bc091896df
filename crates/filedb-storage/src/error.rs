//! Storage error types for filedb-storage.
//!
//! [`StorageError`] covers all anticipated failure modes in the storage layer:
//! missing records, corrupted identifiers, codec failures on the backing
//! file, and use of a store after it has been closed.

use filedb_core::{CoreError, RecordId};
use thiserror::Error;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No record has the given identifier.
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    /// A stored record's `id` field is not a numeric identifier.
    #[error("invalid ID type in record at position {position}: {cause}")]
    InvalidIdentifierType {
        position: usize,
        #[source]
        cause: CoreError,
    },

    /// The identifier space is exhausted.
    #[error("identifier space exhausted after {last}")]
    IdentifierOverflow { last: RecordId },

    /// The backing file does not hold a JSON array of objects.
    #[error("error unmarshalling JSON data: {0}")]
    Decode(#[source] serde_json::Error),

    /// Serializing the table into the backing file failed.
    #[error("error encoding JSON data: {0}")]
    Encode(#[source] serde_json::Error),

    /// Reading, truncating, seeking or syncing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store was closed; no further mutations are accepted.
    #[error("store is closed")]
    Closed,

    /// The background flush worker exited without answering a shutdown request.
    #[error("flush worker terminated unexpectedly")]
    WorkerTerminated,

    /// A thread panicked while holding one of the store's locks.
    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),
}
