//! The [`RecordStore`] trait defining the storage contract for records.
//!
//! All backends (FileStore, InMemoryStore) implement this trait, so the HTTP
//! layer can hold either behind an `Arc<dyn RecordStore>`. Methods take
//! `&self` because every backend synchronizes internally and is shared
//! across request handlers.

use filedb_core::{Record, RecordId};

use crate::error::StorageError;

/// The storage contract for schema-less records.
pub trait RecordStore: Send + Sync {
    /// Assigns the next identifier to `data` and appends it.
    ///
    /// Any `id` already present in `data` is overwritten. Returns the stored
    /// record, including its identifier.
    fn create(&self, data: Record) -> Result<Record, StorageError>;

    /// Retrieves a copy of the record with the given identifier.
    fn read(&self, id: RecordId) -> Result<Record, StorageError>;

    /// Replaces the record with the given identifier by `data`.
    ///
    /// This is a full replacement, not a merge: fields absent from `data`
    /// are dropped. The original identifier is re-stamped onto the stored
    /// record, which is returned.
    fn update(&self, id: RecordId, data: Record) -> Result<Record, StorageError>;

    /// Removes the record with the given identifier, keeping the relative
    /// order of the remaining records.
    fn delete(&self, id: RecordId) -> Result<(), StorageError>;
}
