//! In-memory implementation of [`RecordStore`].
//!
//! [`InMemoryStore`] has the same CRUD semantics as [`crate::FileStore`] but
//! never touches disk. It backs the HTTP layer in tests and ephemeral runs.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use filedb_core::{Record, RecordId};

use crate::error::StorageError;
use crate::table::RecordTable;
use crate::traits::RecordStore;

/// Non-persistent [`RecordStore`]; all data lives in a [`RecordTable`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    table: RwLock<RecordTable>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `records`.
    pub fn with_records(records: Vec<Record>) -> Self {
        InMemoryStore {
            table: RwLock::new(RecordTable::from_records(records)),
        }
    }

    pub fn snapshot(&self) -> Result<Vec<Record>, StorageError> {
        Ok(self.read_table()?.snapshot())
    }

    fn read_table(&self) -> Result<RwLockReadGuard<'_, RecordTable>, StorageError> {
        self.table
            .read()
            .map_err(|_| StorageError::LockPoisoned("record table"))
    }

    fn write_table(&self) -> Result<RwLockWriteGuard<'_, RecordTable>, StorageError> {
        self.table
            .write()
            .map_err(|_| StorageError::LockPoisoned("record table"))
    }
}

impl RecordStore for InMemoryStore {
    fn create(&self, data: Record) -> Result<Record, StorageError> {
        self.write_table()?.create(data)
    }

    fn read(&self, id: RecordId) -> Result<Record, StorageError> {
        self.read_table()?.read(id).cloned()
    }

    fn update(&self, id: RecordId, data: Record) -> Result<Record, StorageError> {
        self.write_table()?.update(id, data)
    }

    fn delete(&self, id: RecordId) -> Result<(), StorageError> {
        self.write_table()?.delete(id).map(|_| ())
    }
}
