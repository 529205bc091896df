//! File-backed implementation of [`RecordStore`].
//!
//! [`FileStore`] keeps the whole collection in a [`RecordTable`] and persists
//! it to a single JSON file with write-back semantics: CRUD calls only touch
//! memory, and a [`FlushWorker`] rewrites the file in the background.
//!
//! Locking:
//! - the table sits behind an `RwLock`; mutations take it exclusively,
//!   reads and the flush snapshot take it shared;
//! - the file handle sits behind its own `Mutex`, taken only on the flush
//!   path (background worker or [`FileStore::sync`]), always *before* the
//!   table lock.
//!
//! Durability is eventually consistent: a crash can lose up to one timer
//! interval of mutations, and a crash between truncate and rewrite can leave
//! the file empty or partial. Everything is on disk once [`FileStore::close`]
//! returns `Ok`.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use filedb_core::{Record, RecordId};

use crate::codec;
use crate::error::StorageError;
use crate::flush::{DirtyCounter, FlushConfig, FlushSignal, FlushWorker};
use crate::table::RecordTable;
use crate::traits::RecordStore;

#[derive(Debug)]
struct TableState {
    table: RecordTable,
    /// Set under the write lock by `close`, so every mutation is either in
    /// the final flush or rejected.
    closed: bool,
}

/// State shared between the store and its flush worker.
#[derive(Debug)]
struct Shared {
    table: RwLock<TableState>,
    /// `None` once the store is closed.
    file: Mutex<Option<File>>,
    dirty: DirtyCounter,
}

impl Shared {
    fn read_state(&self) -> Result<RwLockReadGuard<'_, TableState>, StorageError> {
        self.table
            .read()
            .map_err(|_| StorageError::LockPoisoned("record table"))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, TableState>, StorageError> {
        self.table
            .write()
            .map_err(|_| StorageError::LockPoisoned("record table"))
    }

    fn lock_file(&self) -> Result<MutexGuard<'_, Option<File>>, StorageError> {
        self.file
            .lock()
            .map_err(|_| StorageError::LockPoisoned("backing file"))
    }

    /// Rewrites the backing file from the current table and clears the
    /// dirty counter. On failure the counter is left as it was.
    fn flush(&self) -> Result<(), StorageError> {
        let mut file = self.lock_file()?;
        let file = file.as_mut().ok_or(StorageError::Closed)?;

        let state = self.read_state()?;
        codec::encode(file, state.table.records())?;
        self.dirty.reset();

        debug!(records = state.table.len(), "rewrote backing file");
        Ok(())
    }
}

/// Write-back record store persisted to a single JSON file.
///
/// Safe to share across threads (`Arc<FileStore>`). Closing is explicit via
/// [`FileStore::close`]; dropping an open store closes it too.
pub struct FileStore {
    shared: Arc<Shared>,
    signal: FlushSignal,
    worker: Mutex<FlushWorker>,
    path: Option<PathBuf>,
}

impl FileStore {
    /// Opens (or creates) the store file at `path` and loads its records.
    pub fn open(path: impl AsRef<Path>, config: FlushConfig) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let mut store = Self::from_file(file, config)?;
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// Builds a store on an already-open read/write handle.
    ///
    /// The whole file is decoded from the start regardless of the handle's
    /// current position. Malformed content fails construction.
    pub fn from_file(mut file: File, config: FlushConfig) -> Result<Self, StorageError> {
        let records = codec::decode(&mut file)?;
        let table = RecordTable::from_records(records);
        info!(records = table.len(), "loaded record table");

        let shared = Arc::new(Shared {
            table: RwLock::new(TableState {
                table,
                closed: false,
            }),
            file: Mutex::new(Some(file)),
            dirty: DirtyCounter::default(),
        });

        let flush_shared = Arc::clone(&shared);
        let worker = FlushWorker::spawn(config, move || flush_shared.flush())?;
        let signal = worker.signal().clone();

        Ok(FileStore {
            shared,
            signal,
            worker: Mutex::new(worker),
            path: None,
        })
    }

    /// Path the store was opened from, if it was opened by path.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Mutations applied since the last successful flush.
    pub fn dirty_count(&self) -> usize {
        self.shared.dirty.get()
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.shared.read_state()?.table.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.shared.read_state()?.table.is_empty())
    }

    /// Copy of every record, in table order.
    pub fn snapshot(&self) -> Result<Vec<Record>, StorageError> {
        Ok(self.shared.read_state()?.table.snapshot())
    }

    /// Flushes synchronously on the calling thread.
    pub fn sync(&self) -> Result<(), StorageError> {
        self.shared.flush()
    }

    pub fn is_closed(&self) -> bool {
        self.shared
            .read_state()
            .map(|state| state.closed)
            .unwrap_or(true)
    }

    /// Performs a final flush, stops the worker, then syncs and releases the
    /// file handle. Blocks until the flush has completed.
    ///
    /// After close, mutations fail with [`StorageError::Closed`]; reads still
    /// work. If the final flush or sync fails the handle is kept, so a later
    /// `close` or [`FileStore::sync`] retries it. Once a close has succeeded,
    /// later calls return `Ok(())` without doing anything.
    pub fn close(&self) -> Result<(), StorageError> {
        let mut worker = self
            .worker
            .lock()
            .map_err(|_| StorageError::LockPoisoned("flush worker"))?;
        let first_close = {
            let mut state = self.shared.write_state()?;
            !std::mem::replace(&mut state.closed, true)
        };

        if first_close {
            worker.shutdown()?;
        } else {
            if self.shared.lock_file()?.is_none() {
                return Ok(());
            }
            self.shared.flush()?;
        }

        let mut file = self.shared.lock_file()?;
        if let Some(handle) = file.as_ref() {
            handle.sync_all()?;
        }
        file.take();

        info!(path = ?self.path, "record store closed");
        Ok(())
    }

    /// Applies `op` under the table write lock, counts it as one mutation
    /// and nudges the flush worker if the counter crossed the threshold.
    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut RecordTable) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let (out, dirty) = {
            let mut state = self.shared.write_state()?;
            if state.closed {
                return Err(StorageError::Closed);
            }
            let out = op(&mut state.table)?;
            (out, self.shared.dirty.increment())
        };

        if self.signal.notify(dirty) {
            debug!(dirty, "requested flush");
        }
        Ok(out)
    }
}

impl RecordStore for FileStore {
    fn create(&self, data: Record) -> Result<Record, StorageError> {
        self.mutate(|table| table.create(data))
    }

    fn read(&self, id: RecordId) -> Result<Record, StorageError> {
        self.shared.read_state()?.table.read(id).cloned()
    }

    fn update(&self, id: RecordId, data: Record) -> Result<Record, StorageError> {
        self.mutate(|table| table.update(id, data))
    }

    fn delete(&self, id: RecordId) -> Result<(), StorageError> {
        self.mutate(|table| table.delete(id).map(|_| ()))
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "closing record store on drop failed");
        }
    }
}
