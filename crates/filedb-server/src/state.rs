//! Application state shared by all handlers.
//!
//! [`AppState`] holds the store behind `Arc<dyn RecordStore>`. No outer
//! mutex is needed: every backend synchronizes internally, and CRUD calls on
//! the file store only touch memory, so handlers call it directly from async
//! context.

use std::sync::Arc;

use filedb_storage::{InMemoryStore, RecordStore};

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// The record store all handlers operate on.
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    /// Wraps an existing store, typically a [`filedb_storage::FileStore`]
    /// whose handle the caller keeps so it can close it on shutdown.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        AppState { store }
    }

    /// Creates a new `AppState` with a non-persistent store (for testing).
    pub fn in_memory() -> Self {
        AppState {
            store: Arc::new(InMemoryStore::new()),
        }
    }
}
