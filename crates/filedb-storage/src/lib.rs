//! Write-back persistence for filedb record collections.
//!
//! Provides the [`RecordStore`] trait defining the CRUD contract, the
//! file-backed [`FileStore`] and the non-persistent [`InMemoryStore`].
//!
//! # Architecture
//!
//! Mutations never touch the disk. They update the in-memory
//! [`RecordTable`] under its lock and bump a dirty counter; a background
//! flush worker rewrites the whole backing file when the counter crosses a
//! threshold, when a periodic timer fires, or when the store is closed.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`traits`]: RecordStore trait definition
//! - [`table`]: RecordTable, the ordered in-memory collection and id allocator
//! - [`codec`]: whole-file JSON encode/decode
//! - [`flush`]: FlushConfig, dirty counter and the background flush worker
//! - [`file`]: FileStore implementation
//! - [`memory`]: InMemoryStore implementation

pub mod codec;
pub mod error;
pub mod file;
pub mod flush;
pub mod memory;
pub mod table;
pub mod traits;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use file::FileStore;
pub use flush::FlushConfig;
pub use memory::InMemoryStore;
pub use table::RecordTable;
pub use traits::RecordStore;
