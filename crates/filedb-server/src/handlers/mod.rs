//! HTTP handler modules for the filedb API.
//!
//! Each sub-module implements thin handlers that parse requests, delegate to
//! the [`RecordStore`](filedb_storage::RecordStore), and return JSON
//! responses. No business logic lives in handlers.

pub mod records;
