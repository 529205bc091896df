//! HTTP/JSON API over a filedb record store.
//!
//! Handlers are thin translators: they decode request bodies into records,
//! call the [`filedb_storage::RecordStore`] held in [`state::AppState`], and
//! map storage errors to HTTP status codes. This crate contains the server
//! configuration, error handling, and route definitions.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
