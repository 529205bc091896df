pub mod error;
pub mod id;
pub mod record;

// Re-export commonly used types
pub use error::CoreError;
pub use id::RecordId;
pub use record::{value_kind, Record, ID_FIELD};
