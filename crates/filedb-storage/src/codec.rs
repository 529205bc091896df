//! Whole-file JSON codec for the backing file.
//!
//! The on-disk format is either an empty file or a single JSON array of
//! objects. There is no incremental encoding: every write truncates the file
//! and re-serializes the full collection. A failure part-way through leaves
//! the file truncated or partially written.

use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};

use filedb_core::Record;

use crate::error::StorageError;

/// Reads the whole file from the start and decodes it.
///
/// An empty file decodes to an empty collection. Anything that is not a JSON
/// array of objects is [`StorageError::Decode`].
pub fn decode(file: &mut File) -> Result<Vec<Record>, StorageError> {
    file.seek(SeekFrom::Start(0))?;
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    decode_bytes(&content)
}

pub fn decode_bytes(content: &[u8]) -> Result<Vec<Record>, StorageError> {
    if content.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_slice(content).map_err(StorageError::Decode)
}

/// Truncates the file and writes `records` as one JSON array plus a newline.
pub fn encode(file: &mut File, records: &[Record]) -> Result<(), StorageError> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, records).map_err(StorageError::Encode)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
