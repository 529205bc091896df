//! filedb command-line tool.
//!
//! Provides the `filedb` binary with one-shot CRUD subcommands against a
//! store file. Each invocation opens the store, performs one operation,
//! prints the result as JSON, and closes the store so the change is flushed
//! before the process exits.
//!
//! Uses the same [`FileStore`] as the HTTP server, so both entry points see
//! identical id allocation and file format.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::Value;

use filedb_core::{Record, RecordId};
use filedb_storage::{FileStore, FlushConfig, RecordStore, StorageError};

/// filedb record store tools.
#[derive(Parser)]
#[command(name = "filedb", about = "filedb record store tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create a record and print it with its assigned id.
    Create {
        /// Path to the store file.
        #[arg(short, long)]
        db: PathBuf,

        /// Record as a JSON object, without an `id` field.
        #[arg(long)]
        data: String,
    },
    /// Print the record with the given id.
    Get {
        /// Path to the store file.
        #[arg(short, long)]
        db: PathBuf,

        /// Record id.
        #[arg(short, long)]
        id: u32,
    },
    /// Replace the record with the given id.
    Update {
        /// Path to the store file.
        #[arg(short, long)]
        db: PathBuf,

        /// Record id.
        #[arg(short, long)]
        id: u32,

        /// Replacement record as a JSON object, without an `id` field.
        #[arg(long)]
        data: String,
    },
    /// Delete the record with the given id.
    Delete {
        /// Path to the store file.
        #[arg(short, long)]
        db: PathBuf,

        /// Record id.
        #[arg(short, long)]
        id: u32,
    },
    /// Print every record in table order.
    Dump {
        /// Path to the store file.
        #[arg(short, long)]
        db: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Create { db, data } => match parse_record(&data) {
            Ok(record) => run(&db, |store| store.create(record).map(Value::from)),
            Err(code) => code,
        },
        Commands::Get { db, id } => run(&db, |store| store.read(RecordId(id)).map(Value::from)),
        Commands::Update { db, id, data } => match parse_record(&data) {
            Ok(record) => run(&db, |store| {
                store.update(RecordId(id), record).map(Value::from)
            }),
            Err(code) => code,
        },
        Commands::Delete { db, id } => run(&db, |store| {
            store
                .delete(RecordId(id))
                .map(|()| serde_json::json!({ "deleted": id }))
        }),
        Commands::Dump { db } => run(&db, |store| {
            let records = store.snapshot()?;
            Ok(Value::Array(records.into_iter().map(Value::from).collect()))
        }),
    };

    process::exit(exit_code);
}

/// Parses `--data` into a record the caller may submit.
///
/// Returns exit code 1 on failure.
fn parse_record(data: &str) -> Result<Record, i32> {
    let value: Value = serde_json::from_str(data).map_err(|e| {
        eprintln!("Error: --data is not valid JSON: {}", e);
        1
    })?;
    let record = Record::try_from(value).map_err(|e| {
        eprintln!("Error: {}", e);
        1
    })?;
    record.ensure_unreserved().map_err(|e| {
        eprintln!("Error: {}", e);
        1
    })?;
    Ok(record)
}

/// Opens the store, runs `op`, prints its output and closes the store.
///
/// Returns exit code: 0 = success, 1 = record not found,
/// 3 = I/O, decode or storage failure.
fn run<F>(db_path: &Path, op: F) -> i32
where
    F: FnOnce(&FileStore) -> Result<Value, StorageError>,
{
    let store = match FileStore::open(db_path, FlushConfig::default()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: failed to open store '{}': {}", db_path.display(), e);
            return 3;
        }
    };

    let exit_code = match op(&store) {
        Ok(output) => {
            let json = serde_json::to_string_pretty(&output).unwrap_or_else(|e| {
                format!("{{\"error\": \"failed to serialize result: {}\"}}", e)
            });
            println!("{}", json);
            0
        }
        Err(e @ StorageError::RecordNotFound(_)) => {
            eprintln!("Error: {}", e);
            1
        }
        Err(e) => {
            eprintln!("Storage error: {}", e);
            3
        }
    };

    if let Err(e) = store.close() {
        eprintln!("Error: failed to flush store '{}': {}", db_path.display(), e);
        return 3;
    }
    exit_code
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_record_rejects_reserved_and_non_objects() {
        assert!(parse_record(r#"{"name": "Bob"}"#).is_ok());
        assert_eq!(parse_record(r#"{"id": 1}"#).unwrap_err(), 1);
        assert_eq!(parse_record("[1]").unwrap_err(), 1);
        assert_eq!(parse_record("{").unwrap_err(), 1);
    }

    #[test]
    fn run_creates_and_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        let record = parse_record(r#"{"name": "Bob"}"#).unwrap();
        assert_eq!(run(&path, |store| store.create(record).map(Value::from)), 0);
        assert_eq!(run(&path, |store| store.read(RecordId(1)).map(Value::from)), 0);
        assert_eq!(run(&path, |store| store.read(RecordId(2)).map(Value::from)), 1);

        let stored = std::fs::read_to_string(&path).unwrap();
        assert_eq!(stored, "[{\"name\":\"Bob\",\"id\":1}]\n");
    }
}
