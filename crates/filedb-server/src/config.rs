//! Server configuration from environment variables.
//!
//! - `FILEDB_PATH`: store file path (default: "./testdata/db.json")
//! - `FILEDB_PORT`: listen port (default: "8080")
//! - `FILEDB_FLUSH_THRESHOLD`: dirty writes tolerated before a flush is
//!   requested (default: 5)
//! - `FILEDB_FLUSH_INTERVAL_SECS`: flush timer period (default: 5)

use std::path::PathBuf;
use std::time::Duration;

use filedb_storage::FlushConfig;

pub const DEFAULT_DB_PATH: &str = "./testdata/db.json";
pub const DEFAULT_PORT: u16 = 8080;

/// A configuration variable held a value that does not parse.
#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {var}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub flush: FlushConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            port: DEFAULT_PORT,
            flush: FlushConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults
    /// for unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = ServerConfig::default();

        if let Some(path) = lookup("FILEDB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(port) = parse(&lookup, "FILEDB_PORT")? {
            config.port = port;
        }
        if let Some(threshold) = parse(&lookup, "FILEDB_FLUSH_THRESHOLD")? {
            config.flush = config.flush.with_dirty_threshold(threshold);
        }
        if let Some(secs) = parse::<u64, _>(&lookup, "FILEDB_FLUSH_INTERVAL_SECS")? {
            if secs == 0 {
                return Err(ConfigError {
                    var: "FILEDB_FLUSH_INTERVAL_SECS",
                    value: secs.to_string(),
                });
            }
            config.flush = config.flush.with_interval(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

fn parse<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError { var, value }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let vars: HashMap<&'static str, String> =
            vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |var: &'static str| vars.get(var).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 8080);
        assert_eq!(config.flush.dirty_threshold, 5);
        assert_eq!(config.flush.interval, Duration::from_secs(5));
    }

    #[test]
    fn overrides_from_vars() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("FILEDB_PATH", "/tmp/records.json"),
            ("FILEDB_PORT", "9000"),
            ("FILEDB_FLUSH_THRESHOLD", "50"),
            ("FILEDB_FLUSH_INTERVAL_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/records.json"));
        assert_eq!(config.port, 9000);
        assert_eq!(config.flush.dirty_threshold, 50);
        assert_eq!(config.flush.interval, Duration::from_secs(30));
    }

    #[test]
    fn rejects_unparseable_values() {
        let err = ServerConfig::from_lookup(lookup(&[("FILEDB_PORT", "eighty")])).unwrap_err();
        assert_eq!(err.var, "FILEDB_PORT");
        assert_eq!(err.value, "eighty");

        assert!(ServerConfig::from_lookup(lookup(&[("FILEDB_FLUSH_INTERVAL_SECS", "0")])).is_err());
    }
}
