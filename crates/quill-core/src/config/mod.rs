//! Runtime configuration shared by clients.
//!
//! Values come from the environment (`.env` files are loaded by the
//! binaries before this runs) with platform defaults as fallback.

use std::env;
use std::path::PathBuf;

/// Database file location override
pub const DB_PATH_ENV: &str = "QUILL_DB_PATH";
/// `tracing` filter directive override
pub const LOG_FILTER_ENV: &str = "QUILL_LOG";

const DEFAULT_LOG_FILTER: &str = "quill=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let defaults = Self::default();
        Self {
            db_path: value(DB_PATH_ENV).map_or(defaults.db_path, PathBuf::from),
            log_filter: value(LOG_FILTER_ENV).unwrap_or(defaults.log_filter),
        }
    }
}

/// `<local data dir>/quill/quill.db`, or the working directory when the
/// platform has no data directory.
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quill")
        .join("quill.db")
}
