//! Explicit storage configuration for the catalog.
//!
//! # Responsibility
//! - Carry the database location and connection settings into the
//!   repository at construction time.
//! - Resolve defaults from the process environment for thin callers.
//!
//! # Invariants
//! - No connection state lives here; repositories open connections per call.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the SQLite database file.
pub const DB_PATH_ENV: &str = "BOOK_CATALOG_DB_PATH";
/// Environment variable overriding the busy timeout in milliseconds.
pub const BUSY_TIMEOUT_ENV: &str = "BOOK_CATALOG_BUSY_TIMEOUT_MS";

const DEFAULT_DB_FILE_NAME: &str = "book_catalog.sqlite3";
/// Busy timeout used when none is configured.
pub(crate) const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Storage configuration passed to `SqliteCatalogRepository::new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl CatalogConfig {
    /// Creates a configuration for the given database file.
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Resolves configuration from `BOOK_CATALOG_DB_PATH` and
    /// `BOOK_CATALOG_BUSY_TIMEOUT_MS`.
    ///
    /// Blank or unparsable values fall back to defaults: a file in the
    /// system temp directory and a 5 second busy timeout.
    pub fn from_env() -> Self {
        let db_path = std::env::var(DB_PATH_ENV)
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        let busy_timeout = std::env::var(BUSY_TIMEOUT_ENV)
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_BUSY_TIMEOUT);

        Self {
            db_path,
            busy_timeout,
        }
    }

    /// Overrides how long a connection waits on a locked database.
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogConfig, DEFAULT_BUSY_TIMEOUT};
    use std::time::Duration;

    #[test]
    fn new_uses_default_busy_timeout() {
        let config = CatalogConfig::new("/tmp/catalog.db");
        assert_eq!(config.busy_timeout(), DEFAULT_BUSY_TIMEOUT);
        assert_eq!(DEFAULT_BUSY_TIMEOUT, Duration::from_millis(5_000));
        assert!(config.db_path().ends_with("catalog.db"));
    }

    #[test]
    fn busy_timeout_can_be_overridden() {
        let config =
            CatalogConfig::new("/tmp/catalog.db").with_busy_timeout(Duration::from_millis(50));
        assert_eq!(config.busy_timeout(), Duration::from_millis(50));
    }
}
