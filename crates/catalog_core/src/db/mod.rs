//! SQLite storage for the catalog: connection bootstrap and schema migrations.
//!
//! # Responsibility
//! - Hand out configured, migrated connections to repository calls.
//! - Attach the database location to connection failures.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - No catalog row is read or written on an unmigrated connection.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{connect, open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-layer failure.
#[derive(Debug)]
pub enum DbError {
    /// Statement or pragma failure on an open connection.
    Sqlite(rusqlite::Error),
    /// Opening or bootstrapping the configured database file failed.
    Connect {
        path: PathBuf,
        source: rusqlite::Error,
    },
    /// The file was written by a newer schema than this build knows.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Primary SQLite result code, when the failure came from SQLite.
    pub fn sqlite_error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Sqlite(err) | Self::Connect { source: err, .. } => err.sqlite_error_code(),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }

    pub(crate) fn at_path(self, path: PathBuf) -> Self {
        match self {
            Self::Sqlite(source) => Self::Connect { path, source },
            other => other,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::Connect { path, source } => {
                write!(f, "cannot use catalog database `{}`: {source}", path.display())
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "catalog schema version {db_version} is newer than supported version {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Connect { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
