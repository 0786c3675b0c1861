//! Repository error taxonomy.

use crate::db::DbError;
use crate::model::author::AuthorId;
use crate::model::book::Isbn;
use crate::model::validation::ModelValidationError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Key of the row(s) a repository call targeted; used in errors and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    Book(Isbn),
    Author(AuthorId),
    Link { isbn: Isbn, author_id: AuthorId },
    All,
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Book(isbn) => write!(f, "isbn={isbn}"),
            Self::Author(id) => write!(f, "author_id={id}"),
            Self::Link { isbn, author_id } => write!(f, "isbn={isbn} author_id={author_id}"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Repository error for catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Entity failed `validate()` before any SQL ran.
    Validation(ModelValidationError),
    /// Update-by-key matched no row.
    NotFound(RecordKey),
    /// Insert of an author that already carries a storage id.
    AlreadyPersisted(RecordKey),
    /// Duplicate key, foreign key, check or trigger abort.
    ConstraintViolation(DbError),
    /// Busy, locked or unreachable database.
    StorageUnavailable(DbError),
    /// Insert reported success without yielding a generated key.
    MissingGeneratedKey(RecordKey),
    /// Persisted row cannot be mapped back to a valid entity.
    InvalidData(String),
    Db(DbError),
}

impl RepoError {
    /// Short stable label used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::AlreadyPersisted(_) => "already_persisted",
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::MissingGeneratedKey(_) => "missing_generated_key",
            Self::InvalidData(_) => "invalid_data",
            Self::Db(_) => "db",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(key) => write!(f, "record not found: {key}"),
            Self::AlreadyPersisted(key) => write!(f, "record already persisted: {key}"),
            Self::ConstraintViolation(err) => write!(f, "constraint violation: {err}"),
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::MissingGeneratedKey(key) => {
                write!(f, "insert returned no generated key: {key}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::ConstraintViolation(err) | Self::StorageUnavailable(err) | Self::Db(err) => {
                Some(err)
            }
            Self::NotFound(_)
            | Self::AlreadyPersisted(_)
            | Self::MissingGeneratedKey(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => Self::ConstraintViolation(value),
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure,
            ) => Self::StorageUnavailable(value),
            _ => Self::Db(value),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(DbError::Sqlite(value))
    }
}
