//! Validation errors shared by catalog entities.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field-level validation failure raised before any storage call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Required text field is empty after trim.
    BlankField(&'static str),
    /// Edition numbers start at 1.
    NonPositiveEdition,
    /// Numeric input could not be parsed.
    NotANumber { field: &'static str, value: String },
    /// Author id must be a positive storage-assigned value.
    InvalidAuthorId(i64),
    /// Author id may transition from unset to assigned only once.
    AuthorIdAlreadyAssigned { current: i64, attempted: i64 },
    /// A key handshake named an author the book is not linked with on both
    /// sides, or an author that has no stored id yet.
    AssociationMismatch { isbn: String, author: String },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::NonPositiveEdition => write!(f, "edition_number must be a positive integer"),
            Self::NotANumber { field, value } => {
                write!(f, "{field} must be a number, got `{value}`")
            }
            Self::InvalidAuthorId(id) => write!(f, "invalid author id {id}"),
            Self::AuthorIdAlreadyAssigned { current, attempted } => write!(
                f,
                "author id already assigned ({current}); refusing to reassign to {attempted}"
            ),
            Self::AssociationMismatch { isbn, author } => write!(
                f,
                "book {isbn} and author {author} are not associated on both sides"
            ),
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::BlankField(field));
    }
    Ok(())
}
