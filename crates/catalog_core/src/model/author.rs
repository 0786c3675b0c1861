//! Author domain model.
//!
//! # Responsibility
//! - Define the author record and its identity key.
//! - Own the one-shot transition from draft identity to stored identity.
//!
//! # Invariants
//! - `id == 0` means "not yet persisted"; a positive id is assigned once.
//! - Two unpersisted authors are equal only if they are the same record
//!   (same draft token), never because their names match.
//! - `books` is mutated only through the association routines, so it always
//!   mirrors `Book::authors`.

use crate::model::association;
use crate::model::book::{Book, Isbn};
use crate::model::validation::{require_text, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Storage-assigned author identifier.
pub type AuthorId = i64;

/// Marker for an author that has not been inserted yet.
pub const UNSET_AUTHOR_ID: AuthorId = 0;

/// Identity key used for author set membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AuthorKey {
    /// Durable identity assigned by storage.
    Stored(AuthorId),
    /// In-memory identity of a record that has not been persisted.
    Draft(Uuid),
}

impl AuthorKey {
    /// Returns the storage id for persisted authors.
    pub fn stored_id(self) -> Option<AuthorId> {
        match self {
            Self::Stored(id) => Some(id),
            Self::Draft(_) => None,
        }
    }

    pub fn is_draft(self) -> bool {
        matches!(self, Self::Draft(_))
    }
}

impl Display for AuthorKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stored(id) => write!(f, "{id}"),
            Self::Draft(token) => write!(f, "draft:{token}"),
        }
    }
}

/// Partial author update. Absent or blank fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Catalog author record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    id: AuthorId,
    pub first_name: String,
    pub last_name: String,
    books: BTreeSet<Isbn>,
    draft: Uuid,
}

impl Author {
    /// Creates an unpersisted author with a fresh draft identity.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: UNSET_AUTHOR_ID,
            first_name: first_name.into(),
            last_name: last_name.into(),
            books: BTreeSet::new(),
            draft: Uuid::new_v4(),
        }
    }

    /// Creates an author that already has a durable id.
    ///
    /// Used by read paths that hydrate rows from storage.
    pub fn with_id(
        id: AuthorId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Result<Self, ModelValidationError> {
        if id <= UNSET_AUTHOR_ID {
            return Err(ModelValidationError::InvalidAuthorId(id));
        }
        let mut author = Self::new(first_name, last_name);
        author.id = id;
        Ok(author)
    }

    /// Returns the storage id, or `UNSET_AUTHOR_ID` before first insert.
    pub fn id(&self) -> AuthorId {
        self.id
    }

    pub fn is_persisted(&self) -> bool {
        self.id > UNSET_AUTHOR_ID
    }

    /// Identity key used for equality and association membership.
    pub fn key(&self) -> AuthorKey {
        if self.is_persisted() {
            AuthorKey::Stored(self.id)
        } else {
            AuthorKey::Draft(self.draft)
        }
    }

    /// Records the storage-assigned id.
    ///
    /// Returns the draft key this record was known by, so holders of that key
    /// can be re-keyed with `Book::adopt_author_id`.
    ///
    /// # Errors
    /// - `InvalidAuthorId` when `id` is not positive.
    /// - `AuthorIdAlreadyAssigned` when the record is already persisted.
    pub fn assign_id(&mut self, id: AuthorId) -> Result<AuthorKey, ModelValidationError> {
        if id <= UNSET_AUTHOR_ID {
            return Err(ModelValidationError::InvalidAuthorId(id));
        }
        if self.is_persisted() {
            return Err(ModelValidationError::AuthorIdAlreadyAssigned {
                current: self.id,
                attempted: id,
            });
        }
        let previous = self.key();
        self.id = id;
        Ok(previous)
    }

    /// "First Last", without a trailing space when the last name is empty.
    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }

    /// ISBNs of books associated with this author.
    pub fn books(&self) -> &BTreeSet<Isbn> {
        &self.books
    }

    pub fn has_book(&self, isbn: &str) -> bool {
        self.books.contains(isbn)
    }

    /// Associates this author with `book` on both sides.
    ///
    /// Returns `false` when the association already existed.
    pub fn associate(&mut self, book: &mut Book) -> bool {
        association::link(book, self)
    }

    /// Removes the association with `book` on both sides.
    pub fn dissociate(&mut self, book: &mut Book) -> bool {
        association::unlink(book, self)
    }

    /// Applies non-blank patch fields, trimmed.
    pub fn apply_patch(&mut self, patch: &AuthorPatch) {
        if let Some(first_name) = non_blank(patch.first_name.as_deref()) {
            self.first_name = first_name.to_string();
        }
        if let Some(last_name) = non_blank(patch.last_name.as_deref()) {
            self.last_name = last_name.to_string();
        }
    }

    /// Validates fields required before persistence.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("first_name", &self.first_name)
    }

    pub(super) fn insert_book_key(&mut self, isbn: &str) -> bool {
        self.books.insert(isbn.to_string())
    }

    pub(super) fn remove_book_key(&mut self, isbn: &str) -> bool {
        self.books.remove(isbn)
    }

    pub(crate) fn hydrate_books(&mut self, isbns: impl IntoIterator<Item = Isbn>) {
        self.books.extend(isbns);
    }

    pub(crate) fn take_books(&mut self) -> BTreeSet<Isbn> {
        std::mem::take(&mut self.books)
    }
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Author {}

impl Hash for Author {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl Display for Author {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Author ID: {}, Name: {} {}",
            self.id, self.first_name, self.last_name
        )
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Author, AuthorKey, AuthorPatch};
    use crate::model::validation::ModelValidationError;

    #[test]
    fn fresh_authors_with_same_name_are_distinct() {
        let first = Author::new("Joshua", "Bloch");
        let second = Author::new("Joshua", "Bloch");
        assert_ne!(first, second);
        assert_eq!(first, first.clone());
    }

    #[test]
    fn assign_id_transitions_once() {
        let mut author = Author::new("Joshua", "Bloch");
        let draft = author.key();
        assert!(draft.is_draft());

        let previous = author.assign_id(7).unwrap();
        assert_eq!(previous, draft);
        assert_eq!(author.key(), AuthorKey::Stored(7));

        let err = author.assign_id(8).unwrap_err();
        assert_eq!(
            err,
            ModelValidationError::AuthorIdAlreadyAssigned {
                current: 7,
                attempted: 8
            }
        );
    }

    #[test]
    fn assign_id_rejects_non_positive_values() {
        let mut author = Author::new("Ada", "Lovelace");
        assert!(matches!(
            author.assign_id(0),
            Err(ModelValidationError::InvalidAuthorId(0))
        ));
        assert!(!author.is_persisted());
    }

    #[test]
    fn persisted_authors_compare_by_id() {
        let left = Author::with_id(3, "Ada", "Lovelace").unwrap();
        let right = Author::with_id(3, "Augusta", "King").unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn patch_keeps_blank_fields_and_trims_the_rest() {
        let mut author = Author::new("Ada", "Lovelace");
        author.apply_patch(&AuthorPatch {
            first_name: Some("  ".to_string()),
            last_name: Some(" King ".to_string()),
        });
        assert_eq!(author.first_name, "Ada");
        assert_eq!(author.last_name, "King");
    }

    #[test]
    fn full_name_omits_empty_last_name() {
        assert_eq!(Author::new("Plato", "").full_name(), "Plato");
        assert_eq!(Author::new("Ada", "Lovelace").full_name(), "Ada Lovelace");
    }
}
