//! Book domain model.
//!
//! # Responsibility
//! - Define the book record keyed by ISBN.
//! - Expose the book side of the Book↔Author association.
//!
//! # Invariants
//! - `isbn` is fixed at construction.
//! - `authors` is mutated only through the association routines, so it always
//!   mirrors `Author::books`.
//! - `edition_number` is positive for every valid book.

use crate::model::association;
use crate::model::author::{Author, AuthorKey};
use crate::model::validation::{require_text, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Natural book key.
pub type Isbn = String;

/// Partial book update. `None` or blank text keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub edition_number: Option<u32>,
    pub copyright: Option<String>,
}

/// Catalog book record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    isbn: Isbn,
    pub title: String,
    pub edition_number: u32,
    /// Year or free-form copyright notice.
    pub copyright: String,
    authors: BTreeSet<AuthorKey>,
}

impl Book {
    pub fn new(
        isbn: impl Into<String>,
        title: impl Into<String>,
        edition_number: u32,
        copyright: impl Into<String>,
    ) -> Self {
        Self {
            isbn: isbn.into(),
            title: title.into(),
            edition_number,
            copyright: copyright.into(),
            authors: BTreeSet::new(),
        }
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    /// Keys of authors associated with this book.
    pub fn authors(&self) -> &BTreeSet<AuthorKey> {
        &self.authors
    }

    pub fn has_author(&self, key: AuthorKey) -> bool {
        self.authors.contains(&key)
    }

    /// Associates this book with `author` on both sides.
    ///
    /// Returns `false` when the association already existed.
    pub fn associate(&mut self, author: &mut Author) -> bool {
        association::link(self, author)
    }

    /// Removes the association with `author` on both sides.
    pub fn dissociate(&mut self, author: &mut Author) -> bool {
        association::unlink(self, author)
    }

    /// Re-keys `author` after storage assigned its id.
    ///
    /// `previous` is the draft key returned by `Author::assign_id`. The swap
    /// happens only when both sides still agree: the book holds `previous`,
    /// the author lists this book, and the author now has a stored key.
    ///
    /// # Errors
    /// - `AssociationMismatch` when any of those checks fails; the book is
    ///   left untouched.
    pub fn adopt_author_id(
        &mut self,
        author: &Author,
        previous: AuthorKey,
    ) -> Result<(), ModelValidationError> {
        let current = author.key();
        let consistent = previous.is_draft()
            && !current.is_draft()
            && self.authors.contains(&previous)
            && author.has_book(&self.isbn);
        if !consistent {
            return Err(ModelValidationError::AssociationMismatch {
                isbn: self.isbn.clone(),
                author: current.to_string(),
            });
        }
        self.rekey_author(previous, current);
        Ok(())
    }

    /// Replaces `old` with `new` in the author set.
    ///
    /// Returns `false` when `old` was not a member. Callers keep the author
    /// side in step.
    pub(crate) fn rekey_author(&mut self, old: AuthorKey, new: AuthorKey) -> bool {
        if !self.authors.remove(&old) {
            return false;
        }
        self.authors.insert(new);
        true
    }

    /// Applies present, non-blank patch fields, trimmed.
    pub fn apply_patch(&mut self, patch: &BookPatch) {
        if let Some(title) = trimmed(patch.title.as_deref()) {
            self.title = title.to_string();
        }
        if let Some(edition_number) = patch.edition_number {
            self.edition_number = edition_number;
        }
        if let Some(copyright) = trimmed(patch.copyright.as_deref()) {
            self.copyright = copyright.to_string();
        }
    }

    /// Validates fields required before persistence.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("isbn", &self.isbn)?;
        require_text("title", &self.title)?;
        require_text("copyright", &self.copyright)?;
        if self.edition_number == 0 {
            return Err(ModelValidationError::NonPositiveEdition);
        }
        Ok(())
    }

    pub(super) fn insert_author_key(&mut self, key: AuthorKey) -> bool {
        self.authors.insert(key)
    }

    pub(super) fn remove_author_key(&mut self, key: AuthorKey) -> bool {
        self.authors.remove(&key)
    }

    pub(crate) fn hydrate_authors(&mut self, keys: impl IntoIterator<Item = AuthorKey>) {
        self.authors.extend(keys);
    }

    pub(crate) fn take_authors(&mut self) -> BTreeSet<AuthorKey> {
        std::mem::take(&mut self.authors)
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.isbn == other.isbn
    }
}

impl Eq for Book {}

impl Hash for Book {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.isbn.hash(state);
    }
}

impl Display for Book {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ISBN: {}, Title: {}, Edition: {}, Copyright: {}",
            self.isbn, self.title, self.edition_number, self.copyright
        )
    }
}

fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
