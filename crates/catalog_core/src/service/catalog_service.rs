//! Catalog use-case service.
//!
//! # Responsibility
//! - Validate free-form caller input before any storage call.
//! - Orchestrate entity association and repository writes for compound
//!   operations in a fixed order.
//! - Classify failures into validation, not-found, constraint and storage
//!   errors for presentation layers.
//!
//! # Invariants
//! - Book creation writes authors first, then the book, then relation rows,
//!   all inside one unit of work; a failure leaves nothing durable.
//! - An existing ISBN is rejected before any write.
//! - Edits apply only non-blank fields and never upsert.

use crate::model::author::{Author, AuthorId, AuthorPatch};
use crate::model::book::{Book, BookPatch, Isbn};
use crate::model::catalog::Catalog;
use crate::model::validation::ModelValidationError;
use crate::repo::catalog_repo::{CatalogRepository, UnitOfWork};
use crate::repo::error::{RecordKey, RepoError, RepoResult};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static FULL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(\S+)\s*(.*)$").expect("valid full name regex"));

/// Coarse failure class reported to presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    NotFound,
    ConstraintViolation,
    StorageUnavailable,
    Internal,
}

/// Service error for catalog use-cases.
#[derive(Debug)]
pub enum CatalogServiceError {
    /// Blank or malformed input; no storage call was made.
    Validation(ModelValidationError),
    /// A book with this ISBN already exists.
    DuplicateIsbn(Isbn),
    BookNotFound(Isbn),
    AuthorNotFound(AuthorId),
    /// Storage rejected a write (duplicate key, foreign key, trigger).
    ConstraintViolation(RepoError),
    /// Storage could not be reached or stayed locked past the busy timeout.
    StorageUnavailable(RepoError),
    /// Any other persistence-layer failure.
    Repo(RepoError),
}

impl CatalogServiceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::BookNotFound(_) | Self::AuthorNotFound(_) => FailureKind::NotFound,
            Self::DuplicateIsbn(_) | Self::ConstraintViolation(_) => {
                FailureKind::ConstraintViolation
            }
            Self::StorageUnavailable(_) => FailureKind::StorageUnavailable,
            Self::Repo(_) => FailureKind::Internal,
        }
    }
}

impl Display for CatalogServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateIsbn(isbn) => write!(f, "a book with isbn {isbn} already exists"),
            Self::BookNotFound(isbn) => write!(f, "book not found: {isbn}"),
            Self::AuthorNotFound(id) => write!(f, "author not found: {id}"),
            Self::ConstraintViolation(err) | Self::StorageUnavailable(err) | Self::Repo(err) => {
                write!(f, "{err}")
            }
        }
    }
}

impl Error for CatalogServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::ConstraintViolation(err) | Self::StorageUnavailable(err) | Self::Repo(err) => {
                Some(err)
            }
            _ => None,
        }
    }
}

impl From<ModelValidationError> for CatalogServiceError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for CatalogServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(RecordKey::Book(isbn)) => Self::BookNotFound(isbn),
            RepoError::NotFound(RecordKey::Author(id)) => Self::AuthorNotFound(id),
            err @ RepoError::ConstraintViolation(_) => Self::ConstraintViolation(err),
            err @ RepoError::StorageUnavailable(_) => Self::StorageUnavailable(err),
            other => Self::Repo(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, CatalogServiceError>;

/// Raw book fields as typed by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFields {
    pub isbn: String,
    pub title: String,
    /// Decimal text; parsed and checked to be positive.
    pub edition_number: String,
    pub copyright: String,
}

/// Request to create a book with any mix of existing and new authors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBook {
    pub fields: BookFields,
    /// Ids (decimal text) of authors that already exist.
    pub existing_author_ids: Vec<String>,
    /// Free-text full names of authors to create.
    pub new_author_names: Vec<String>,
}

/// Raw partial book edit. `None` or blank keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookEdit {
    pub title: Option<String>,
    pub edition_number: Option<String>,
    pub copyright: Option<String>,
}

/// Result of a successful book creation.
#[derive(Debug, Clone)]
pub struct CreatedBook {
    /// Persisted book; every author key is a stored key.
    pub book: Book,
    /// Existing and newly created authors, each associated with `book`.
    pub authors: Vec<Author>,
}

/// Catalog service facade over repository implementations.
pub struct CatalogService<R: CatalogRepository + UnitOfWork> {
    repo: R,
}

impl<R: CatalogRepository + UnitOfWork> CatalogService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Creates a book together with one brand-new author.
    ///
    /// # Contract
    /// - All fields, including `author_name`, must be non-blank.
    /// - Fails with `DuplicateIsbn` when the ISBN exists.
    /// - Author row, book row and relation row commit together or not at all.
    pub fn create_book_with_author(
        &self,
        fields: &BookFields,
        author_name: &str,
    ) -> ServiceResult<CreatedBook> {
        if author_name.trim().is_empty() {
            return Err(ModelValidationError::BlankField("author").into());
        }
        self.create_book(&NewBook {
            fields: fields.clone(),
            existing_author_ids: Vec::new(),
            new_author_names: vec![author_name.to_string()],
        })
    }

    /// Creates a book with existing and/or new authors.
    ///
    /// # Contract
    /// - Input is fully validated before the first storage call.
    /// - Existing authors must be found, otherwise `AuthorNotFound`.
    /// - Writes run in order: new authors, book, relation rows, inside one
    ///   unit of work.
    pub fn create_book(&self, request: &NewBook) -> ServiceResult<CreatedBook> {
        let mut book = parse_book_fields(&request.fields)?;
        let existing_ids = request
            .existing_author_ids
            .iter()
            .map(String::as_str)
            .map(parse_author_id)
            .collect::<Result<BTreeSet<_>, _>>()?;
        let mut new_authors = request
            .new_author_names
            .iter()
            .map(|name| split_full_name(name).map(|(first, last)| Author::new(first, last)))
            .collect::<Result<Vec<_>, _>>()?;

        if self.repo.get_book(book.isbn())?.is_some() {
            return Err(CatalogServiceError::DuplicateIsbn(book.isbn().to_string()));
        }

        let mut existing_authors = Vec::with_capacity(existing_ids.len());
        for id in &existing_ids {
            let author = self
                .repo
                .get_author(*id)?
                .ok_or(CatalogServiceError::AuthorNotFound(*id))?;
            existing_authors.push(author);
        }

        for author in existing_authors.iter_mut().chain(new_authors.iter_mut()) {
            book.associate(author);
        }

        self.repo.unit_of_work("create_book", |repo| {
            persist_new_book(repo, &mut book, &mut new_authors, &existing_ids)
        })?;

        info!(
            "event=create_book module=service status=ok isbn={} existing_authors={} new_authors={}",
            book.isbn(),
            existing_authors.len(),
            new_authors.len()
        );

        existing_authors.append(&mut new_authors);
        Ok(CreatedBook {
            book,
            authors: existing_authors,
        })
    }

    /// Creates one author from a free-text full name.
    ///
    /// The name is split at the first whitespace run; see `split_full_name`.
    pub fn create_author(&self, full_name: &str) -> ServiceResult<Author> {
        let (first_name, last_name) = split_full_name(full_name)?;
        let mut author = Author::new(first_name, last_name);
        let id = self.repo.insert_author(&mut author)?;
        info!("event=create_author module=service status=ok author_id={id}");
        Ok(author)
    }

    /// Applies a partial edit to an existing book.
    ///
    /// # Contract
    /// - A present, non-blank `edition_number` must parse to a positive number.
    /// - Missing book is `BookNotFound`; storage failures keep their class.
    pub fn edit_book(&self, isbn: &str, edit: &BookEdit) -> ServiceResult<Book> {
        let isbn = require_field("isbn", isbn)?;
        let patch = BookPatch {
            title: edit.title.clone(),
            edition_number: edit
                .edition_number
                .as_deref()
                .filter(|raw| !raw.trim().is_empty())
                .map(parse_edition)
                .transpose()?,
            copyright: edit.copyright.clone(),
        };

        let mut book = self
            .repo
            .get_book(&isbn)?
            .ok_or_else(|| CatalogServiceError::BookNotFound(isbn.clone()))?;
        book.apply_patch(&patch);
        self.repo.update_book(&book)?;
        Ok(book)
    }

    /// Applies a partial edit to an existing author.
    pub fn edit_author(&self, author_id: &str, patch: &AuthorPatch) -> ServiceResult<Author> {
        let id = parse_author_id(author_id)?;
        let mut author = self
            .repo
            .get_author(id)?
            .ok_or(CatalogServiceError::AuthorNotFound(id))?;
        author.apply_patch(patch);
        self.repo.update_author(&author)?;
        Ok(author)
    }

    /// Associates an existing author with an existing book.
    ///
    /// Returns `false` when the pair was already linked.
    pub fn link_author(&self, isbn: &str, author_id: &str) -> ServiceResult<bool> {
        let isbn = require_field("isbn", isbn)?;
        let id = parse_author_id(author_id)?;

        if self.repo.get_book(&isbn)?.is_none() {
            return Err(CatalogServiceError::BookNotFound(isbn));
        }
        if self.repo.get_author(id)?.is_none() {
            return Err(CatalogServiceError::AuthorNotFound(id));
        }
        Ok(self.repo.link(&isbn, id)?)
    }

    pub fn get_book(&self, isbn: &str) -> ServiceResult<Option<Book>> {
        Ok(self.repo.get_book(isbn.trim())?)
    }

    pub fn get_author(&self, author_id: &str) -> ServiceResult<Option<Author>> {
        let id = parse_author_id(author_id)?;
        Ok(self.repo.get_author(id)?)
    }

    pub fn list_books(&self) -> ServiceResult<Vec<Book>> {
        Ok(self.repo.list_books()?)
    }

    pub fn list_authors(&self) -> ServiceResult<Vec<Author>> {
        Ok(self.repo.list_authors()?)
    }

    /// Loads the whole catalog as an associated in-memory graph.
    pub fn catalog(&self) -> ServiceResult<Catalog> {
        Ok(self.repo.load_catalog()?)
    }
}

fn persist_new_book(
    repo: &dyn CatalogRepository,
    book: &mut Book,
    new_authors: &mut [Author],
    existing_ids: &BTreeSet<AuthorId>,
) -> RepoResult<()> {
    let mut author_ids = existing_ids.iter().copied().collect::<Vec<_>>();
    for author in new_authors.iter_mut() {
        let draft = author.key();
        let id = repo.insert_author(author)?;
        book.adopt_author_id(author, draft)?;
        author_ids.push(id);
    }

    repo.insert_book(book)?;

    for id in author_ids {
        repo.link(book.isbn(), id)?;
    }
    Ok(())
}

/// Splits a free-text full name into `(first_name, last_name)`.
///
/// Policy: the first whitespace-delimited token is the first name and the
/// trimmed remainder is the last name; a single token yields an empty last
/// name. Multi-part first names are not recognized.
pub fn split_full_name(full_name: &str) -> Result<(String, String), ModelValidationError> {
    let trimmed = full_name.trim();
    let captures = FULL_NAME_RE
        .captures(trimmed)
        .ok_or(ModelValidationError::BlankField("author name"))?;
    let first = captures.get(1).map_or("", |m| m.as_str());
    let rest = captures.get(2).map_or("", |m| m.as_str().trim());
    Ok((first.to_string(), rest.to_string()))
}

/// Parses an edition number that must be a positive integer.
pub fn parse_edition(raw: &str) -> Result<u32, ModelValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ModelValidationError::BlankField("edition_number"));
    }
    let value = trimmed
        .parse::<i64>()
        .map_err(|_| ModelValidationError::NotANumber {
            field: "edition_number",
            value: trimmed.to_string(),
        })?;
    if value <= 0 {
        return Err(ModelValidationError::NonPositiveEdition);
    }
    u32::try_from(value).map_err(|_| ModelValidationError::NotANumber {
        field: "edition_number",
        value: trimmed.to_string(),
    })
}

/// Parses a positive author id.
pub fn parse_author_id(raw: &str) -> Result<AuthorId, ModelValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ModelValidationError::BlankField("author_id"));
    }
    let id = trimmed
        .parse::<AuthorId>()
        .map_err(|_| ModelValidationError::NotANumber {
            field: "author_id",
            value: trimmed.to_string(),
        })?;
    if id <= 0 {
        return Err(ModelValidationError::InvalidAuthorId(id));
    }
    Ok(id)
}

fn parse_book_fields(fields: &BookFields) -> Result<Book, ModelValidationError> {
    let isbn = require_field("isbn", &fields.isbn)?;
    let title = require_field("title", &fields.title)?;
    let edition_number = parse_edition(&fields.edition_number)?;
    let copyright = require_field("copyright", &fields.copyright)?;
    Ok(Book::new(isbn, title, edition_number, copyright))
}

fn require_field(field: &'static str, value: &str) -> Result<String, ModelValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModelValidationError::BlankField(field));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{parse_author_id, parse_edition, split_full_name};
    use crate::model::validation::ModelValidationError;

    #[test]
    fn split_full_name_uses_first_token_as_first_name() {
        assert_eq!(
            split_full_name("Joshua Bloch").unwrap(),
            ("Joshua".to_string(), "Bloch".to_string())
        );
        assert_eq!(
            split_full_name("  Ludwig   van Beethoven ").unwrap(),
            ("Ludwig".to_string(), "van Beethoven".to_string())
        );
    }

    #[test]
    fn split_full_name_single_token_has_empty_last_name() {
        assert_eq!(
            split_full_name("Plato").unwrap(),
            ("Plato".to_string(), String::new())
        );
    }

    #[test]
    fn split_full_name_rejects_blank() {
        assert_eq!(
            split_full_name("   "),
            Err(ModelValidationError::BlankField("author name"))
        );
    }

    #[test]
    fn parse_edition_checks_sign_and_format() {
        assert_eq!(parse_edition(" 3 ").unwrap(), 3);
        assert_eq!(
            parse_edition("0"),
            Err(ModelValidationError::NonPositiveEdition)
        );
        assert!(matches!(
            parse_edition("third"),
            Err(ModelValidationError::NotANumber { .. })
        ));
    }

    #[test]
    fn parse_author_id_rejects_non_positive() {
        assert_eq!(parse_author_id("12").unwrap(), 12);
        assert_eq!(
            parse_author_id("-1"),
            Err(ModelValidationError::InvalidAuthorId(-1))
        );
        assert!(matches!(
            parse_author_id("x"),
            Err(ModelValidationError::NotANumber { .. })
        ));
    }
}
