//! In-memory catalog graph keyed by ISBN and author key.
//!
//! # Responsibility
//! - Hold books and authors as an arena, with relations stored as keys
//!   rather than bidirectional references.
//! - Resolve keys for association, re-keying and listing use-cases.
//!
//! # Invariants
//! - Every key in `Book::authors` names an author in the arena and vice versa.
//! - Relations to entities outside the arena are dropped on insert.
//! - Promoting a draft author re-keys every book that referenced it.

use crate::model::author::{Author, AuthorId, AuthorKey};
use crate::model::book::{Book, Isbn};
use crate::model::validation::ModelValidationError;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from catalog arena operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    UnknownBook(Isbn),
    UnknownAuthor(AuthorKey),
    DuplicateBook(Isbn),
    DuplicateAuthor(AuthorKey),
    Validation(ModelValidationError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownBook(isbn) => write!(f, "book not in catalog: {isbn}"),
            Self::UnknownAuthor(key) => write!(f, "author not in catalog: {key}"),
            Self::DuplicateBook(isbn) => write!(f, "book already in catalog: {isbn}"),
            Self::DuplicateAuthor(key) => write!(f, "author already in catalog: {key}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for CatalogError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Arena of books and authors.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    books: BTreeMap<Isbn, Book>,
    authors: BTreeMap<AuthorKey, Author>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a book and links it to any referenced authors already present.
    pub fn insert_book(&mut self, mut book: Book) -> Result<(), CatalogError> {
        if self.books.contains_key(book.isbn()) {
            return Err(CatalogError::DuplicateBook(book.isbn().to_string()));
        }

        let referenced = book.take_authors();
        let isbn = book.isbn().to_string();
        self.books.insert(isbn.clone(), book);
        for key in referenced {
            if self.authors.contains_key(&key) {
                self.associate(&isbn, key)?;
            }
        }
        Ok(())
    }

    /// Adds an author and links it to any referenced books already present.
    ///
    /// Returns the key the author is stored under.
    pub fn insert_author(&mut self, mut author: Author) -> Result<AuthorKey, CatalogError> {
        let key = author.key();
        if self.authors.contains_key(&key) {
            return Err(CatalogError::DuplicateAuthor(key));
        }

        let referenced = author.take_books();
        self.authors.insert(key, author);
        for isbn in referenced {
            if self.books.contains_key(&isbn) {
                self.associate(&isbn, key)?;
            }
        }
        Ok(key)
    }

    pub fn book(&self, isbn: &str) -> Option<&Book> {
        self.books.get(isbn)
    }

    pub fn author(&self, key: AuthorKey) -> Option<&Author> {
        self.authors.get(&key)
    }

    /// Books ordered by ISBN.
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    /// Authors ordered by key (stored ids first, then drafts).
    pub fn authors(&self) -> impl Iterator<Item = &Author> {
        self.authors.values()
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    pub fn author_count(&self) -> usize {
        self.authors.len()
    }

    /// Associates two arena members. Returns `false` if already linked.
    pub fn associate(&mut self, isbn: &str, key: AuthorKey) -> Result<bool, CatalogError> {
        let (book, author) = self.pair_mut(isbn, key)?;
        Ok(book.associate(author))
    }

    /// Removes an association. Returns `false` if the pair was not linked.
    pub fn dissociate(&mut self, isbn: &str, key: AuthorKey) -> Result<bool, CatalogError> {
        let (book, author) = self.pair_mut(isbn, key)?;
        Ok(book.dissociate(author))
    }

    /// Assigns a storage id to a draft author and re-keys its books.
    pub fn promote_author(
        &mut self,
        draft: AuthorKey,
        id: AuthorId,
    ) -> Result<AuthorKey, CatalogError> {
        let stored = AuthorKey::Stored(id);
        if self.authors.contains_key(&stored) {
            return Err(CatalogError::DuplicateAuthor(stored));
        }
        let mut author = self
            .authors
            .remove(&draft)
            .ok_or(CatalogError::UnknownAuthor(draft))?;

        if let Err(err) = author.assign_id(id) {
            self.authors.insert(draft, author);
            return Err(err.into());
        }

        for isbn in author.books() {
            if let Some(book) = self.books.get_mut(isbn) {
                book.rekey_author(draft, stored);
            }
        }
        self.authors.insert(stored, author);
        Ok(stored)
    }

    /// Authors of one book, ordered by key.
    pub fn authors_of(&self, isbn: &str) -> Result<Vec<&Author>, CatalogError> {
        let book = self
            .books
            .get(isbn)
            .ok_or_else(|| CatalogError::UnknownBook(isbn.to_string()))?;
        Ok(book
            .authors()
            .iter()
            .filter_map(|key| self.authors.get(key))
            .collect())
    }

    /// Books of one author, ordered by ISBN.
    pub fn books_of(&self, key: AuthorKey) -> Result<Vec<&Book>, CatalogError> {
        let author = self
            .authors
            .get(&key)
            .ok_or(CatalogError::UnknownAuthor(key))?;
        Ok(author
            .books()
            .iter()
            .filter_map(|isbn| self.books.get(isbn))
            .collect())
    }

    /// Checks `a ∈ b.authors ⟺ b ∈ a.books` over the whole arena.
    pub fn is_symmetric(&self) -> bool {
        let books_ok = self.books.values().all(|book| {
            book.authors().iter().all(|key| {
                self.authors
                    .get(key)
                    .is_some_and(|author| author.has_book(book.isbn()))
            })
        });
        let authors_ok = self.authors.values().all(|author| {
            author.books().iter().all(|isbn| {
                self.books
                    .get(isbn)
                    .is_some_and(|book| book.has_author(author.key()))
            })
        });
        books_ok && authors_ok
    }

    /// Renders a book followed by an `Authors:` line when it has any.
    pub fn describe_book(&self, isbn: &str) -> Option<String> {
        let book = self.books.get(isbn)?;
        let mut text = book.to_string();
        let names = book
            .authors()
            .iter()
            .filter_map(|key| self.authors.get(key))
            .map(|author| format!("{} {}", author.first_name, author.last_name))
            .collect::<Vec<_>>();
        if !names.is_empty() {
            text.push_str("\nAuthors: ");
            text.push_str(&names.join(", "));
        }
        Some(text)
    }

    /// Renders an author followed by a `Books:` line when it has any.
    pub fn describe_author(&self, key: AuthorKey) -> Option<String> {
        let author = self.authors.get(&key)?;
        let mut text = author.to_string();
        let titles = author
            .books()
            .iter()
            .filter_map(|isbn| self.books.get(isbn))
            .map(|book| format!("{} ({})", book.title, book.isbn()))
            .collect::<Vec<_>>();
        if !titles.is_empty() {
            text.push_str("\nBooks: ");
            text.push_str(&titles.join(", "));
        }
        Some(text)
    }

    fn pair_mut(
        &mut self,
        isbn: &str,
        key: AuthorKey,
    ) -> Result<(&mut Book, &mut Author), CatalogError> {
        let book = self
            .books
            .get_mut(isbn)
            .ok_or_else(|| CatalogError::UnknownBook(isbn.to_string()))?;
        let author = self
            .authors
            .get_mut(&key)
            .ok_or(CatalogError::UnknownAuthor(key))?;
        Ok((book, author))
    }
}

#[cfg(test)]
mod tests {
    use super::{Catalog, CatalogError};
    use crate::model::author::{Author, AuthorKey};
    use crate::model::book::Book;

    fn sample() -> (Catalog, AuthorKey) {
        let mut catalog = Catalog::new();
        catalog
            .insert_book(Book::new("111", "Title", 1, "2020"))
            .unwrap();
        let key = catalog
            .insert_author(Author::new("Ada", "Lovelace"))
            .unwrap();
        (catalog, key)
    }

    #[test]
    fn associate_by_key_keeps_symmetry() {
        let (mut catalog, key) = sample();
        assert!(catalog.associate("111", key).unwrap());
        assert!(!catalog.associate("111", key).unwrap());
        assert!(catalog.is_symmetric());
        assert_eq!(catalog.authors_of("111").unwrap().len(), 1);
        assert_eq!(catalog.books_of(key).unwrap().len(), 1);
    }

    #[test]
    fn associate_unknown_members_fails() {
        let (mut catalog, key) = sample();
        assert_eq!(
            catalog.associate("999", key),
            Err(CatalogError::UnknownBook("999".to_string()))
        );
        assert_eq!(
            catalog.associate("111", AuthorKey::Stored(42)),
            Err(CatalogError::UnknownAuthor(AuthorKey::Stored(42)))
        );
    }

    #[test]
    fn promote_author_rekeys_books() {
        let (mut catalog, draft) = sample();
        catalog.associate("111", draft).unwrap();

        let stored = catalog.promote_author(draft, 5).unwrap();
        assert_eq!(stored, AuthorKey::Stored(5));
        assert!(catalog.author(draft).is_none());
        assert!(catalog.book("111").unwrap().has_author(stored));
        assert!(catalog.is_symmetric());
    }

    #[test]
    fn promote_author_twice_is_rejected_and_keeps_record() {
        let (mut catalog, draft) = sample();
        let stored = catalog.promote_author(draft, 5).unwrap();

        let err = catalog.promote_author(stored, 6).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert!(catalog.author(stored).is_some());
    }

    #[test]
    fn insert_links_relations_to_present_members_only() {
        let mut book = Book::new("111", "Title", 1, "2020");
        let mut author = Author::with_id(1, "Ada", "Lovelace").unwrap();
        let mut orphan_book = Book::new("222", "Orphan", 1, "2021");
        book.associate(&mut author);
        author.associate(&mut orphan_book);

        let mut catalog = Catalog::new();
        catalog.insert_book(book).unwrap();
        let key = catalog.insert_author(author).unwrap();

        assert_eq!(catalog.books_of(key).unwrap().len(), 1);
        assert!(catalog.is_symmetric());
    }

    #[test]
    fn describe_lists_related_names() {
        let (mut catalog, key) = sample();
        catalog.associate("111", key).unwrap();

        let book = catalog.describe_book("111").unwrap();
        assert_eq!(
            book,
            "ISBN: 111, Title: Title, Edition: 1, Copyright: 2020\nAuthors: Ada Lovelace"
        );
        let author = catalog.describe_author(key).unwrap();
        assert!(author.ends_with("\nBooks: Title (111)"));
    }
}
