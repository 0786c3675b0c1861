//! SQLite-backed catalog repositories and unit-of-work boundary.
//!
//! # Responsibility
//! - Give every repository call its own scoped connection.
//! - Run compound writes inside one immediate transaction.
//! - Log every failed call with operation name and key.
//!
//! # Invariants
//! - `SqliteCatalogRepository` never holds a connection between calls.
//! - A unit of work commits only when its closure returns `Ok`; any error
//!   rolls back every statement it issued.

use crate::config::CatalogConfig;
use crate::db::connect;
use crate::model::author::{Author, AuthorId};
use crate::model::book::{Book, Isbn};
use crate::model::catalog::Catalog;
use crate::repo::association_repo::{self, AssociationRepository};
use crate::repo::author_repo::{self, AuthorRepository};
use crate::repo::book_repo::{self, BookRepository};
use crate::repo::error::{RecordKey, RepoError, RepoResult};
use log::{debug, error, info, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::time::Instant;

/// Full repository surface used by the catalog service.
pub trait CatalogRepository: BookRepository + AuthorRepository + AssociationRepository {
    /// Loads every book, author and relation into one consistent arena.
    fn load_catalog(&self) -> RepoResult<Catalog>;
}

/// Transaction boundary for compound writes.
pub trait UnitOfWork {
    /// Runs `work` against a repository bound to one transaction.
    ///
    /// Commits when `work` returns `Ok`, rolls back otherwise. The error
    /// returned by `work` is passed through unchanged.
    fn unit_of_work<T, F>(&self, operation: &'static str, work: F) -> RepoResult<T>
    where
        F: FnOnce(&dyn CatalogRepository) -> RepoResult<T>;
}

/// Supplies a SQLite connection to one repository call.
pub trait SqliteSource {
    fn with_conn<T>(
        &self,
        operation: &'static str,
        key: &RecordKey,
        work: impl FnOnce(&Connection) -> RepoResult<T>,
    ) -> RepoResult<T>;
}

/// Repository that opens a fresh connection for every call.
#[derive(Debug, Clone)]
pub struct SqliteCatalogRepository {
    config: CatalogConfig,
}

impl SqliteCatalogRepository {
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }
}

impl SqliteSource for SqliteCatalogRepository {
    fn with_conn<T>(
        &self,
        operation: &'static str,
        key: &RecordKey,
        work: impl FnOnce(&Connection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let result = connect(&self.config)
            .map_err(RepoError::from)
            .and_then(|conn| work(&conn));
        log_outcome(operation, key, &result);
        result
    }
}

impl UnitOfWork for SqliteCatalogRepository {
    fn unit_of_work<T, F>(&self, operation: &'static str, work: F) -> RepoResult<T>
    where
        F: FnOnce(&dyn CatalogRepository) -> RepoResult<T>,
    {
        let started_at = Instant::now();
        let result = connect(&self.config)
            .map_err(RepoError::from)
            .and_then(|mut conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let outcome = work(&BoundCatalogRepository::new(&tx));
                match outcome {
                    Ok(value) => {
                        tx.commit()?;
                        Ok(value)
                    }
                    Err(err) => {
                        if let Err(rollback_err) = tx.rollback() {
                            error!(
                                "event=unit_of_work module=repo status=error op={operation} error_code=rollback_failed error={rollback_err}"
                            );
                        }
                        Err(err)
                    }
                }
            });

        match &result {
            Ok(_) => info!(
                "event=unit_of_work module=repo status=ok op={operation} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=unit_of_work module=repo status=rolled_back op={operation} duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }
        result
    }
}

/// Repository bound to a caller-owned connection or open transaction.
pub struct BoundCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> BoundCatalogRepository<'conn> {
    /// Binds to a migrated connection, e.g. one from `open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SqliteSource for BoundCatalogRepository<'_> {
    fn with_conn<T>(
        &self,
        operation: &'static str,
        key: &RecordKey,
        work: impl FnOnce(&Connection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let result = work(self.conn);
        log_outcome(operation, key, &result);
        result
    }
}

impl<S: SqliteSource> BookRepository for S {
    fn insert_book(&self, book: &Book) -> RepoResult<()> {
        let key = RecordKey::Book(book.isbn().to_string());
        self.with_conn("insert_book", &key, |conn| book_repo::insert_book(conn, book))
    }

    fn update_book(&self, book: &Book) -> RepoResult<()> {
        let key = RecordKey::Book(book.isbn().to_string());
        self.with_conn("update_book", &key, |conn| book_repo::update_book(conn, book))
    }

    fn get_book(&self, isbn: &str) -> RepoResult<Option<Book>> {
        let key = RecordKey::Book(isbn.to_string());
        self.with_conn("get_book", &key, |conn| book_repo::get_book(conn, isbn))
    }

    fn list_books(&self) -> RepoResult<Vec<Book>> {
        self.with_conn("list_books", &RecordKey::All, book_repo::list_books)
    }
}

impl<S: SqliteSource> AuthorRepository for S {
    fn insert_author(&self, author: &mut Author) -> RepoResult<AuthorId> {
        let key = RecordKey::Author(author.id());
        self.with_conn("insert_author", &key, |conn| {
            author_repo::insert_author(conn, author)
        })
    }

    fn update_author(&self, author: &Author) -> RepoResult<()> {
        let key = RecordKey::Author(author.id());
        self.with_conn("update_author", &key, |conn| {
            author_repo::update_author(conn, author)
        })
    }

    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>> {
        self.with_conn("get_author", &RecordKey::Author(id), |conn| {
            author_repo::get_author(conn, id)
        })
    }

    fn list_authors(&self) -> RepoResult<Vec<Author>> {
        self.with_conn("list_authors", &RecordKey::All, author_repo::list_authors)
    }
}

impl<S: SqliteSource> AssociationRepository for S {
    fn link(&self, isbn: &str, author_id: AuthorId) -> RepoResult<bool> {
        let key = link_key(isbn, author_id);
        self.with_conn("link", &key, |conn| {
            association_repo::link(conn, isbn, author_id)
        })
    }

    fn unlink(&self, isbn: &str, author_id: AuthorId) -> RepoResult<bool> {
        let key = link_key(isbn, author_id);
        self.with_conn("unlink", &key, |conn| {
            association_repo::unlink(conn, isbn, author_id)
        })
    }

    fn author_ids_for_book(&self, isbn: &str) -> RepoResult<Vec<AuthorId>> {
        let key = RecordKey::Book(isbn.to_string());
        self.with_conn("author_ids_for_book", &key, |conn| {
            association_repo::author_ids_for_book(conn, isbn)
        })
    }

    fn isbns_for_author(&self, author_id: AuthorId) -> RepoResult<Vec<Isbn>> {
        self.with_conn("isbns_for_author", &RecordKey::Author(author_id), |conn| {
            association_repo::isbns_for_author(conn, author_id)
        })
    }
}

impl<S: SqliteSource> CatalogRepository for S {
    fn load_catalog(&self) -> RepoResult<Catalog> {
        self.with_conn("load_catalog", &RecordKey::All, load_catalog)
    }
}

fn load_catalog(conn: &Connection) -> RepoResult<Catalog> {
    let books = book_repo::list_books(conn)?;
    let authors = author_repo::list_authors(conn)?;

    let mut catalog = Catalog::new();
    for book in books {
        catalog
            .insert_book(book)
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;
    }
    for author in authors {
        catalog
            .insert_author(author)
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;
    }
    Ok(catalog)
}

fn link_key(isbn: &str, author_id: AuthorId) -> RecordKey {
    RecordKey::Link {
        isbn: isbn.to_string(),
        author_id,
    }
}

fn log_outcome<T>(operation: &'static str, key: &RecordKey, result: &RepoResult<T>) {
    match result {
        Ok(_) => debug!("event=repo_call module=repo status=ok op={operation} {key}"),
        Err(err @ (RepoError::NotFound(_) | RepoError::Validation(_))) => warn!(
            "event=repo_call module=repo status=error op={operation} {key} error_code={} error={}",
            err.code(),
            err
        ),
        Err(err) => error!(
            "event=repo_call module=repo status=error op={operation} {key} error_code={} error={}",
            err.code(),
            err
        ),
    }
}
