//! Book repository contract and SQLite row mapping.
//!
//! # Responsibility
//! - Provide insert/update/fetch APIs over the `books` table.
//! - Populate `Book::authors` by joining through `book_authors`.
//!
//! # Invariants
//! - Every statement targets the single `books` table.
//! - Write paths call `Book::validate()` before SQL mutations.
//! - `insert_book` writes the book row only; relation rows go through
//!   `AssociationRepository::link`.

use crate::model::author::AuthorKey;
use crate::model::book::Book;
use crate::repo::association_repo::{author_ids_for_book, links_by_book};
use crate::repo::error::{RecordKey, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const BOOK_SELECT_SQL: &str = "SELECT
    isbn,
    title,
    edition_number,
    copyright
FROM books";

/// Repository interface for book rows.
pub trait BookRepository {
    /// Inserts a new book row. A duplicate ISBN is a constraint violation.
    fn insert_book(&self, book: &Book) -> RepoResult<()>;
    /// Updates title, edition and copyright by ISBN. Never inserts.
    fn update_book(&self, book: &Book) -> RepoResult<()>;
    /// Fetches one book with its author keys; `Ok(None)` when absent.
    fn get_book(&self, isbn: &str) -> RepoResult<Option<Book>>;
    /// Lists all books ordered by ISBN; empty when none exist.
    fn list_books(&self) -> RepoResult<Vec<Book>>;
}

pub(crate) fn insert_book(conn: &Connection, book: &Book) -> RepoResult<()> {
    book.validate()?;

    conn.execute(
        "INSERT INTO books (isbn, title, edition_number, copyright)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            book.isbn(),
            book.title.as_str(),
            book.edition_number,
            book.copyright.as_str(),
        ],
    )?;
    Ok(())
}

pub(crate) fn update_book(conn: &Connection, book: &Book) -> RepoResult<()> {
    book.validate()?;

    let changed = conn.execute(
        "UPDATE books
         SET
            title = ?1,
            edition_number = ?2,
            copyright = ?3
         WHERE isbn = ?4;",
        params![
            book.title.as_str(),
            book.edition_number,
            book.copyright.as_str(),
            book.isbn(),
        ],
    )?;

    if changed == 0 {
        return Err(RepoError::NotFound(RecordKey::Book(book.isbn().to_string())));
    }
    Ok(())
}

pub(crate) fn get_book(conn: &Connection, isbn: &str) -> RepoResult<Option<Book>> {
    let mut stmt = conn.prepare(&format!("{BOOK_SELECT_SQL} WHERE isbn = ?1;"))?;
    let mut rows = stmt.query([isbn])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let mut book = parse_book_row(row)?;
    let author_ids = author_ids_for_book(conn, isbn)?;
    book.hydrate_authors(author_ids.into_iter().map(AuthorKey::Stored));
    Ok(Some(book))
}

pub(crate) fn list_books(conn: &Connection) -> RepoResult<Vec<Book>> {
    let mut links = links_by_book(conn)?;
    let mut stmt = conn.prepare(&format!("{BOOK_SELECT_SQL} ORDER BY isbn ASC;"))?;
    let mut rows = stmt.query([])?;
    let mut books = Vec::new();

    while let Some(row) = rows.next()? {
        let mut book = parse_book_row(row)?;
        if let Some(author_ids) = links.remove(book.isbn()) {
            book.hydrate_authors(author_ids.into_iter().map(AuthorKey::Stored));
        }
        books.push(book);
    }

    Ok(books)
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let isbn: String = row.get("isbn")?;
    let edition_raw: i64 = row.get("edition_number")?;
    let edition_number = u32::try_from(edition_raw).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid edition_number `{edition_raw}` in books.edition_number for isbn `{isbn}`"
        ))
    })?;

    let book = Book::new(
        isbn,
        row.get::<_, String>("title")?,
        edition_number,
        row.get::<_, String>("copyright")?,
    );
    book.validate().map_err(|err| {
        RepoError::InvalidData(format!("books row for isbn `{}`: {err}", book.isbn()))
    })?;
    Ok(book)
}
