//! Book↔Author relation table access.
//!
//! # Responsibility
//! - Persist and remove `(isbn, author_id)` pairs in `book_authors`.
//! - Resolve either side of the relation for read paths.
//!
//! # Invariants
//! - A pair is stored at most once (composite primary key).
//! - Both ends must exist (foreign keys); deleting either end cascades.

use crate::model::author::AuthorId;
use crate::model::book::Isbn;
use crate::repo::error::RepoResult;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;

/// Repository interface for the relation table.
pub trait AssociationRepository {
    /// Stores the pair. Returns `false` when it already existed.
    fn link(&self, isbn: &str, author_id: AuthorId) -> RepoResult<bool>;
    /// Removes the pair. Returns `false` when it did not exist.
    fn unlink(&self, isbn: &str, author_id: AuthorId) -> RepoResult<bool>;
    /// Ids of existing authors linked to `isbn`, ascending.
    fn author_ids_for_book(&self, isbn: &str) -> RepoResult<Vec<AuthorId>>;
    /// ISBNs of existing books linked to `author_id`, ascending.
    fn isbns_for_author(&self, author_id: AuthorId) -> RepoResult<Vec<Isbn>>;
}

pub(crate) fn link(conn: &Connection, isbn: &str, author_id: AuthorId) -> RepoResult<bool> {
    // OR IGNORE covers only the primary key; foreign key and trigger failures
    // still surface as constraint violations.
    let changed = conn.execute(
        "INSERT OR IGNORE INTO book_authors (isbn, author_id) VALUES (?1, ?2);",
        params![isbn, author_id],
    )?;
    Ok(changed == 1)
}

pub(crate) fn unlink(conn: &Connection, isbn: &str, author_id: AuthorId) -> RepoResult<bool> {
    let changed = conn.execute(
        "DELETE FROM book_authors WHERE isbn = ?1 AND author_id = ?2;",
        params![isbn, author_id],
    )?;
    Ok(changed == 1)
}

pub(crate) fn author_ids_for_book(conn: &Connection, isbn: &str) -> RepoResult<Vec<AuthorId>> {
    let mut stmt = conn.prepare(
        "SELECT a.author_id
         FROM book_authors ba
         INNER JOIN authors a ON a.author_id = ba.author_id
         WHERE ba.isbn = ?1
         ORDER BY a.author_id ASC;",
    )?;
    let mut rows = stmt.query([isbn])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

pub(crate) fn isbns_for_author(conn: &Connection, author_id: AuthorId) -> RepoResult<Vec<Isbn>> {
    let mut stmt = conn.prepare(
        "SELECT b.isbn
         FROM book_authors ba
         INNER JOIN books b ON b.isbn = ba.isbn
         WHERE ba.author_id = ?1
         ORDER BY b.isbn ASC;",
    )?;
    let mut rows = stmt.query([author_id])?;
    let mut isbns = Vec::new();
    while let Some(row) = rows.next()? {
        isbns.push(row.get(0)?);
    }
    Ok(isbns)
}

/// All pairs grouped by ISBN, for list paths.
pub(crate) fn links_by_book(conn: &Connection) -> RepoResult<BTreeMap<Isbn, Vec<AuthorId>>> {
    let mut grouped: BTreeMap<Isbn, Vec<AuthorId>> = BTreeMap::new();
    for (isbn, author_id) in all_links(conn)? {
        grouped.entry(isbn).or_default().push(author_id);
    }
    Ok(grouped)
}

/// All pairs grouped by author id, for list paths.
pub(crate) fn links_by_author(conn: &Connection) -> RepoResult<BTreeMap<AuthorId, Vec<Isbn>>> {
    let mut grouped: BTreeMap<AuthorId, Vec<Isbn>> = BTreeMap::new();
    for (isbn, author_id) in all_links(conn)? {
        grouped.entry(author_id).or_default().push(isbn);
    }
    Ok(grouped)
}

fn all_links(conn: &Connection) -> RepoResult<Vec<(Isbn, AuthorId)>> {
    let mut stmt = conn.prepare(
        "SELECT isbn, author_id
         FROM book_authors
         ORDER BY isbn ASC, author_id ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut links = Vec::new();
    while let Some(row) = rows.next()? {
        links.push((row.get("isbn")?, row.get("author_id")?));
    }
    Ok(links)
}
