//! Author repository contract and SQLite row mapping.
//!
//! # Responsibility
//! - Provide insert/update/fetch APIs over the `authors` table.
//! - Hand storage-generated ids back to the caller's `Author`.
//!
//! # Invariants
//! - `insert_author` accepts only unpersisted authors and always writes the
//!   generated id back on success.
//! - `Author::books` is populated by joining through `book_authors`.

use crate::model::author::{Author, AuthorId};
use crate::repo::association_repo::{isbns_for_author, links_by_author};
use crate::repo::error::{RecordKey, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const AUTHOR_SELECT_SQL: &str = "SELECT
    author_id,
    first_name,
    last_name
FROM authors";

/// Repository interface for author rows.
pub trait AuthorRepository {
    /// Inserts an unpersisted author and assigns the generated id to it.
    ///
    /// Books already linked to the author still hold its draft key; move
    /// them over with `Book::adopt_author_id`.
    fn insert_author(&self, author: &mut Author) -> RepoResult<AuthorId>;
    /// Updates names by id. Never inserts.
    fn update_author(&self, author: &Author) -> RepoResult<()>;
    /// Fetches one author with its ISBNs; `Ok(None)` when absent.
    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>>;
    /// Lists all authors ordered by id; empty when none exist.
    fn list_authors(&self) -> RepoResult<Vec<Author>>;
}

pub(crate) fn insert_author(conn: &Connection, author: &mut Author) -> RepoResult<AuthorId> {
    if author.is_persisted() {
        return Err(RepoError::AlreadyPersisted(RecordKey::Author(author.id())));
    }
    author.validate()?;

    let generated: Option<AuthorId> = conn
        .query_row(
            "INSERT INTO authors (first_name, last_name)
             VALUES (?1, ?2)
             RETURNING author_id;",
            params![author.first_name.as_str(), author.last_name.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    let id = generated.ok_or_else(|| {
        RepoError::MissingGeneratedKey(RecordKey::Author(author.id()))
    })?;
    author.assign_id(id)?;
    Ok(id)
}

pub(crate) fn update_author(conn: &Connection, author: &Author) -> RepoResult<()> {
    if !author.is_persisted() {
        return Err(RepoError::NotFound(RecordKey::Author(author.id())));
    }
    author.validate()?;

    let changed = conn.execute(
        "UPDATE authors
         SET
            first_name = ?1,
            last_name = ?2
         WHERE author_id = ?3;",
        params![
            author.first_name.as_str(),
            author.last_name.as_str(),
            author.id(),
        ],
    )?;

    if changed == 0 {
        return Err(RepoError::NotFound(RecordKey::Author(author.id())));
    }
    Ok(())
}

pub(crate) fn get_author(conn: &Connection, id: AuthorId) -> RepoResult<Option<Author>> {
    let mut stmt = conn.prepare(&format!("{AUTHOR_SELECT_SQL} WHERE author_id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let mut author = parse_author_row(row)?;
    author.hydrate_books(isbns_for_author(conn, id)?);
    Ok(Some(author))
}

pub(crate) fn list_authors(conn: &Connection) -> RepoResult<Vec<Author>> {
    let mut links = links_by_author(conn)?;
    let mut stmt = conn.prepare(&format!("{AUTHOR_SELECT_SQL} ORDER BY author_id ASC;"))?;
    let mut rows = stmt.query([])?;
    let mut authors = Vec::new();

    while let Some(row) = rows.next()? {
        let mut author = parse_author_row(row)?;
        if let Some(isbns) = links.remove(&author.id()) {
            author.hydrate_books(isbns);
        }
        authors.push(author);
    }

    Ok(authors)
}

fn parse_author_row(row: &Row<'_>) -> RepoResult<Author> {
    let id: AuthorId = row.get("author_id")?;
    let author = Author::with_id(
        id,
        row.get::<_, String>("first_name")?,
        row.get::<_, String>("last_name")?,
    )
    .map_err(|err| RepoError::InvalidData(format!("authors.author_id: {err}")))?;
    author
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("authors row {id}: {err}")))?;
    Ok(author)
}
