//! Symmetric Book↔Author link routines.
//!
//! Both `Book::associate` and `Author::associate` land here, so each side is
//! written exactly once per call and no mirror call is ever re-entered.

use crate::model::author::Author;
use crate::model::book::Book;

/// Adds the pair to both sides. Returns `true` if either side changed.
pub(crate) fn link(book: &mut Book, author: &mut Author) -> bool {
    let forward = book.insert_author_key(author.key());
    let backward = author.insert_book_key(book.isbn());
    forward || backward
}

/// Removes the pair from both sides. Returns `true` if either side changed.
pub(crate) fn unlink(book: &mut Book, author: &mut Author) -> bool {
    let forward = book.remove_author_key(author.key());
    let backward = author.remove_book_key(book.isbn());
    forward || backward
}
