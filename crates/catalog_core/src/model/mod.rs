//! Catalog entity model.
//!
//! # Responsibility
//! - Define `Book` and `Author` records and their identity keys.
//! - Keep the Book↔Author association symmetric under every mutation.
//!
//! # Invariants
//! - `a ∈ b.authors ⟺ b ∈ a.books` for every book `b` and author `a`.
//! - Relations are stored as keys (ISBN, `AuthorKey`), never as references.
//! - Nothing in this module performs I/O.

mod association;
pub mod author;
pub mod book;
pub mod catalog;
pub mod validation;
