//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Map catalog entities to and from `books`, `authors` and `book_authors`.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce entity `validate()` before persistence.
//! - Fetch APIs return `Ok(None)` for a missing key, distinct from `Err`.
//! - Every failure is logged at this boundary before it is returned.

pub mod association_repo;
pub mod author_repo;
pub mod book_repo;
pub mod catalog_repo;
pub mod error;
