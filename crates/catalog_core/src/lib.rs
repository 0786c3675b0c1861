//! Core domain logic for the book catalog.
//! This crate is the single source of truth for catalog invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CatalogConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::author::{Author, AuthorId, AuthorKey, AuthorPatch, UNSET_AUTHOR_ID};
pub use model::book::{Book, BookPatch, Isbn};
pub use model::catalog::{Catalog, CatalogError};
pub use model::validation::ModelValidationError;
pub use repo::association_repo::AssociationRepository;
pub use repo::author_repo::AuthorRepository;
pub use repo::book_repo::BookRepository;
pub use repo::catalog_repo::{
    BoundCatalogRepository, CatalogRepository, SqliteCatalogRepository, UnitOfWork,
};
pub use repo::error::{RecordKey, RepoError, RepoResult};
pub use service::catalog_service::{
    split_full_name, BookEdit, BookFields, CatalogService, CatalogServiceError, CreatedBook,
    FailureKind, NewBook, ServiceResult,
};
pub use service::response::ActionResponse;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
