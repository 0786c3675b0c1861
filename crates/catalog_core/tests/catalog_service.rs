use catalog_core::db::connect;
use catalog_core::{
    ActionResponse, Author, AuthorKey, AuthorPatch, BookEdit, BookFields, BookRepository,
    CatalogConfig, CatalogService, CatalogServiceError, FailureKind, ModelValidationError,
    NewBook, RepoError, SqliteCatalogRepository,
};
use std::time::Duration;
use tempfile::TempDir;

fn service_in(dir: &TempDir) -> CatalogService<SqliteCatalogRepository> {
    CatalogService::new(SqliteCatalogRepository::new(config_in(dir)))
}

fn config_in(dir: &TempDir) -> CatalogConfig {
    CatalogConfig::new(dir.path().join("catalog.db"))
}

fn fields(isbn: &str, title: &str, edition: &str, copyright: &str) -> BookFields {
    BookFields {
        isbn: isbn.to_string(),
        title: title.to_string(),
        edition_number: edition.to_string(),
        copyright: copyright.to_string(),
    }
}

fn effective_java() -> BookFields {
    fields("978-0-13-468599-1", "Effective Java", "3", "2018")
}

fn row_count(dir: &TempDir, table: &str) -> i64 {
    let conn = connect(&config_in(dir)).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn create_book_with_author_persists_all_three_rows() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);

    let created = service
        .create_book_with_author(&effective_java(), "Joshua Bloch")
        .unwrap();

    assert_eq!(created.authors.len(), 1);
    let author = &created.authors[0];
    assert!(author.is_persisted());
    assert_eq!(author.first_name, "Joshua");
    assert_eq!(author.last_name, "Bloch");
    assert!(author.has_book("978-0-13-468599-1"));
    assert!(created.book.has_author(author.key()));
    assert!(created.book.authors().iter().all(|key| !key.is_draft()));

    let stored = service.get_book("978-0-13-468599-1").unwrap().unwrap();
    assert!(stored.has_author(AuthorKey::Stored(author.id())));
    assert_eq!(row_count(&dir, "books"), 1);
    assert_eq!(row_count(&dir, "authors"), 1);
    assert_eq!(row_count(&dir, "book_authors"), 1);
}

#[test]
fn failed_relation_write_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);

    let conn = connect(&config_in(&dir)).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_links BEFORE INSERT ON book_authors
         BEGIN
            SELECT RAISE(ABORT, 'simulated link failure');
         END;",
    )
    .unwrap();
    drop(conn);

    let err = service
        .create_book_with_author(&effective_java(), "Joshua Bloch")
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::ConstraintViolation);

    assert_eq!(row_count(&dir, "books"), 0);
    assert_eq!(row_count(&dir, "authors"), 0);
    assert_eq!(row_count(&dir, "book_authors"), 0);
}

#[test]
fn locked_database_is_reported_as_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir).with_busy_timeout(Duration::from_millis(50));
    let service = CatalogService::new(SqliteCatalogRepository::new(config.clone()));

    let holder = connect(&config).unwrap();
    holder.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    let err = service
        .create_book_with_author(&effective_java(), "Joshua Bloch")
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::StorageUnavailable);
    assert!(matches!(
        err,
        CatalogServiceError::StorageUnavailable(RepoError::StorageUnavailable(_))
    ));

    holder.execute_batch("ROLLBACK;").unwrap();
    drop(holder);
    assert_eq!(row_count(&dir, "books"), 0);
    assert_eq!(row_count(&dir, "authors"), 0);
}

#[test]
fn edits_store_trimmed_text() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    service
        .create_book_with_author(&effective_java(), "Joshua Bloch")
        .unwrap();
    let author = service.list_authors().unwrap().remove(0);

    service
        .edit_book(
            "978-0-13-468599-1",
            &BookEdit {
                title: Some("  Effective Java  ".to_string()),
                ..BookEdit::default()
            },
        )
        .unwrap();
    service
        .edit_author(
            &author.id().to_string(),
            &AuthorPatch {
                first_name: Some(" Josh ".to_string()),
                last_name: None,
            },
        )
        .unwrap();

    let book = service.get_book("978-0-13-468599-1").unwrap().unwrap();
    assert_eq!(book.title, "Effective Java");
    let stored = service
        .get_author(&author.id().to_string())
        .unwrap()
        .unwrap();
    assert_eq!(stored.full_name(), "Josh Bloch");
}

#[test]
fn duplicate_isbn_is_rejected_without_changes() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    service
        .create_book_with_author(&effective_java(), "Joshua Bloch")
        .unwrap();

    let err = service
        .create_book_with_author(
            &fields("978-0-13-468599-1", "Impostor", "1", "1999"),
            "Someone Else",
        )
        .unwrap_err();

    assert!(matches!(err, CatalogServiceError::DuplicateIsbn(ref isbn) if isbn == "978-0-13-468599-1"));
    assert_eq!(err.kind(), FailureKind::ConstraintViolation);
    let kept = service.get_book("978-0-13-468599-1").unwrap().unwrap();
    assert_eq!(kept.title, "Effective Java");
    assert_eq!(row_count(&dir, "authors"), 1);
}

#[test]
fn invalid_input_fails_before_storage() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);

    let blank_author = service
        .create_book_with_author(&effective_java(), "   ")
        .unwrap_err();
    assert!(matches!(
        blank_author,
        CatalogServiceError::Validation(ModelValidationError::BlankField("author"))
    ));

    let bad_edition = service
        .create_book_with_author(
            &fields("111", "Title", "first", "2020"),
            "Joshua Bloch",
        )
        .unwrap_err();
    assert!(matches!(
        bad_edition,
        CatalogServiceError::Validation(ModelValidationError::NotANumber { .. })
    ));

    let zero_edition = service
        .create_book_with_author(&fields("111", "Title", "0", "2020"), "Joshua Bloch")
        .unwrap_err();
    assert!(matches!(
        zero_edition,
        CatalogServiceError::Validation(ModelValidationError::NonPositiveEdition)
    ));

    let blank_title = service
        .create_book_with_author(&fields("111", " ", "1", "2020"), "Joshua Bloch")
        .unwrap_err();
    assert_eq!(blank_title.kind(), FailureKind::Validation);

    assert!(service.list_books().unwrap().is_empty());
    assert!(service.list_authors().unwrap().is_empty());
}

#[test]
fn create_book_mixes_existing_and_new_authors() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    let bloch = service.create_author("Joshua Bloch").unwrap();

    let created = service
        .create_book(&NewBook {
            fields: fields("978-0-321-35668-0", "Java Puzzlers", "1", "2005"),
            existing_author_ids: vec![bloch.id().to_string()],
            new_author_names: vec!["Neal Gafter".to_string()],
        })
        .unwrap();

    assert_eq!(created.authors.len(), 2);
    assert_eq!(created.book.authors().len(), 2);

    let catalog = service.catalog().unwrap();
    assert!(catalog.is_symmetric());
    let names = catalog
        .authors_of("978-0-321-35668-0")
        .unwrap()
        .into_iter()
        .map(Author::full_name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Joshua Bloch", "Neal Gafter"]);
}

#[test]
fn create_book_with_unknown_existing_author_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);

    let err = service
        .create_book(&NewBook {
            fields: effective_java(),
            existing_author_ids: vec!["41".to_string()],
            new_author_names: vec!["Joshua Bloch".to_string()],
        })
        .unwrap_err();

    assert!(matches!(err, CatalogServiceError::AuthorNotFound(41)));
    assert_eq!(row_count(&dir, "books"), 0);
    assert_eq!(row_count(&dir, "authors"), 0);
}

#[test]
fn create_author_splits_full_name() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);

    let author = service.create_author("  Ludwig van Beethoven ").unwrap();
    assert!(author.is_persisted());

    let loaded = service
        .get_author(&author.id().to_string())
        .unwrap()
        .unwrap();
    assert_eq!(loaded.first_name, "Ludwig");
    assert_eq!(loaded.last_name, "van Beethoven");

    let single = service.create_author("Plato").unwrap();
    assert_eq!(single.last_name, "");
    assert_eq!(single.full_name(), "Plato");
}

#[test]
fn edit_book_applies_only_non_blank_fields() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    service
        .create_book_with_author(&effective_java(), "Joshua Bloch")
        .unwrap();

    let edited = service
        .edit_book(
            "978-0-13-468599-1",
            &BookEdit {
                title: Some("  ".to_string()),
                edition_number: Some("4".to_string()),
                copyright: None,
            },
        )
        .unwrap();
    assert_eq!(edited.title, "Effective Java");
    assert_eq!(edited.edition_number, 4);

    let stored = service.get_book("978-0-13-468599-1").unwrap().unwrap();
    assert_eq!(stored.title, "Effective Java");
    assert_eq!(stored.edition_number, 4);
    assert_eq!(stored.copyright, "2018");
    assert_eq!(stored.authors().len(), 1);
}

#[test]
fn edit_book_rejects_bad_edition_and_missing_book() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    service
        .create_book_with_author(&effective_java(), "Joshua Bloch")
        .unwrap();

    let bad = service
        .edit_book(
            "978-0-13-468599-1",
            &BookEdit {
                edition_number: Some("-2".to_string()),
                ..BookEdit::default()
            },
        )
        .unwrap_err();
    assert_eq!(bad.kind(), FailureKind::Validation);
    let unchanged = service.get_book("978-0-13-468599-1").unwrap().unwrap();
    assert_eq!(unchanged.edition_number, 3);

    let missing = service
        .edit_book("000", &BookEdit::default())
        .unwrap_err();
    assert!(matches!(missing, CatalogServiceError::BookNotFound(ref isbn) if isbn == "000"));
    assert!(service.get_book("000").unwrap().is_none());
}

#[test]
fn edit_author_patches_names_and_never_upserts() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    let author = service.create_author("Josh Bloch").unwrap();
    let id = author.id().to_string();

    let edited = service
        .edit_author(
            &id,
            &AuthorPatch {
                first_name: Some("Joshua".to_string()),
                last_name: Some(String::new()),
            },
        )
        .unwrap();
    assert_eq!(edited.full_name(), "Joshua Bloch");

    let missing = service
        .edit_author("999", &AuthorPatch::default())
        .unwrap_err();
    assert!(matches!(missing, CatalogServiceError::AuthorNotFound(999)));
    assert_eq!(service.list_authors().unwrap().len(), 1);

    let malformed = service
        .edit_author("abc", &AuthorPatch::default())
        .unwrap_err();
    assert_eq!(malformed.kind(), FailureKind::Validation);
}

#[test]
fn link_author_connects_existing_records_once() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    let created = service
        .create_book_with_author(&effective_java(), "Joshua Bloch")
        .unwrap();
    let gafter = service.create_author("Neal Gafter").unwrap();
    let gafter_id = gafter.id().to_string();

    assert!(service.link_author("978-0-13-468599-1", &gafter_id).unwrap());
    assert!(!service.link_author("978-0-13-468599-1", &gafter_id).unwrap());

    let book = service
        .repository()
        .get_book(created.book.isbn())
        .unwrap()
        .unwrap();
    assert_eq!(book.authors().len(), 2);

    let missing_book = service.link_author("000", &gafter_id).unwrap_err();
    assert_eq!(missing_book.kind(), FailureKind::NotFound);
    let missing_author = service
        .link_author("978-0-13-468599-1", "999")
        .unwrap_err();
    assert!(matches!(missing_author, CatalogServiceError::AuthorNotFound(999)));
}

#[test]
fn catalog_describes_books_and_authors() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    let created = service
        .create_book_with_author(&effective_java(), "Joshua Bloch")
        .unwrap();

    let catalog = service.catalog().unwrap();
    let book_text = catalog.describe_book("978-0-13-468599-1").unwrap();
    assert_eq!(
        book_text,
        "ISBN: 978-0-13-468599-1, Title: Effective Java, Edition: 3, Copyright: 2018\nAuthors: Joshua Bloch"
    );

    let author_key = created.authors[0].key();
    let author_text = catalog.describe_author(author_key).unwrap();
    assert!(author_text.ends_with("\nBooks: Effective Java (978-0-13-468599-1)"));
}

#[test]
fn action_response_wraps_service_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);

    let ok = ActionResponse::from_result(
        service.create_book_with_author(&effective_java(), "Joshua Bloch"),
        "Book and author added successfully.",
        |created| created.book.isbn().to_string(),
    );
    assert!(ok.ok);
    assert_eq!(ok.key.as_deref(), Some("978-0-13-468599-1"));

    let duplicate = ActionResponse::from_result(
        service.create_book_with_author(&effective_java(), "Joshua Bloch"),
        "unused",
        |created| created.book.isbn().to_string(),
    );
    assert!(!duplicate.ok);
    assert_eq!(duplicate.failure, Some(FailureKind::ConstraintViolation));
    assert!(duplicate.message.contains("978-0-13-468599-1"));
}

#[test]
fn entities_serialize_with_serde() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    let created = service
        .create_book_with_author(&effective_java(), "Joshua Bloch")
        .unwrap();

    let book_json = serde_json::to_value(&created.book).unwrap();
    assert_eq!(book_json["isbn"], "978-0-13-468599-1");
    assert_eq!(book_json["edition_number"], 3);
    let author_key = &book_json["authors"][0];
    assert_eq!(author_key["kind"], "stored");
    assert_eq!(author_key["value"], created.authors[0].id());

    let author_json = serde_json::to_value(&created.authors[0]).unwrap();
    assert_eq!(author_json["first_name"], "Joshua");
    assert_eq!(author_json["books"][0], "978-0-13-468599-1");
}
