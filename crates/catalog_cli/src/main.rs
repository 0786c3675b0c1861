//! Command-line front end for the book catalog.
//!
//! # Responsibility
//! - Map positional arguments onto `CatalogService` calls.
//! - Render `ActionResponse` envelopes and catalog listings as plain text.
//!
//! Configuration comes from `BOOK_CATALOG_DB_PATH`,
//! `BOOK_CATALOG_BUSY_TIMEOUT_MS` and, optionally, `BOOK_CATALOG_LOG_DIR`.

use catalog_core::{
    default_log_level, init_logging, ActionResponse, AuthorPatch, BookEdit, BookFields,
    CatalogConfig, CatalogService, NewBook, SqliteCatalogRepository,
};
use log::{info, warn};
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "BOOK_CATALOG_LOG_DIR";
const SEPARATOR: &str = "------------------------------";

const USAGE: &str = "usage:
  catalog_cli books
  catalog_cli authors
  catalog_cli add-book <isbn> <title> <edition> <copyright> <author full name>
  catalog_cli add-book <isbn> <title> <edition> <copyright> [--id <author id>]... [--name <full name>]...
  catalog_cli add-author <full name>
  catalog_cli edit-book <isbn> <title|-> <edition|-> <copyright|->
  catalog_cli edit-author <author id> <first name|-> <last name|->
  catalog_cli link <isbn> <author id>";

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let service = CatalogService::new(SqliteCatalogRepository::new(CatalogConfig::from_env()));

    let command = args.first().map_or("", String::as_str);
    match run(&service, &args) {
        Some(true) => {
            info!("event=cli_command module=cli status=ok command={command}");
            ExitCode::SUCCESS
        }
        Some(false) => {
            warn!("event=cli_command module=cli status=error command={command}");
            ExitCode::FAILURE
        }
        None => {
            eprintln!("{USAGE}");
            ExitCode::from(2)
        }
    }
}

/// Returns `None` when the arguments do not match any command.
fn run(service: &CatalogService<SqliteCatalogRepository>, args: &[String]) -> Option<bool> {
    let words = args.iter().map(String::as_str).collect::<Vec<_>>();
    let response = match words.as_slice() {
        ["books"] => return Some(print_books(service)),
        ["authors"] => return Some(print_authors(service)),
        ["add-book", isbn, title, edition, copyright, author] if !author.starts_with("--") => {
            ActionResponse::from_result(
                service.create_book_with_author(
                    &book_fields(isbn, title, edition, copyright),
                    author,
                ),
                "Book and author added successfully.",
                |created| created.book.isbn().to_string(),
            )
        }
        ["add-book", isbn, title, edition, copyright, options @ ..] => {
            let (existing_author_ids, new_author_names) = author_options(options)?;
            let request = NewBook {
                fields: book_fields(isbn, title, edition, copyright),
                existing_author_ids,
                new_author_names,
            };
            ActionResponse::from_result(
                service.create_book(&request),
                "Book added successfully.",
                |created| created.book.isbn().to_string(),
            )
        }
        ["add-author", name @ ..] if !name.is_empty() => ActionResponse::from_result(
            service.create_author(&name.join(" ")),
            "Author added successfully.",
            |author| author.id().to_string(),
        ),
        ["edit-book", isbn, title, edition, copyright] => {
            let edit = BookEdit {
                title: keep_or(title),
                edition_number: keep_or(edition),
                copyright: keep_or(copyright),
            };
            ActionResponse::from_result(
                service.edit_book(isbn, &edit),
                "Book updated successfully.",
                |book| book.isbn().to_string(),
            )
        }
        ["edit-author", id, first_name, last_name] => {
            let patch = AuthorPatch {
                first_name: keep_or(first_name),
                last_name: keep_or(last_name),
            };
            ActionResponse::from_result(
                service.edit_author(id, &patch),
                "Author updated successfully.",
                |author| author.id().to_string(),
            )
        }
        ["link", isbn, id] => ActionResponse::from_result(
            service.link_author(isbn, id),
            "Author linked to book.",
            |_| isbn.to_string(),
        ),
        _ => return None,
    };

    if response.ok {
        println!("{}", response.message);
    } else {
        eprintln!("{}", response.message);
    }
    Some(response.ok)
}

fn print_books(service: &CatalogService<SqliteCatalogRepository>) -> bool {
    let catalog = match service.catalog() {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("Could not load books: {err}");
            return false;
        }
    };
    if catalog.book_count() == 0 {
        println!("No books found.");
    }
    for book in catalog.books() {
        if let Some(text) = catalog.describe_book(book.isbn()) {
            println!("{text}\n{SEPARATOR}");
        }
    }
    true
}

fn print_authors(service: &CatalogService<SqliteCatalogRepository>) -> bool {
    let catalog = match service.catalog() {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("Could not load authors: {err}");
            return false;
        }
    };
    if catalog.author_count() == 0 {
        println!("No authors found.");
    }
    for author in catalog.authors() {
        if let Some(text) = catalog.describe_author(author.key()) {
            println!("{text}\n{SEPARATOR}");
        }
    }
    true
}

fn book_fields(isbn: &str, title: &str, edition: &str, copyright: &str) -> BookFields {
    BookFields {
        isbn: isbn.to_string(),
        title: title.to_string(),
        edition_number: edition.to_string(),
        copyright: copyright.to_string(),
    }
}

/// Splits `--id <id>` and `--name <full name>` pairs into existing author ids
/// and new author names. Returns `None` on a dangling or unknown flag.
fn author_options(options: &[&str]) -> Option<(Vec<String>, Vec<String>)> {
    let mut ids = Vec::new();
    let mut names = Vec::new();
    for pair in options.chunks(2) {
        match pair {
            ["--id", id] => ids.push(id.to_string()),
            ["--name", name] => names.push(name.to_string()),
            _ => return None,
        }
    }
    Some((ids, names))
}

/// `-` means "keep the current value".
fn keep_or(value: &str) -> Option<String> {
    (value != "-").then(|| value.to_string())
}
