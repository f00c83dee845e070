//! Field-level checks for the book write path.
//!
//! Every rule runs; failures are collected so a form can show all of them
//! at once. ISBN uniqueness is delegated to an [`IsbnLookup`], which the
//! store implements over its connection.

use std::fmt;

use serde::Serialize;

use super::error::CatalogError;
use super::models::{BookId, BookInput, Genre, Status, WholeNumber};

pub const TITLE_MAX_CHARS: usize = 200;
pub const AUTHOR_MAX_CHARS: usize = 100;
pub const PUBLISHER_MAX_CHARS: usize = 100;
pub const ISBN_DIGITS: usize = 13;
pub const MIN_PUBLICATION_YEAR: i64 = 1000;
pub const MAX_PUBLICATION_YEAR: i64 = 2024;

const REQUIRED: &str = "This field is required.";
const NOT_A_NUMBER: &str = "Enter a whole number.";

/// A validation failure attached to one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All field errors found in one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// First error reported for `field`, if any.
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|error| error.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

/// Resolves a normalized ISBN to the book currently holding it.
pub trait IsbnLookup {
    fn isbn_owner(&self, isbn: &str) -> rusqlite::Result<Option<BookId>>;
}

/// A submission that passed every rule, ready to persist.
///
/// `genre` and `status` stay `None` when the caller left them out; the store
/// decides what an absent value means for create and for update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub genre: Option<Genre>,
    pub publisher: Option<String>,
    pub publication_year: i32,
    pub page_count: Option<u32>,
    pub description: Option<String>,
    pub status: Option<Status>,
}

/// Strip spaces and hyphens from an ISBN as typed.
pub fn normalize_isbn(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect()
}

/// Validate `input` for a new book (`current` is `None`) or for an update of
/// book `current`, whose own ISBN does not count as a duplicate.
pub fn validate(
    input: &BookInput,
    lookup: &dyn IsbnLookup,
    current: Option<BookId>,
) -> Result<ValidBook, CatalogError> {
    let mut errors = ValidationErrors::default();

    let title = required_text(&mut errors, "title", &input.title, TITLE_MAX_CHARS);
    let author = required_text(&mut errors, "author", &input.author, AUTHOR_MAX_CHARS);

    let isbn = isbn_format(&mut errors, &input.isbn);
    if let Some(isbn) = &isbn {
        if let Some(owner) = lookup.isbn_owner(isbn)? {
            if Some(owner) != current {
                errors.push("isbn", "A book with this ISBN already exists.");
            }
        }
    }

    let year = whole_number(&mut errors, "publication_year", input.publication_year.as_ref());
    let publication_year = match year {
        Some(None) => {
            errors.push("publication_year", REQUIRED);
            None
        }
        Some(Some(year)) if !(MIN_PUBLICATION_YEAR..=MAX_PUBLICATION_YEAR).contains(&year) => {
            errors.push(
                "publication_year",
                format!(
                    "Publication year must be between {MIN_PUBLICATION_YEAR} and {MAX_PUBLICATION_YEAR}."
                ),
            );
            None
        }
        // The range check above keeps the value well inside i32.
        Some(Some(year)) => Some(year as i32),
        None => None,
    };

    let page_count = match whole_number(&mut errors, "page_count", input.page_count.as_ref()) {
        None | Some(None) => None,
        Some(Some(count)) if count <= 0 => {
            errors.push("page_count", "Ensure this value is greater than 0.");
            None
        }
        Some(Some(count)) => match u32::try_from(count) {
            Ok(count) => Some(count),
            Err(_) => {
                errors.push(
                    "page_count",
                    format!("Ensure this value is less than or equal to {}.", u32::MAX),
                );
                None
            }
        },
    };

    let publisher = optional_text(input.publisher.as_deref());
    if let Some(publisher) = &publisher {
        check_length(&mut errors, "publisher", publisher, PUBLISHER_MAX_CHARS);
    }
    let description = optional_text(input.description.as_deref());

    let genre = choice(&mut errors, "genre", input.genre.as_deref(), Genre::from_code);
    let status = choice(&mut errors, "status", input.status.as_deref(), Status::from_code);

    match (title, author, isbn, publication_year) {
        (Some(title), Some(author), Some(isbn), Some(publication_year)) if errors.is_empty() => {
            Ok(ValidBook {
                title,
                author,
                isbn,
                genre,
                publisher,
                publication_year,
                page_count,
                description,
                status,
            })
        }
        _ => {
            tracing::debug!(book_id = ?current, errors = %errors, "book rejected");
            Err(CatalogError::Validation(errors))
        }
    }
}

fn required_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: &str,
    max_chars: usize,
) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        errors.push(field, REQUIRED);
        return None;
    }
    check_length(errors, field, value, max_chars).then(|| value.to_string())
}

fn check_length(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> bool {
    let chars = value.chars().count();
    if chars > max_chars {
        errors.push(
            field,
            format!("Ensure this value has at most {max_chars} characters (it has {chars})."),
        );
        return false;
    }
    true
}

/// `Some(None)` when the field is absent or blank, `None` when it holds
/// something other than a whole number (already reported).
fn whole_number(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&WholeNumber>,
) -> Option<Option<i64>> {
    let parsed = match raw {
        None => return Some(None),
        Some(WholeNumber::Integer(value)) => Some(*value),
        Some(WholeNumber::Text(text)) if text.trim().is_empty() => return Some(None),
        Some(WholeNumber::Text(text)) => text.trim().parse().ok(),
        Some(WholeNumber::Other(_)) => None,
    };
    if parsed.is_none() {
        errors.push(field, NOT_A_NUMBER);
    }
    parsed.map(Some)
}

fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn isbn_format(errors: &mut ValidationErrors, raw: &str) -> Option<String> {
    let isbn = normalize_isbn(raw);
    if isbn.is_empty() {
        errors.push("isbn", REQUIRED);
        return None;
    }
    if !isbn.chars().all(|c| c.is_ascii_digit()) {
        errors.push("isbn", "ISBN may only contain digits, spaces and hyphens.");
        return None;
    }
    if isbn.len() != ISBN_DIGITS {
        errors.push(
            "isbn",
            format!(
                "ISBN must contain exactly {ISBN_DIGITS} digits (it has {}).",
                isbn.len()
            ),
        );
        return None;
    }
    Some(isbn)
}

/// Blank counts as absent; anything else must parse.
fn choice<T>(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&str>,
    parse: fn(&str) -> Option<T>,
) -> Option<T> {
    let value = raw.map(str::trim).filter(|value| !value.is_empty())?;
    let parsed = parse(value);
    if parsed.is_none() {
        errors.push(
            field,
            format!("Select a valid choice. '{value}' is not one of the available choices."),
        );
    }
    parsed
}
