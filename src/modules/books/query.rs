//! Search predicates, ordering and pagination over the book table.

use rusqlite::types::Value;
use serde::Serialize;

use super::error::CatalogError;
use super::models::{Book, Genre, Status};

/// Books per page in list views.
pub const PAGE_SIZE: u32 = 10;

/// Filter applied when listing books.
///
/// Free text matches title, author, ISBN or publisher as a case-insensitive
/// substring; genre and status are exact matches. The three parts are
/// combined with AND and an absent part matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    text: Option<String>,
    genre: Option<Genre>,
    status: Option<Status>,
}

impl Predicate {
    /// Predicate matching every book.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn search(text: Option<&str>, genre: Option<Genre>, status: Option<Status>) -> Self {
        let text = text
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        Self {
            text,
            genre,
            status,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn genre(&self) -> Option<Genre> {
        self.genre
    }

    pub fn status(&self) -> Option<Status> {
        self.status
    }

    /// Evaluate the predicate in memory with the same semantics as the SQL
    /// form (ASCII case folding, like SQLite's `LIKE`).
    pub fn matches(&self, book: &Book) -> bool {
        if self.genre.is_some_and(|genre| genre != book.genre) {
            return false;
        }
        if self.status.is_some_and(|status| status != book.status) {
            return false;
        }
        let Some(text) = &self.text else {
            return true;
        };

        let needle = text.to_ascii_lowercase();
        [
            Some(book.title.as_str()),
            Some(book.author.as_str()),
            Some(book.isbn.as_str()),
            book.publisher.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_ascii_lowercase().contains(&needle))
    }

    /// Compile to a `WHERE` clause with numbered parameters starting at `?1`.
    pub(crate) fn to_sql(&self) -> SqlFilter {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(text) = &self.text {
            params.push(Value::Text(format!("%{}%", escape_like(text))));
            let n = params.len();
            clauses.push(format!(
                "(title LIKE ?{n} ESCAPE '\\' OR author LIKE ?{n} ESCAPE '\\' \
                 OR isbn LIKE ?{n} ESCAPE '\\' OR publisher LIKE ?{n} ESCAPE '\\')"
            ));
        }
        if let Some(genre) = self.genre {
            params.push(Value::Text(genre.as_str().to_string()));
            clauses.push(format!("genre = ?{}", params.len()));
        }
        if let Some(status) = self.status {
            params.push(Value::Text(status.as_str().to_string()));
            clauses.push(format!("status = ?{}", params.len()));
        }

        let clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        SqlFilter { clause, params }
    }
}

/// SQL form of a [`Predicate`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SqlFilter {
    /// Empty, or ` WHERE ...` with a leading space
    pub clause: String,
    pub params: Vec<Value>,
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Ordering of list results. Every ordering ends with `id` so pages are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookOrder {
    /// Title, then author
    #[default]
    TitleAuthor,
    /// Newest `date_added` first
    RecentlyAdded,
}

impl BookOrder {
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            Self::TitleAuthor => "title ASC, author ASC, id ASC",
            Self::RecentlyAdded => "date_added DESC, id DESC",
        }
    }
}

/// One page of results plus what pagination controls need.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, page: u32, total: u64) -> Self {
        let total_pages = total_pages(total);
        Self {
            items,
            page,
            page_size: PAGE_SIZE,
            total,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

/// Number of pages for `total` rows; an empty result still has page 1.
pub fn total_pages(total: u64) -> u32 {
    let pages = total.div_ceil(u64::from(PAGE_SIZE)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Row offset of `page`, or `PageNotFound` when the page does not exist.
pub(crate) fn page_offset(page: u32, total: u64) -> Result<u64, CatalogError> {
    if page == 0 || page > total_pages(total) {
        return Err(CatalogError::PageNotFound(page));
    }
    Ok(u64::from(page - 1) * u64::from(PAGE_SIZE))
}
