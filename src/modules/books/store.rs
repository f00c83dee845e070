//! SQLite-backed book store.

use chrono::Utc;
use libris_db::Database;
use rusqlite::{
    params, params_from_iter,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Value, ValueRef},
    Connection, OptionalExtension, Row, ToSql,
};

use super::error::CatalogError;
use super::models::{Book, BookId, BookInput, CatalogSummary, Genre, Status, StatusCount};
use super::query::{page_offset, BookOrder, Page, Predicate, PAGE_SIZE};
use super::validation::{validate, IsbnLookup, ValidationErrors};

/// Number of books shown in the summary's "recently added" list.
pub const RECENT_LIMIT: u32 = 5;

const BOOK_COLUMNS: &str = "id, title, author, isbn, genre, publisher, publication_year, \
     page_count, description, status, date_added, date_modified";

/// Persistent collection of books.
#[derive(Clone)]
pub struct BookStore {
    pub(super) db: Database,
}

impl BookStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Validate `input` and insert it as a new book.
    pub fn create(&self, input: &BookInput) -> Result<Book, CatalogError> {
        self.db.with_conn(|conn| {
            let book = validate(input, &*conn, None)?;
            let now = Utc::now();

            let inserted = conn.execute(
                "INSERT INTO books (title, author, isbn, genre, publisher, publication_year, \
                 page_count, description, status, date_added, date_modified) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    book.title,
                    book.author,
                    book.isbn,
                    book.genre.unwrap_or_default(),
                    book.publisher,
                    book.publication_year,
                    book.page_count,
                    book.description,
                    book.status.unwrap_or_default(),
                    now.date_naive(),
                    now,
                ],
            );
            unique_isbn(inserted)?;

            let id = conn.last_insert_rowid();
            tracing::info!(book_id = id, isbn = %book.isbn, "book created");
            fetch(conn, id)
        })
    }

    pub fn get(&self, id: BookId) -> Result<Book, CatalogError> {
        self.db.with_conn(|conn| fetch(conn, id))
    }

    /// Replace every editable field of book `id`.
    ///
    /// `genre` and `status` left out of `input` keep their current values;
    /// `date_added` never changes.
    pub fn update(&self, id: BookId, input: &BookInput) -> Result<Book, CatalogError> {
        self.db.with_conn(|conn| {
            let current = fetch(conn, id)?;
            let book = validate(input, &*conn, Some(id))?;

            let updated = conn.execute(
                "UPDATE books SET title = ?1, author = ?2, isbn = ?3, genre = ?4, publisher = ?5, \
                 publication_year = ?6, page_count = ?7, description = ?8, status = ?9, \
                 date_modified = ?10 WHERE id = ?11",
                params![
                    book.title,
                    book.author,
                    book.isbn,
                    book.genre.unwrap_or(current.genre),
                    book.publisher,
                    book.publication_year,
                    book.page_count,
                    book.description,
                    book.status.unwrap_or(current.status),
                    Utc::now(),
                    id,
                ],
            );
            unique_isbn(updated)?;

            tracing::info!(book_id = id, "book updated");
            fetch(conn, id)
        })
    }

    pub fn delete(&self, id: BookId) -> Result<(), CatalogError> {
        self.db.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;
            if deleted == 0 {
                return Err(CatalogError::NotFound(id));
            }
            tracing::info!(book_id = id, "book deleted");
            Ok(())
        })
    }

    /// One page of the books matching `predicate`, 1-based.
    pub fn list(
        &self,
        predicate: &Predicate,
        order: BookOrder,
        page: u32,
    ) -> Result<Page<Book>, CatalogError> {
        let filter = predicate.to_sql();

        self.db.with_conn(|conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM books{}", filter.clause),
                params_from_iter(filter.params.iter()),
                |row| row.get(0),
            )?;
            let total = u64::try_from(total).unwrap_or_default();
            let offset = page_offset(page, total)?;

            let limit_at = filter.params.len() + 1;
            let sql = format!(
                "SELECT {BOOK_COLUMNS} FROM books{} ORDER BY {} LIMIT ?{} OFFSET ?{}",
                filter.clause,
                order.sql(),
                limit_at,
                limit_at + 1,
            );

            let mut params = filter.params.clone();
            params.push(Value::Integer(i64::from(PAGE_SIZE)));
            params.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));

            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(params_from_iter(params.iter()), book_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            tracing::debug!(
                search = predicate.text(),
                genre = predicate.genre().map(|g| g.as_str()),
                status = predicate.status().map(|s| s.as_str()),
                page,
                total,
                "books listed"
            );
            Ok(Page::new(items, page, total))
        })
    }

    /// Counts per status plus the most recently added books.
    pub fn summary(&self) -> Result<CatalogSummary, CatalogError> {
        self.db.with_conn(|conn| {
            let mut counts = std::collections::HashMap::new();
            let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM books GROUP BY status")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, Status>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (status, count) = row?;
                counts.insert(status, u64::try_from(count).unwrap_or_default());
            }

            let by_status: Vec<StatusCount> = Status::ALL
                .into_iter()
                .map(|status| StatusCount {
                    status,
                    label: status.label(),
                    count: counts.get(&status).copied().unwrap_or(0),
                })
                .collect();
            let total = by_status.iter().map(|entry| entry.count).sum();

            let mut stmt = conn.prepare(&format!(
                "SELECT {BOOK_COLUMNS} FROM books ORDER BY {} LIMIT ?1",
                BookOrder::RecentlyAdded.sql()
            ))?;
            let recently_added = stmt
                .query_map(params![RECENT_LIMIT], book_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(CatalogSummary {
                total,
                by_status,
                recently_added,
            })
        })
    }
}

impl IsbnLookup for Connection {
    fn isbn_owner(&self, isbn: &str) -> rusqlite::Result<Option<BookId>> {
        self.query_row("SELECT id FROM books WHERE isbn = ?1", params![isbn], |row| {
            row.get(0)
        })
        .optional()
    }
}

pub(super) fn fetch(conn: &Connection, id: BookId) -> Result<Book, CatalogError> {
    conn.query_row(
        &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
        params![id],
        book_from_row,
    )
    .optional()?
    .ok_or(CatalogError::NotFound(id))
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        isbn: row.get(3)?,
        genre: row.get(4)?,
        publisher: row.get(5)?,
        publication_year: row.get(6)?,
        page_count: row.get(7)?,
        description: row.get(8)?,
        status: row.get(9)?,
        date_added: row.get(10)?,
        date_modified: row.get(11)?,
    })
}

/// A write that lost a race on the ISBN index reports the same field error
/// the validator would have.
fn unique_isbn(result: rusqlite::Result<usize>) -> Result<usize, CatalogError> {
    match result {
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Err(CatalogError::Validation(ValidationErrors::single(
                "isbn",
                "A book with this ISBN already exists.",
            )))
        }
        other => Ok(other?),
    }
}

impl ToSql for Genre {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Genre {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_str()?;
        Genre::from_code(code)
            .ok_or_else(|| FromSqlError::Other(format!("unknown genre '{code}'").into()))
    }
}

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_str()?;
        Status::from_code(code)
            .ok_or_else(|| FromSqlError::Other(format!("unknown status '{code}'").into()))
    }
}
