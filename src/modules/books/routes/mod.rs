//! JSON endpoints of the books module, mounted under `/api/books`.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use libris_http::error::AppError;
use serde::{Deserialize, Serialize};

use super::error::CatalogError;
use super::models::{Book, BookId, BookInput, CatalogSummary, Genre, Status};
use super::query::{BookOrder, Page, Predicate};
use super::status::StatusOutcome;
use super::store::BookStore;

pub fn router(store: BookStore) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/summary", get(summary))
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/{id}/status", post(change_status))
        .with_state(store)
}

/// Query string of the list view. Empty values mean "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
}

/// Filters echoed back so the caller can redisplay them.
#[derive(Debug, Serialize)]
pub struct EchoedFilters {
    pub search: String,
    pub genre: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct BookListResponse {
    #[serde(flatten)]
    pub page: Page<Book>,
    pub filters: EchoedFilters,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusChangeRequest {
    #[serde(default)]
    pub status: String,
}

/// Run a blocking store call off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CatalogError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("store task failed")))?
        .map_err(AppError::from)
}

fn choice_filter<T>(
    field: &str,
    raw: Option<&str>,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, AppError> {
    match raw.filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => parse(value)
            .map(Some)
            .ok_or_else(|| AppError::bad_request(format!("Unknown {field} '{value}'"))),
    }
}

/// A path id that is not a number names no book.
fn book_id(id: Result<Path<BookId>, PathRejection>) -> Result<BookId, AppError> {
    id.map(|Path(id)| id)
        .map_err(|_| AppError::not_found("Book not found"))
}

fn page_number(raw: Option<&str>) -> Result<u32, AppError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(1),
        Some(value) => value
            .parse()
            .map_err(|_| AppError::bad_request(format!("Invalid page number '{value}'"))),
    }
}

/// List books endpoint
async fn list_books(
    State(store): State<BookStore>,
    Query(params): Query<ListParams>,
) -> Result<Json<BookListResponse>, AppError> {
    let genre = choice_filter("genre", params.genre.as_deref(), Genre::from_code)?;
    let status = choice_filter("status", params.status.as_deref(), Status::from_code)?;
    let page = page_number(params.page.as_deref())?;
    let predicate = Predicate::search(params.search.as_deref(), genre, status);

    let page = blocking(move || store.list(&predicate, BookOrder::TitleAuthor, page)).await?;

    Ok(Json(BookListResponse {
        page,
        filters: EchoedFilters {
            search: params.search.unwrap_or_default(),
            genre: params.genre.unwrap_or_default(),
            status: params.status.unwrap_or_default(),
        },
    }))
}

/// Home view counts and recent additions
async fn summary(State(store): State<BookStore>) -> Result<Json<CatalogSummary>, AppError> {
    let summary = blocking(move || store.summary()).await?;
    Ok(Json(summary))
}

async fn get_book(
    State(store): State<BookStore>,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let id = book_id(id)?;
    let book = blocking(move || store.get(id)).await?;
    Ok(Json(book))
}

async fn create_book(
    State(store): State<BookStore>,
    body: Result<Json<BookInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(input) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let book = blocking(move || store.create(&input)).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(store): State<BookStore>,
    id: Result<Path<BookId>, PathRejection>,
    body: Result<Json<BookInput>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let id = book_id(id)?;
    let Json(input) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let book = blocking(move || store.update(id, &input)).await?;
    Ok(Json(book))
}

async fn delete_book(
    State(store): State<BookStore>,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = book_id(id)?;
    blocking(move || store.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Status-only write. Every failure, malformed input included, comes back
/// as a `success: false` body with status 200.
async fn change_status(
    State(store): State<BookStore>,
    id: Result<Path<BookId>, PathRejection>,
    body: Result<Json<StatusChangeRequest>, JsonRejection>,
) -> Json<StatusOutcome> {
    let Ok(Path(id)) = id else {
        return Json(StatusOutcome::failure("Book not found"));
    };
    // An unreadable body carries no valid status.
    let status = body.map(|Json(req)| req.status).unwrap_or_default();

    let outcome = match tokio::task::spawn_blocking(move || store.set_status(id, &status)).await {
        Ok(result) => StatusOutcome::from(result),
        Err(err) => {
            tracing::error!(error = %err, book_id = id, "status task failed");
            StatusOutcome::failure("Could not change the status")
        }
    };
    Json(outcome)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}
