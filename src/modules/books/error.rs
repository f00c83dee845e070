use libris_http::error::AppError;
use serde_json::json;
use thiserror::Error;

use super::models::BookId;
use super::validation::ValidationErrors;

/// Failures of the catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("book {0} not found")]
    NotFound(BookId),

    #[error("page {0} not found")]
    PageNotFound(u32),

    #[error("invalid status '{0}'")]
    InvalidStatus(String),

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(errors) => {
                let details = errors
                    .iter()
                    .map(|error| json!({ "field": error.field, "message": error.message }))
                    .collect();
                AppError::validation(details, "Please correct the errors in the book form.")
            }
            CatalogError::NotFound(id) => AppError::not_found(format!("Book {id} not found")),
            CatalogError::PageNotFound(page) => {
                AppError::not_found(format!("Page {page} not found"))
            }
            CatalogError::InvalidStatus(value) => {
                AppError::bad_request(format!("Invalid status '{value}'"))
            }
            CatalogError::Storage(e) => {
                AppError::Internal(anyhow::Error::new(e).context("catalog storage failure"))
            }
        }
    }
}
