//! Status-only writes.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Serialize;

use super::error::CatalogError;
use super::models::{BookId, Status};
use super::store::{fetch, BookStore};

/// A status change that was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub id: BookId,
    pub old: Status,
    pub new: Status,
    pub changed_at: DateTime<Utc>,
}

impl StatusChange {
    pub fn message(&self) -> String {
        format!("Status changed to {}", self.new.label())
    }
}

impl BookStore {
    /// Move book `id` to `new_status`.
    ///
    /// Any status may follow any other, itself included. An unknown status
    /// leaves the book untouched.
    pub fn set_status(&self, id: BookId, new_status: &str) -> Result<StatusChange, CatalogError> {
        self.db.with_conn(|conn| {
            let old = fetch(conn, id)?.status;
            let new = Status::from_code(new_status)
                .ok_or_else(|| CatalogError::InvalidStatus(new_status.to_string()))?;
            let changed_at = Utc::now();

            conn.execute(
                "UPDATE books SET status = ?1, date_modified = ?2 WHERE id = ?3",
                params![new, changed_at, id],
            )?;

            tracing::info!(
                book_id = id,
                from = old.as_str(),
                to = new.as_str(),
                "book status changed"
            );
            Ok(StatusChange {
                id,
                old,
                new,
                changed_at,
            })
        })
    }
}

/// Result body of the status endpoint: success or failure, never a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<Status>,
}

impl StatusOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            old_status: None,
            new_status: None,
        }
    }
}

impl From<Result<StatusChange, CatalogError>> for StatusOutcome {
    fn from(result: Result<StatusChange, CatalogError>) -> Self {
        match result {
            Ok(change) => Self {
                success: true,
                message: change.message(),
                old_status: Some(change.old),
                new_status: Some(change.new),
            },
            Err(CatalogError::NotFound(_)) => Self::failure("Book not found"),
            Err(CatalogError::InvalidStatus(_)) => Self::failure("Invalid status"),
            Err(err) => {
                tracing::error!(error = %err, "status change failed");
                Self::failure("Could not change the status")
            }
        }
    }
}
