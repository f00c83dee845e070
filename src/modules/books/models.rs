use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Store-assigned book identifier.
pub type BookId = i64;

/// A catalogued book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// Normalized ISBN-13, digits only
    pub isbn: String,
    pub genre: Genre,
    pub publisher: Option<String>,
    pub publication_year: i32,
    pub page_count: Option<u32>,
    pub description: Option<String>,
    pub status: Status,
    /// Set once when the book is created
    pub date_added: NaiveDate,
    /// Stamped on every mutation
    pub date_modified: DateTime<Utc>,
}

/// Length of [`Book::summary`] before it is cut.
const SUMMARY_CHARS: usize = 100;

impl Book {
    pub fn is_available(&self) -> bool {
        self.status == Status::Available
    }

    /// Short description for list views.
    pub fn summary(&self) -> String {
        match &self.description {
            Some(text) if text.chars().count() > SUMMARY_CHARS => {
                let cut: String = text.chars().take(SUMMARY_CHARS).collect();
                format!("{cut}...")
            }
            Some(text) => text.clone(),
            None => "No description available".to_string(),
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.author)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    Fiction,
    NonFiction,
    Science,
    History,
    Biography,
    Technology,
    Art,
    Sports,
    #[default]
    Other,
}

impl Genre {
    pub const ALL: [Genre; 9] = [
        Genre::Fiction,
        Genre::NonFiction,
        Genre::Science,
        Genre::History,
        Genre::Biography,
        Genre::Technology,
        Genre::Art,
        Genre::Sports,
        Genre::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fiction => "fiction",
            Self::NonFiction => "non-fiction",
            Self::Science => "science",
            Self::History => "history",
            Self::Biography => "biography",
            Self::Technology => "technology",
            Self::Art => "art",
            Self::Sports => "sports",
            Self::Other => "other",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|genre| genre.as_str() == code)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Fiction => "Fiction",
            Self::NonFiction => "Non-Fiction",
            Self::Science => "Science",
            Self::History => "History",
            Self::Biography => "Biography",
            Self::Technology => "Technology",
            Self::Art => "Art",
            Self::Sports => "Sports",
            Self::Other => "Other",
        }
    }
}

/// Circulation status of a book.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Available,
    Loaned,
    Reserved,
    Lost,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Available,
        Status::Loaned,
        Status::Reserved,
        Status::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Loaned => "loaned",
            Self::Reserved => "reserved",
            Self::Lost => "lost",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == code)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Loaned => "Loaned",
            Self::Reserved => "Reserved",
            Self::Lost => "Lost",
        }
    }
}

/// Raw field set submitted on create and update.
///
/// Text fields accept any JSON scalar and `null`; numeric fields keep
/// whatever was sent. A bad value becomes a field error in validation
/// instead of failing the whole body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookInput {
    #[serde(deserialize_with = "text_or_empty")]
    pub title: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub author: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub isbn: String,
    #[serde(deserialize_with = "optional_text")]
    pub genre: Option<String>,
    #[serde(deserialize_with = "optional_text")]
    pub publisher: Option<String>,
    pub publication_year: Option<WholeNumber>,
    pub page_count: Option<WholeNumber>,
    #[serde(deserialize_with = "optional_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "optional_text")]
    pub status: Option<String>,
}

/// Integer field as submitted: a JSON integer, a string, or anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WholeNumber {
    Integer(i64),
    Text(String),
    Other(Value),
}

fn loose_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

fn text_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(loose_text(Option::deserialize(deserializer)?).unwrap_or_default())
}

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(loose_text(Option::deserialize(deserializer)?))
}

/// Book count for one status.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusCount {
    pub status: Status,
    pub label: &'static str,
    pub count: u64,
}

/// Home view aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogSummary {
    pub total: u64,
    /// One entry per status, zero-filled, in [`Status::ALL`] order
    pub by_status: Vec<StatusCount>,
    pub recently_added: Vec<Book>,
}

impl CatalogSummary {
    pub fn count_for(&self, status: Status) -> u64 {
        self.by_status
            .iter()
            .find(|entry| entry.status == status)
            .map_or(0, |entry| entry.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(description: Option<&str>) -> Book {
        Book {
            id: 1,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: "9780441172719".to_string(),
            genre: Genre::Fiction,
            publisher: None,
            publication_year: 1965,
            page_count: Some(412),
            description: description.map(str::to_string),
            status: Status::Available,
            date_added: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            date_modified: Utc::now(),
        }
    }

    #[test]
    fn codes_round_trip() {
        for genre in Genre::ALL {
            assert_eq!(Genre::from_code(genre.as_str()), Some(genre));
        }
        for status in Status::ALL {
            assert_eq!(Status::from_code(status.as_str()), Some(status));
        }
        assert_eq!(Genre::from_code("Fiction"), None);
        assert_eq!(Status::from_code("invalid_value"), None);
    }

    #[test]
    fn serde_uses_the_same_codes() {
        assert_eq!(
            serde_json::to_value(Genre::NonFiction).unwrap(),
            serde_json::json!("non-fiction")
        );
        assert_eq!(
            serde_json::to_value(Status::Loaned).unwrap(),
            serde_json::json!("loaned")
        );
    }

    #[test]
    fn defaults_match_new_records() {
        assert_eq!(Genre::default(), Genre::Other);
        assert_eq!(Status::default(), Status::Available);
    }

    #[test]
    fn summary_truncates_long_descriptions() {
        let long = "a".repeat(150);
        let summary = book(Some(&long)).summary();
        assert_eq!(summary.len(), 103);
        assert!(summary.ends_with("..."));

        assert_eq!(book(Some("short")).summary(), "short");
        assert_eq!(book(None).summary(), "No description available");
    }

    #[test]
    fn input_keeps_mistyped_values() {
        let input: BookInput = serde_json::from_value(serde_json::json!({
            "title": null,
            "author": 42,
            "isbn": "978-0-441-17271-9",
            "publication_year": "nineteen",
            "page_count": 12.5,
        }))
        .unwrap();

        assert_eq!(input.title, "");
        assert_eq!(input.author, "42");
        assert_eq!(input.genre, None);
        assert_eq!(
            input.publication_year,
            Some(WholeNumber::Text("nineteen".to_string()))
        );
        assert_eq!(
            input.page_count,
            Some(WholeNumber::Other(serde_json::json!(12.5)))
        );
    }

    #[test]
    fn display_joins_title_and_author() {
        assert_eq!(book(None).to_string(), "Dune - Frank Herbert");
        assert!(book(None).is_available());
    }
}
