use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    #[default]
    Unread,
    InProgress,
    Read,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [
        ReadingStatus::Unread,
        ReadingStatus::InProgress,
        ReadingStatus::Read,
    ];

    /// Wire name used in paths, query strings and JSON bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ReadingStatus::Unread => "unread",
            ReadingStatus::InProgress => "in_progress",
            ReadingStatus::Read => "read",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReadingStatus::Unread => "unread",
            ReadingStatus::InProgress => "in progress",
            ReadingStatus::Read => "read",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "unread" => Ok(ReadingStatus::Unread),
            "in_progress" | "inprogress" | "reading" => Ok(ReadingStatus::InProgress),
            "read" => Ok(ReadingStatus::Read),
            other => Err(format!(
                "unknown reading status \"{}\" (expected unread, in_progress or read)",
                other
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Book {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub isbn: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub language: String,
    #[serde(default, deserialize_with = "lenient_status")]
    pub reading_status: ReadingStatus,
}

/// Partial book sent with `PUT /books/{isbn}`. Unset fields are left alone by
/// the backend.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BookUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_status: Option<ReadingStatus>,
}

impl BookUpdate {
    pub fn is_empty(&self) -> bool {
        *self == BookUpdate::default()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ServerPagination {
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub skip: usize,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub has_next: Option<bool>,
    #[serde(default)]
    pub has_prev: Option<bool>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub total_pages: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BooksResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub pagination: ServerPagination,
    #[serde(default)]
    pub search_criteria: Option<SearchCriteria>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BookResponse {
    #[serde(default)]
    pub message: String,
    pub book: Book,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatusUpdateResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default, deserialize_with = "lenient_status")]
    pub reading_status: ReadingStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Statistics {
    #[serde(default)]
    pub total_books: u64,
    #[serde(default)]
    pub read: u64,
    #[serde(default)]
    pub unread: u64,
    #[serde(default)]
    pub in_progress: u64,
    #[serde(default)]
    pub reading_percentage: f64,
    #[serde(default)]
    pub progress_percentage: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatisticsResponse {
    #[serde(default)]
    pub message: String,
    pub statistics: Statistics,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub picture: String,
}

/// One odd record must not sink a whole listing, so statuses outside the
/// known set are read as unread.
fn lenient_status<'de, D>(deserializer: D) -> Result<ReadingStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(ReadingStatus::from_wire(raw.as_deref().unwrap_or_default()))
}
