use crate::models::ReadingStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Client-side ordering of a fetched page. Never sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Server,
    TitleAsc,
    TitleDesc,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Server => "server",
            SortKey::TitleAsc => "title_asc",
            SortKey::TitleDesc => "title_desc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "" | "server" | "none" | "default" => Ok(SortKey::Server),
            "title_asc" | "title" => Ok(SortKey::TitleAsc),
            "title_desc" => Ok(SortKey::TitleDesc),
            other => Err(format!(
                "unknown sort key \"{}\" (expected title_asc, title_desc or none)",
                other
            )),
        }
    }
}

/// Current search criteria. Empty or whitespace-only text fields count as
/// absent everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchFilters {
    pub query: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub status: Option<ReadingStatus>,
    #[serde(default)]
    pub sort: SortKey,
}

impl SearchFilters {
    /// Trimmed copy with blank fields dropped.
    pub fn normalized(&self) -> SearchFilters {
        SearchFilters {
            query: non_blank(self.query.as_deref()),
            title: non_blank(self.title.as_deref()),
            author: non_blank(self.author.as_deref()),
            category: non_blank(self.category.as_deref()),
            status: self.status,
            sort: self.sort,
        }
    }

    /// The part of the filters that reaches the server. Two filter values with
    /// the same server key produce the same request.
    pub fn server_key(&self) -> SearchFilters {
        SearchFilters {
            sort: SortKey::Server,
            ..self.normalized()
        }
    }

    /// True when any text field survives normalization.
    pub fn has_text_criteria(&self) -> bool {
        let normalized = self.normalized();
        normalized.query.is_some()
            || normalized.title.is_some()
            || normalized.author.is_some()
            || normalized.category.is_some()
    }

    pub fn is_unfiltered(&self) -> bool {
        !self.has_text_criteria() && self.status.is_none()
    }

    /// Number of criteria that narrow the result set, as shown next to the
    /// search box.
    pub fn active_count(&self) -> usize {
        let normalized = self.normalized();
        [
            normalized.query.is_some(),
            normalized.title.is_some(),
            normalized.author.is_some(),
            normalized.category.is_some(),
            normalized.status.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }

    /// Applies one `key=value` assignment. An empty value clears the field.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let text = non_blank(Some(value));
        match key.trim().to_ascii_lowercase().as_str() {
            "q" | "query" => self.query = text,
            "title" => self.title = text,
            "author" => self.author = text,
            "category" => self.category = text,
            "status" => {
                self.status = match text {
                    Some(raw) if raw != "all" => Some(raw.parse()?),
                    _ => None,
                }
            }
            "sort" => self.sort = value.parse()?,
            other => return Err(format!("unknown filter \"{}\"", other)),
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}
