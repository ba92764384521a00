use crate::filters::{SearchFilters, SortKey};
use crate::models::{BookUpdate, ReadingStatus};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "biblio", version, about = "Browse and manage your book library")]
pub struct Cli {
    /// Base URL of the library API, including `/api/v1`.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Where the local profile database lives.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// More log output (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List books, optionally filtered.
    List(ListArgs),
    /// Show one book.
    Show { isbn: String },
    /// Add a book by ISBN; the server fills in the metadata.
    Add { isbn: String },
    /// Edit stored metadata.
    Edit(EditArgs),
    /// Remove a book.
    Delete { isbn: String },
    /// Move a book to its next reading status.
    Cycle { isbn: String },
    /// Flip a book between read and unread.
    Toggle { isbn: String },
    /// Set the reading status directly.
    SetStatus {
        isbn: String,
        #[arg(value_parser = parse_status)]
        status: ReadingStatus,
    },
    /// Reading statistics for the whole library.
    Stats,
    /// Books by one author.
    ByAuthor {
        author: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Books in one category.
    ByCategory {
        category: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Store the profile returned by the identity provider.
    Login(LoginArgs),
    /// Forget the stored profile.
    Logout,
    /// Show who is signed in.
    Whoami,
    /// Interactive browsing session.
    Browse,
}

#[derive(Debug, Args, Default)]
pub struct ListArgs {
    /// Free-text query across all fields.
    #[arg(short, long)]
    pub query: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long, value_parser = parse_status)]
    pub status: Option<ReadingStatus>,
    /// title_asc or title_desc; applies to the fetched page only.
    #[arg(long, value_parser = parse_sort, default_value = "server")]
    pub sort: SortKey,
    /// One-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

impl ListArgs {
    pub fn filters(&self) -> SearchFilters {
        SearchFilters {
            query: self.query.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            category: self.category.clone(),
            status: self.status,
            sort: self.sort,
        }
    }
}

#[derive(Debug, Args, Default)]
pub struct EditArgs {
    pub isbn: String,
    #[arg(long)]
    pub title: Option<String>,
    /// Repeat for several authors; replaces the whole list.
    #[arg(long = "author")]
    pub authors: Vec<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Repeat for several categories; replaces the whole list.
    #[arg(long = "category")]
    pub categories: Vec<String>,
    #[arg(long)]
    pub pages: Option<u32>,
    #[arg(long)]
    pub publisher: Option<String>,
    #[arg(long)]
    pub published_date: Option<String>,
    #[arg(long)]
    pub language: Option<String>,
    #[arg(long, value_parser = parse_status)]
    pub status: Option<ReadingStatus>,
}

impl EditArgs {
    pub fn update(&self) -> BookUpdate {
        BookUpdate {
            title: trimmed(&self.title),
            authors: cleaned_list(&self.authors),
            description: self.description.clone(),
            categories: cleaned_list(&self.categories),
            page_count: self.pages,
            publisher: trimmed(&self.publisher),
            published_date: trimmed(&self.published_date),
            language: trimmed(&self.language),
            reading_status: self.status,
        }
    }
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub id: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, default_value = "")]
    pub picture: String,
}

fn parse_status(value: &str) -> Result<ReadingStatus, String> {
    value.parse()
}

fn parse_sort(value: &str) -> Result<SortKey, String> {
    value.parse()
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

fn cleaned_list(values: &[String]) -> Option<Vec<String>> {
    let cleaned = values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
        .collect::<Vec<_>>();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
