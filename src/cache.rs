use crate::filters::SearchFilters;
use crate::isbn::normalize_isbn;
use crate::models::{BooksResponse, ReadingStatus, Statistics};
use std::collections::HashMap;

/// Cache key: what was sent to the server, plus the page index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub filters: SearchFilters,
    pub page: usize,
}

impl QueryKey {
    pub fn new(filters: &SearchFilters, page: usize) -> Self {
        QueryKey {
            filters: filters.server_key(),
            page,
        }
    }
}

#[derive(Debug, Default)]
pub struct QueryCache {
    pages: HashMap<QueryKey, BooksResponse>,
    statistics: Option<Statistics>,
}

impl QueryCache {
    pub fn new() -> Self {
        QueryCache::default()
    }

    pub fn page(&self, key: &QueryKey) -> Option<&BooksResponse> {
        self.pages.get(key)
    }

    pub fn store_page(&mut self, key: QueryKey, response: BooksResponse) {
        self.pages.insert(key, response);
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    pub fn store_statistics(&mut self, statistics: Statistics) {
        self.statistics = Some(statistics);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Last known status of a book across every cached page. `isbn` is the
    /// normalized form; the server's copy may still carry separators.
    pub fn known_status(&self, isbn: &str) -> Option<ReadingStatus> {
        self.pages
            .values()
            .flat_map(|response| response.books.iter())
            .find(|book| {
                book.isbn == isbn || normalize_isbn(&book.isbn).as_deref() == Some(isbn)
            })
            .map(|book| book.reading_status)
    }

    /// Drops every cached listing and the statistics. Called after any
    /// successful mutation.
    pub fn invalidate_all(&mut self) {
        if !self.pages.is_empty() || self.statistics.is_some() {
            log::debug!("invalidating {} cached pages and statistics", self.pages.len());
        }
        self.pages.clear();
        self.statistics = None;
    }
}
