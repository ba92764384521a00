use crate::api::{ApiError, LibraryBackend};
use crate::filters::SearchFilters;
use crate::models::{BooksResponse, ReadingStatus, SearchCriteria};

/// Which listing endpoint a set of filters resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookQuery {
    All,
    ByStatus(ReadingStatus),
    Search(SearchCriteria),
}

impl BookQuery {
    pub fn endpoint_name(&self) -> &'static str {
        match self {
            BookQuery::All => "list",
            BookQuery::ByStatus(_) => "status",
            BookQuery::Search(_) => "search",
        }
    }

    /// Issues exactly one backend call.
    pub fn fetch<B: LibraryBackend + ?Sized>(
        &self,
        backend: &B,
        limit: usize,
        skip: usize,
    ) -> Result<BooksResponse, ApiError> {
        log::debug!(
            "dispatching {} query limit={} skip={}",
            self.endpoint_name(),
            limit,
            skip
        );
        match self {
            BookQuery::All => backend.list_books(limit, skip),
            BookQuery::ByStatus(status) => backend.books_by_status(*status, limit, skip),
            BookQuery::Search(criteria) => backend.search_books(criteria, limit, skip),
        }
    }
}

/// Sort key is dropped first; it only affects display.
pub fn dispatch(filters: &SearchFilters) -> BookQuery {
    let filters = filters.server_key();
    if filters.is_unfiltered() {
        return BookQuery::All;
    }
    if !filters.has_text_criteria() {
        if let Some(status) = filters.status {
            return BookQuery::ByStatus(status);
        }
    }
    BookQuery::Search(SearchCriteria {
        query: filters.query,
        title: filters.title,
        author: filters.author,
        category: filters.category,
        reading_status: filters.status.map(|status| status.as_str().to_string()),
    })
}
