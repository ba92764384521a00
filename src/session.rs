use crate::api::LibraryBackend;
use crate::auth::AccessPolicy;
use crate::cache::{QueryCache, QueryKey};
use crate::dispatch::dispatch;
use crate::error::{LibraryError, Result};
use crate::filters::{SearchFilters, SortKey};
use crate::isbn::normalize_isbn;
use crate::models::{Book, BookUpdate, BooksResponse, ReadingStatus, Statistics, UserProfile};
use crate::pagination::{PageInfo, Pagination};
use crate::sorter::sort_page;

/// One page ready to show.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub message: String,
    pub books: Vec<Book>,
    /// Zero-based.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_next: bool,
    pub has_prev: bool,
    pub from_cache: bool,
}

/// Browsing state for one user: filters, page cursor, cached responses and
/// the signed-in profile.
pub struct LibrarySession<B: LibraryBackend> {
    backend: B,
    filters: SearchFilters,
    pager: Pagination,
    cache: QueryCache,
    viewer: Option<UserProfile>,
    policy: AccessPolicy,
}

impl<B: LibraryBackend> LibrarySession<B> {
    pub fn new(backend: B, page_size: usize) -> Self {
        LibrarySession {
            backend,
            filters: SearchFilters::default(),
            pager: Pagination::new(page_size),
            cache: QueryCache::new(),
            viewer: None,
            policy: AccessPolicy::default(),
        }
    }

    pub fn with_access(mut self, viewer: Option<UserProfile>, policy: AccessPolicy) -> Self {
        if policy.is_open() && viewer.is_some() {
            log::warn!("no authorized emails configured; any signed-in profile may edit");
        }
        self.viewer = viewer;
        self.policy = policy;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    pub fn pager(&self) -> &Pagination {
        &self.pager
    }

    pub fn viewer(&self) -> Option<&UserProfile> {
        self.viewer.as_ref()
    }

    pub fn can_edit(&self) -> bool {
        self.policy.check(self.viewer.as_ref()).is_ok()
    }

    /// Replaces the filters. The page cursor resets only when the server-side
    /// part changed; a new sort key alone keeps the page.
    pub fn apply_filters(&mut self, filters: SearchFilters) {
        let changed = filters.server_key() != self.filters.server_key();
        self.filters = filters;
        if changed {
            log::debug!("filters changed, back to first page");
            self.pager.reset();
        }
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.filters.sort = sort;
    }

    /// Loads the current page through the cache. At most one backend call,
    /// plus one more when a shrunken result set forces the cursor back.
    pub fn current_page(&mut self) -> Result<PageView> {
        let (response, from_cache) = self.load(self.pager.current())?;
        let info = PageInfo::from_server(&response.pagination, self.pager.page_size());
        if self.pager.update(info) {
            return self.current_page();
        }

        let mut books = response.books;
        sort_page(&mut books, self.filters.sort);
        Ok(PageView {
            message: response.message,
            books,
            page: self.pager.current(),
            total_pages: self.pager.total_pages(),
            total_items: info.total_items,
            has_next: self.pager.has_next(),
            has_prev: self.pager.has_prev(),
            from_cache,
        })
    }

    fn load(&mut self, page: usize) -> Result<(BooksResponse, bool)> {
        let key = QueryKey::new(&self.filters, page);
        if let Some(cached) = self.cache.page(&key) {
            return Ok((cached.clone(), true));
        }
        let query = dispatch(&self.filters);
        let limit = self.pager.page_size();
        let response = query.fetch(&self.backend, limit, page * limit)?;
        self.cache.store_page(key, response.clone());
        Ok((response, false))
    }

    pub fn next_page(&mut self) -> bool {
        self.pager.next()
    }

    pub fn prev_page(&mut self) -> bool {
        self.pager.prev()
    }

    /// Zero-based.
    pub fn jump_to(&mut self, page: usize) -> Result<()> {
        if self.pager.jump_to(page) {
            Ok(())
        } else {
            Err(LibraryError::PageOutOfRange {
                requested: page + 1,
                total: self.pager.total_pages(),
            })
        }
    }

    /// Drops cached data so the next read goes to the server.
    pub fn refresh(&mut self) {
        self.cache.invalidate_all();
    }

    pub fn statistics(&mut self) -> Result<Statistics> {
        if let Some(cached) = self.cache.statistics() {
            return Ok(cached.clone());
        }
        let statistics = self.backend.statistics()?.statistics;
        self.cache.store_statistics(statistics.clone());
        Ok(statistics)
    }

    pub fn book(&self, isbn: &str) -> Result<Book> {
        let isbn = checked_isbn(isbn)?;
        Ok(self.backend.get_book(&isbn)?.book)
    }

    /// Zero-based page.
    pub fn books_by_author(&self, author: &str, page: usize) -> Result<BooksResponse> {
        let limit = self.pager.page_size();
        let skip = self.skip_for(page)?;
        Ok(self.backend.books_by_author(author.trim(), limit, skip)?)
    }

    /// Zero-based page.
    pub fn books_by_category(&self, category: &str, page: usize) -> Result<BooksResponse> {
        let limit = self.pager.page_size();
        let skip = self.skip_for(page)?;
        Ok(self.backend.books_by_category(category.trim(), limit, skip)?)
    }

    fn skip_for(&self, page: usize) -> Result<usize> {
        page.checked_mul(self.pager.page_size())
            .ok_or(LibraryError::PageTooLarge {
                requested: page.saturating_add(1),
            })
    }

    pub fn add_book(&mut self, isbn: &str) -> Result<Book> {
        self.ensure_can_edit()?;
        let isbn = checked_isbn(isbn)?;
        let added = self.backend.add_book(&isbn)?;
        log::info!("added book {}", isbn);
        self.cache.invalidate_all();
        Ok(added.book)
    }

    pub fn update_book(&mut self, isbn: &str, update: &BookUpdate) -> Result<Book> {
        self.ensure_can_edit()?;
        let isbn = checked_isbn(isbn)?;
        if update.is_empty() {
            return Err(LibraryError::EmptyUpdate);
        }
        let updated = self.backend.update_book(&isbn, update)?;
        log::info!("updated book {}", isbn);
        self.cache.invalidate_all();
        Ok(updated.book)
    }

    pub fn delete_book(&mut self, isbn: &str) -> Result<String> {
        self.ensure_can_edit()?;
        let isbn = checked_isbn(isbn)?;
        let deleted = self.backend.delete_book(&isbn)?;
        log::info!("deleted book {}", isbn);
        self.cache.invalidate_all();
        Ok(deleted.message)
    }

    pub fn set_status(&mut self, isbn: &str, status: ReadingStatus) -> Result<ReadingStatus> {
        self.ensure_can_edit()?;
        let isbn = checked_isbn(isbn)?;
        self.persist_status(&isbn, status)
    }

    /// Advances the book one step through unread, in progress and read.
    pub fn cycle_status(&mut self, isbn: &str) -> Result<ReadingStatus> {
        self.step_status(isbn, ReadingStatus::next)
    }

    /// Marks read, or unread when it already is.
    pub fn toggle_read(&mut self, isbn: &str) -> Result<ReadingStatus> {
        self.step_status(isbn, ReadingStatus::toggled)
    }

    fn step_status(
        &mut self,
        isbn: &str,
        step: fn(ReadingStatus) -> ReadingStatus,
    ) -> Result<ReadingStatus> {
        self.ensure_can_edit()?;
        let isbn = checked_isbn(isbn)?;
        let current = match self.cache.known_status(&isbn) {
            Some(status) => status,
            None => self.backend.get_book(&isbn)?.book.reading_status,
        };
        self.persist_status(&isbn, step(current))
    }

    fn persist_status(&mut self, isbn: &str, status: ReadingStatus) -> Result<ReadingStatus> {
        let response = self.backend.update_reading_status(isbn, status)?;
        log::info!("book {} is now {}", isbn, response.reading_status);
        self.cache.invalidate_all();
        Ok(response.reading_status)
    }

    fn ensure_can_edit(&self) -> Result<()> {
        self.policy.check(self.viewer.as_ref()).map(|_| ())
    }
}

fn checked_isbn(value: &str) -> Result<String> {
    normalize_isbn(value).ok_or_else(|| LibraryError::InvalidIsbn {
        value: value.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::models::{
        BookResponse, MessageResponse, SearchCriteria, ServerPagination, StatisticsResponse,
        StatusUpdateResponse,
    };
    use std::cell::{Cell, RefCell};

    const DUNE: &str = "9780441013593";
    const EARTHSEA: &str = "9780547773742";

    fn book(isbn: &str, title: &str, status: ReadingStatus) -> Book {
        Book {
            id: format!("id-{}", isbn),
            isbn: isbn.to_string(),
            title: title.to_string(),
            authors: vec![],
            description: String::new(),
            categories: vec![],
            page_count: None,
            cover_image: String::new(),
            published_date: String::new(),
            publisher: String::new(),
            language: String::new(),
            reading_status: status,
        }
    }

    /// In-memory backend that records every call it receives.
    struct FakeBackend {
        books: RefCell<Vec<Book>>,
        calls: RefCell<Vec<String>>,
        total_override: Cell<Option<usize>>,
        fail_with: RefCell<Option<String>>,
    }

    impl FakeBackend {
        fn new(books: Vec<Book>) -> Self {
            FakeBackend {
                books: RefCell::new(books),
                calls: RefCell::new(vec![]),
                total_override: Cell::new(None),
                fail_with: RefCell::new(None),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: String) -> std::result::Result<(), ApiError> {
            self.calls.borrow_mut().push(call);
            match self.fail_with.borrow().as_ref() {
                Some(message) => Err(ApiError::new(message.clone())),
                None => Ok(()),
            }
        }

        fn page(&self, books: Vec<Book>, limit: usize, skip: usize) -> BooksResponse {
            let total = self.total_override.get().unwrap_or(books.len());
            BooksResponse {
                message: format!("{} books", total),
                books: books.into_iter().skip(skip).take(limit).collect(),
                pagination: ServerPagination {
                    limit,
                    skip,
                    count: total,
                    ..ServerPagination::default()
                },
                search_criteria: None,
            }
        }

        fn find(&self, isbn: &str) -> std::result::Result<Book, ApiError> {
            self.books
                .borrow()
                .iter()
                .find(|book| book.isbn == isbn)
                .cloned()
                .ok_or_else(|| ApiError::new("Book not found"))
        }
    }

    impl LibraryBackend for FakeBackend {
        fn list_books(
            &self,
            limit: usize,
            skip: usize,
        ) -> std::result::Result<BooksResponse, ApiError> {
            self.record(format!("list skip={}", skip))?;
            Ok(self.page(self.books.borrow().clone(), limit, skip))
        }

        fn search_books(
            &self,
            criteria: &SearchCriteria,
            limit: usize,
            skip: usize,
        ) -> std::result::Result<BooksResponse, ApiError> {
            self.record(format!("search skip={}", skip))?;
            let needle = criteria
                .title
                .clone()
                .or(criteria.query.clone())
                .unwrap_or_default()
                .to_lowercase();
            let matching = self
                .books
                .borrow()
                .iter()
                .filter(|book| book.title.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            Ok(self.page(matching, limit, skip))
        }

        fn books_by_status(
            &self,
            status: ReadingStatus,
            limit: usize,
            skip: usize,
        ) -> std::result::Result<BooksResponse, ApiError> {
            self.record(format!("status={} skip={}", status, skip))?;
            let matching = self
                .books
                .borrow()
                .iter()
                .filter(|book| book.reading_status == status)
                .cloned()
                .collect();
            Ok(self.page(matching, limit, skip))
        }

        fn books_by_author(
            &self,
            author: &str,
            limit: usize,
            skip: usize,
        ) -> std::result::Result<BooksResponse, ApiError> {
            self.record(format!("author={} skip={}", author, skip))?;
            Ok(self.page(vec![], limit, skip))
        }

        fn books_by_category(
            &self,
            category: &str,
            limit: usize,
            skip: usize,
        ) -> std::result::Result<BooksResponse, ApiError> {
            self.record(format!("category={} skip={}", category, skip))?;
            Ok(self.page(vec![], limit, skip))
        }

        fn get_book(&self, isbn: &str) -> std::result::Result<BookResponse, ApiError> {
            self.record(format!("get {}", isbn))?;
            Ok(BookResponse {
                message: String::new(),
                book: self.find(isbn)?,
            })
        }

        fn add_book(&self, isbn: &str) -> std::result::Result<BookResponse, ApiError> {
            self.record(format!("add {}", isbn))?;
            let added = book(isbn, "Added", ReadingStatus::Unread);
            self.books.borrow_mut().push(added.clone());
            Ok(BookResponse {
                message: "created".to_string(),
                book: added,
            })
        }

        fn update_book(
            &self,
            isbn: &str,
            update: &BookUpdate,
        ) -> std::result::Result<BookResponse, ApiError> {
            self.record(format!("update {}", isbn))?;
            let mut books = self.books.borrow_mut();
            let target = books
                .iter_mut()
                .find(|book| book.isbn == isbn)
                .ok_or_else(|| ApiError::new("Book not found"))?;
            if let Some(title) = &update.title {
                target.title = title.clone();
            }
            Ok(BookResponse {
                message: String::new(),
                book: target.clone(),
            })
        }

        fn delete_book(&self, isbn: &str) -> std::result::Result<MessageResponse, ApiError> {
            self.record(format!("delete {}", isbn))?;
            self.books.borrow_mut().retain(|book| book.isbn != isbn);
            Ok(MessageResponse {
                message: "deleted".to_string(),
            })
        }

        fn update_reading_status(
            &self,
            isbn: &str,
            status: ReadingStatus,
        ) -> std::result::Result<StatusUpdateResponse, ApiError> {
            self.record(format!("set {} {}", isbn, status))?;
            let mut books = self.books.borrow_mut();
            let target = books
                .iter_mut()
                .find(|book| book.isbn == isbn)
                .ok_or_else(|| ApiError::new("Book not found"))?;
            target.reading_status = status;
            Ok(StatusUpdateResponse {
                message: String::new(),
                isbn: isbn.to_string(),
                reading_status: status,
            })
        }

        fn statistics(&self) -> std::result::Result<StatisticsResponse, ApiError> {
            self.record("statistics".to_string())?;
            let books = self.books.borrow();
            let count = |status| books.iter().filter(|b| b.reading_status == status).count() as u64;
            Ok(StatisticsResponse {
                message: String::new(),
                statistics: Statistics {
                    total_books: books.len() as u64,
                    read: count(ReadingStatus::Read),
                    unread: count(ReadingStatus::Unread),
                    in_progress: count(ReadingStatus::InProgress),
                    ..Statistics::default()
                },
            })
        }
    }

    fn library(size: usize) -> Vec<Book> {
        (0..size)
            .map(|index| {
                book(
                    &format!("isbn-{:02}", index),
                    &format!("Book {:02}", index),
                    ReadingStatus::Unread,
                )
            })
            .collect()
    }

    fn editor() -> UserProfile {
        UserProfile {
            id: "1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            picture: String::new(),
        }
    }

    fn signed_in(backend: FakeBackend) -> LibrarySession<FakeBackend> {
        LibrarySession::new(backend, 20).with_access(
            Some(editor()),
            AccessPolicy::new(&["ada@example.com".to_string()]),
        )
    }

    #[test]
    fn one_backend_call_per_filter_change_and_cache_on_revisit() {
        let mut session = signed_in(FakeBackend::new(library(45)));

        let first = session.current_page().expect("page");
        assert_eq!(first.total_pages, 3);
        assert!(!first.from_cache);

        assert!(session.next_page());
        session.current_page().expect("page 2");
        assert!(session.prev_page());
        let again = session.current_page().expect("page 1 again");
        assert!(again.from_cache);
        assert_eq!(session.backend().calls(), vec!["list skip=0", "list skip=20"]);

        session.apply_filters(SearchFilters {
            status: Some(ReadingStatus::Unread),
            ..SearchFilters::default()
        });
        session.current_page().expect("status page");
        session.apply_filters(SearchFilters {
            title: Some("Book 1".to_string()),
            ..SearchFilters::default()
        });
        session.current_page().expect("search page");
        assert_eq!(
            session.backend().calls()[2..],
            ["status=unread skip=0", "search skip=0"]
        );
    }

    #[test]
    fn filter_change_resets_page_but_sort_does_not() {
        let mut session = signed_in(FakeBackend::new(library(60)));
        session.current_page().expect("page");
        session.jump_to(2).expect("jump");

        session.set_sort(SortKey::TitleDesc);
        assert_eq!(session.pager().current(), 2);
        let view = session.current_page().expect("sorted page");
        assert_eq!(view.books.first().map(|b| b.title.as_str()), Some("Book 59"));
        assert_eq!(session.backend().calls().len(), 2);

        session.apply_filters(SearchFilters {
            query: Some("Book".to_string()),
            sort: SortKey::TitleDesc,
            ..SearchFilters::default()
        });
        assert_eq!(session.pager().current(), 0);
    }

    #[test]
    fn jump_out_of_range_is_an_error() {
        let mut session = signed_in(FakeBackend::new(library(25)));
        session.current_page().expect("page");
        match session.jump_to(2) {
            Err(LibraryError::PageOutOfRange { requested, total }) => {
                assert_eq!((requested, total), (3, 2));
            }
            other => panic!("expected PageOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn cycle_uses_cached_status_and_invalidates() {
        let books = vec![book(DUNE, "Dune", ReadingStatus::Unread)];
        let mut session = signed_in(FakeBackend::new(books));
        session.current_page().expect("page");
        session.statistics().expect("stats");

        assert_eq!(session.cycle_status(DUNE).expect("cycle"), ReadingStatus::InProgress);
        let view = session.current_page().expect("reload");
        assert!(!view.from_cache);
        assert_eq!(view.books[0].reading_status, ReadingStatus::InProgress);
        assert_eq!(session.statistics().expect("stats").in_progress, 1);

        assert_eq!(session.cycle_status(DUNE).expect("cycle"), ReadingStatus::Read);
        assert!(!session.backend().calls().iter().any(|call| call.starts_with("get")));

        // Nothing cached any more, so the third step has to ask the server.
        assert_eq!(session.cycle_status(DUNE).expect("cycle"), ReadingStatus::Unread);
        let reads = session
            .backend()
            .calls()
            .iter()
            .filter(|call| call.starts_with("get"))
            .count();
        assert_eq!(reads, 1);
    }

    #[test]
    fn cycle_without_cache_reads_the_book_first() {
        let books = vec![book(EARTHSEA, "A Wizard of Earthsea", ReadingStatus::Read)];
        let mut session = signed_in(FakeBackend::new(books));
        assert_eq!(session.toggle_read(EARTHSEA).expect("toggle"), ReadingStatus::Unread);
        assert_eq!(
            session.backend().calls(),
            vec![format!("get {}", EARTHSEA), format!("set {} unread", EARTHSEA)]
        );
    }

    #[test]
    fn mutations_require_an_authorized_viewer() {
        let backend = FakeBackend::new(vec![book(DUNE, "Dune", ReadingStatus::Unread)]);
        let mut anonymous = LibrarySession::new(backend, 20);
        assert!(matches!(anonymous.add_book(DUNE), Err(LibraryError::NotSignedIn)));
        assert!(matches!(anonymous.cycle_status(DUNE), Err(LibraryError::NotSignedIn)));

        let backend = FakeBackend::new(vec![book(DUNE, "Dune", ReadingStatus::Unread)]);
        let guest = UserProfile {
            email: "guest@example.com".to_string(),
            ..editor()
        };
        let mut outsider = LibrarySession::new(backend, 20).with_access(
            Some(guest),
            AccessPolicy::new(&["ada@example.com".to_string()]),
        );
        assert!(!outsider.can_edit());
        assert!(matches!(
            outsider.delete_book(DUNE),
            Err(LibraryError::NotAuthorized { .. })
        ));
        assert!(outsider.backend().calls().is_empty());
        assert!(anonymous.backend().calls().is_empty());
    }

    #[test]
    fn huge_page_numbers_are_refused() {
        let session = signed_in(FakeBackend::new(vec![]));
        assert!(matches!(
            session.books_by_author("Borges", usize::MAX / 10),
            Err(LibraryError::PageTooLarge { .. })
        ));
        assert!(matches!(
            session.books_by_category("Fantasy", usize::MAX),
            Err(LibraryError::PageTooLarge { .. })
        ));
        assert!(session.backend().calls().is_empty());

        session.books_by_author("Borges", 2).expect("author page");
        assert_eq!(session.backend().calls(), vec!["author=Borges skip=40"]);
    }

    #[test]
    fn odd_status_still_loads_and_cycles_from_unread() {
        let shelved: Book = serde_json::from_str(&format!(
            r#"{{"isbn": "{}", "title": "Dune", "reading_status": "shelved"}}"#,
            DUNE
        ))
        .expect("book json");
        let mut session = signed_in(FakeBackend::new(vec![shelved]));

        let view = session.current_page().expect("page");
        assert_eq!(view.books[0].reading_status, ReadingStatus::Unread);
        assert_eq!(session.cycle_status(DUNE).expect("cycle"), ReadingStatus::InProgress);
        assert_eq!(
            session.backend().calls(),
            vec!["list skip=0".to_string(), format!("set {} in_progress", DUNE)]
        );
    }

    #[test]
    fn invalid_isbn_never_reaches_the_backend() {
        let mut session = signed_in(FakeBackend::new(vec![]));
        assert!(matches!(
            session.add_book("978-0-00-000000-1"),
            Err(LibraryError::InvalidIsbn { .. })
        ));
        assert!(session.backend().calls().is_empty());
    }

    #[test]
    fn add_update_delete_invalidate_the_cache() {
        let books = vec![book(DUNE, "Dune", ReadingStatus::Read)];
        let mut session = signed_in(FakeBackend::new(books));
        session.current_page().expect("page");

        session.add_book("978-0-547-77374-2").expect("add");
        assert_eq!(session.current_page().expect("page").books.len(), 2);

        let update = BookUpdate {
            title: Some("Dune Messiah".to_string()),
            ..BookUpdate::default()
        };
        session.update_book(DUNE, &update).expect("update");
        assert!(!session.current_page().expect("page").from_cache);

        assert!(matches!(
            session.update_book(DUNE, &BookUpdate::default()),
            Err(LibraryError::EmptyUpdate)
        ));

        session.delete_book(DUNE).expect("delete");
        let view = session.current_page().expect("page");
        assert_eq!(view.books.len(), 1);
        assert_eq!(view.books[0].isbn, EARTHSEA);
    }

    #[test]
    fn shrinking_result_set_pulls_the_cursor_back() {
        let mut session = signed_in(FakeBackend::new(library(60)));
        session.current_page().expect("page");
        session.jump_to(2).expect("jump");

        session.backend().total_override.set(Some(25));
        session.refresh();
        let view = session.current_page().expect("page");
        assert_eq!(view.page, 1);
        assert_eq!(view.total_pages, 2);
        assert!(view.page < view.total_pages);
    }

    #[test]
    fn backend_failure_surfaces_its_message() {
        let backend = FakeBackend::new(vec![]);
        *backend.fail_with.borrow_mut() = Some("Service unavailable".to_string());
        let mut session = signed_in(backend);
        let err = session.current_page().expect_err("should fail");
        assert_eq!(err.to_string(), "Service unavailable");
    }
}
