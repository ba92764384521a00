use crate::models::ServerPagination;

pub const BOOKS_PER_PAGE: usize = 20;

/// What the last response said about the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub total_pages: usize,
    pub total_items: usize,
    pub has_next: Option<bool>,
    pub has_prev: Option<bool>,
}

impl PageInfo {
    /// Server `total_pages` wins; otherwise it is derived from `total`, then
    /// `count`. An empty result still has one (empty) page.
    pub fn from_server(pagination: &ServerPagination, page_size: usize) -> Self {
        let total_items = pagination.total.unwrap_or(pagination.count);
        let derived = total_items.div_ceil(page_size.max(1));
        let total_pages = pagination
            .total_pages
            .filter(|pages| *pages > 0)
            .unwrap_or(derived)
            .max(1);
        PageInfo {
            total_pages,
            total_items,
            has_next: pagination.has_next,
            has_prev: pagination.has_prev,
        }
    }
}

/// Zero-based page cursor. The index stays inside `[0, total_pages)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    page_size: usize,
    current: usize,
    info: Option<PageInfo>,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::new(BOOKS_PER_PAGE)
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Pagination {
            page_size: page_size.max(1),
            current: 0,
            info: None,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn skip(&self) -> usize {
        self.current * self.page_size
    }

    pub fn info(&self) -> Option<PageInfo> {
        self.info
    }

    /// One page until a response has been seen.
    pub fn total_pages(&self) -> usize {
        self.info.map(|info| info.total_pages).unwrap_or(1)
    }

    pub fn has_next(&self) -> bool {
        let in_bounds = self.current + 1 < self.total_pages();
        match self.info.and_then(|info| info.has_next) {
            Some(server) => server && in_bounds,
            None => in_bounds,
        }
    }

    pub fn has_prev(&self) -> bool {
        let in_bounds = self.current > 0;
        match self.info.and_then(|info| info.has_prev) {
            Some(server) => server && in_bounds,
            None => in_bounds,
        }
    }

    /// Filters changed: start over.
    pub fn reset(&mut self) {
        self.current = 0;
        self.info = None;
    }

    /// Records a response. Returns true when the current index had to be pulled
    /// back because the result set shrank.
    pub fn update(&mut self, info: PageInfo) -> bool {
        self.info = Some(info);
        let last = info.total_pages - 1;
        if self.current > last {
            log::debug!(
                "page {} out of range after refresh, clamping to {}",
                self.current,
                last
            );
            self.current = last;
            return true;
        }
        false
    }

    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn prev(&mut self) -> bool {
        if !self.has_prev() {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Zero-based jump; out-of-range targets leave the cursor where it is.
    pub fn jump_to(&mut self, page: usize) -> bool {
        if page >= self.total_pages() {
            return false;
        }
        self.current = page;
        true
    }
}
