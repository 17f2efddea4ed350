//! Page-number pagination

use serde::Serialize;

/// Requested page, resolved against the configured page sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number; `None` when the requested page can never exist
    pub page: Option<i64>,
    pub page_size: i64,
}

impl PageRequest {
    /// Resolve raw `page` / `page_size` query values.
    ///
    /// Unparsable or non-positive sizes fall back to the default, sizes above
    /// the ceiling are capped. Unparsable or non-positive pages are out of range.
    pub fn parse(page: Option<&str>, page_size: Option<&str>, default_size: i64, max_size: i64) -> Self {
        let page_size = page_size
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|s| *s > 0)
            .map(|s| s.min(max_size))
            .unwrap_or(default_size);

        let page = match page.map(str::trim) {
            None | Some("") => Some(1),
            Some(raw) => raw.parse::<i64>().ok().filter(|p| *p >= 1),
        };

        Self { page, page_size }
    }

    /// Row offset, or `None` for an out-of-range page
    pub fn offset(&self) -> Option<i64> {
        self.page
            .and_then(|p| (p - 1).checked_mul(self.page_size))
    }

    /// Number of the last page holding results (at least 1)
    pub fn last_page(&self, count: i64) -> i64 {
        ((count + self.page_size - 1) / self.page_size).max(1)
    }
}

/// Paginated list response
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    /// Total number of matching records
    pub count: i64,
    /// Next page number, if any
    pub next: Option<i64>,
    /// Previous page number, if any
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(results: Vec<T>, count: i64, request: &PageRequest) -> Self {
        let last = request.last_page(count);
        let (next, previous) = match request.page {
            Some(page) if page <= last => (
                (page < last).then_some(page + 1),
                (page > 1).then_some(page - 1),
            ),
            _ => (None, None),
        };
        Self {
            count,
            next,
            previous,
            results,
        }
    }

    /// Empty page carrying the real total
    pub fn empty(count: i64) -> Self {
        Self {
            count,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}
