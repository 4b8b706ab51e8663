use serde::{Deserialize, Serialize};

/// Offset pagination parameters, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub const DEFAULT_PER_PAGE: u64 = 10;
    pub const MAX_PER_PAGE: u64 = 100;

    /// Build a request, clamping out-of-range values.
    ///
    /// `page * per_page` always fits in an `i64`, the widest offset a SQL
    /// backend accepts. Pages beyond that are simply empty.
    pub fn new(page: u64, per_page: u64) -> Self {
        let per_page = per_page.clamp(1, Self::MAX_PER_PAGE);
        Self {
            page: page.clamp(1, i64::MAX as u64 / per_page),
            per_page,
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PER_PAGE)
    }
}

/// One page of results plus the total count across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page.saturating_mul(self.per_page) < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(0, 1000);
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, PageRequest::MAX_PER_PAGE);
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
    }

    #[test]
    fn test_huge_page_is_clamped() {
        let req = PageRequest::new(u64::MAX, 10);
        assert_eq!(req.page, i64::MAX as u64 / 10);
        assert!(req.offset() <= i64::MAX as u64);

        let req = PageRequest::new(u64::MAX, 1);
        assert_eq!(req.offset(), i64::MAX as u64 - 1);
    }

    #[test]
    fn test_has_next_far_past_the_end() {
        let page: Page<u8> = Page::new(vec![], 5, PageRequest::new(u64::MAX / 2, 10));
        assert!(!page.has_next());

        // Fields set directly bypass the clamp.
        let raw: Page<u8> = Page {
            items: vec![],
            total: 5,
            page: u64::MAX,
            per_page: 100,
        };
        assert!(!raw.has_next());
    }

    #[test]
    fn test_has_next() {
        let page = Page::new(vec![1; 10], 25, PageRequest::new(2, 10));
        assert!(page.has_next());
        let last = Page::new(vec![1; 5], 25, PageRequest::new(3, 10));
        assert!(!last.has_next());
    }
}
