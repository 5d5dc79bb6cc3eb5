//! Pagination types for catalog listings

use serde::{Deserialize, Serialize};

/// Largest page a caller may request; larger sizes are clamped.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Page selection for listing queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (0-indexed)
    pub page: u32,
    /// Items per page, at most [`MAX_PAGE_SIZE`]
    pub page_size: u32,
}

impl PageRequest {
    /// Create a new page request, clamping `page_size` to [`MAX_PAGE_SIZE`]
    ///
    /// # Examples
    ///
    /// ```
    /// use core_library::repositories::PageRequest;
    ///
    /// let request = PageRequest::new(1, 20);
    /// assert_eq!(request.offset(), 20);
    ///
    /// let huge = PageRequest::new(0, 10_000);
    /// assert_eq!(huge.limit(), 500);
    /// ```
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size: page_size.min(MAX_PAGE_SIZE),
        }
    }

    /// SQL OFFSET for this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_size)
    }

    /// SQL LIMIT for this page
    pub fn limit(&self) -> u32 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, 50)
    }
}

/// One page of results plus totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let total_pages = if request.page_size == 0 {
            0
        } else {
            total.div_ceil(u64::from(request.page_size)) as u32
        };

        Self {
            items,
            total,
            page: request.page,
            total_pages,
            page_size: request.page_size,
        }
    }

    /// Whether a page follows this one
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    /// Map the items to a different type, keeping the totals
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            total_pages: self.total_pages,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_offset_and_limit() {
        let request = PageRequest::default();
        assert_eq!(request.offset(), 0);
        assert_eq!(request.limit(), 50);

        let request = PageRequest::new(2, 20);
        assert_eq!(request.offset(), 40);
        assert_eq!(request.limit(), 20);
    }

    #[test]
    fn test_page_request_clamps_size() {
        assert_eq!(PageRequest::new(0, MAX_PAGE_SIZE + 1).page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_offset_does_not_overflow() {
        let request = PageRequest::new(u32::MAX, MAX_PAGE_SIZE);
        assert_eq!(request.offset(), u64::from(u32::MAX) * 500);
    }

    #[test]
    fn test_page_totals() {
        let page = Page::new(vec![1, 2, 3], 25, PageRequest::new(0, 10));
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next());
        assert!(!page.has_previous());

        let page = Page::new(vec![1], 30, PageRequest::new(2, 10));
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next());
        assert!(page.has_previous());

        let page = Page::new(Vec::<u8>::new(), 25, PageRequest::new(0, 0));
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2, 3], 25, PageRequest::new(0, 10));
        let mapped = page.map(|x| x.to_string());

        assert_eq!(mapped.items, vec!["1", "2", "3"]);
        assert_eq!(mapped.total, 25);
    }
}
