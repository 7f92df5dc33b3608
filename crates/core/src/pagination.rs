//! Page-number pagination for list views.

use serde::Serialize;

use crate::error::CoreError;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// A validated `(page, limit)` pair. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Apply defaults and reject out-of-range values. Limits above
    /// [`MAX_PAGE_SIZE`] are capped rather than rejected.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Result<Self, CoreError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if page < 1 {
            return Err(CoreError::field("page", "page must be at least 1"));
        }
        if limit < 1 {
            return Err(CoreError::field("limit", "limit must be greater than 0"));
        }
        Ok(Self {
            page,
            limit: limit.min(MAX_PAGE_SIZE),
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// `ceil(total / limit)`; zero items means zero pages.
pub fn total_pages(total_items: i64, limit: i64) -> i64 {
    if total_items <= 0 || limit <= 0 {
        return 0;
    }
    (total_items + limit - 1) / limit
}

/// One page of a list view.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub per_page: i64,
    pub items: Vec<T>,
}

impl<T: Serialize> Page<T> {
    pub fn new(request: PageRequest, total_items: i64, items: Vec<T>) -> Self {
        Self {
            current_page: request.page,
            total_pages: total_pages(total_items, request.limit),
            total_items,
            per_page: request.limit,
            items,
        }
    }

    /// Convert the items while keeping the page metadata.
    pub fn map<U: Serialize>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            current_page: self.current_page,
            total_pages: self.total_pages,
            total_items: self.total_items,
            per_page: self.per_page,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults() {
        let req = PageRequest::new(None, None).unwrap();
        assert_eq!(req, PageRequest { page: 1, limit: 10 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn offset_for_later_pages() {
        let req = PageRequest::new(Some(3), Some(25)).unwrap();
        assert_eq!(req.offset(), 50);
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(PageRequest::new(None, Some(500)).unwrap().limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn rejects_zero_page_and_limit() {
        assert_matches!(
            PageRequest::new(Some(0), None),
            Err(CoreError::InvalidFields { .. })
        );
        assert_matches!(
            PageRequest::new(None, Some(0)),
            Err(CoreError::InvalidFields { .. })
        );
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(1, 100), 1);
    }
}
