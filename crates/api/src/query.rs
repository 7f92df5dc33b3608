//! Shared query parameter types for API handlers.

use aduan_core::error::CoreError;
use aduan_core::pagination::PageRequest;
use serde::Deserialize;

/// Page-number pagination parameters (`?page=&limit=`).
///
/// Validated through [`PageRequest::new`]: values below 1 are rejected and
/// limits above the maximum are capped.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub fn page_request(&self) -> Result<PageRequest, CoreError> {
        PageRequest::new(self.page, self.limit)
    }
}
