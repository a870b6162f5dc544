//! Lenient parsing of `page`/`limit` query parameters.

use serde::{Deserialize, Serialize};

use crate::models::{page_count, DEFAULT_LIMIT};

/// Largest page size the HTTP API serves.
pub const MAX_HTTP_LIMIT: i64 = 30;

/// Raw paging parameters; values that do not parse are ignored rather than
/// rejected.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    /// Page number; anything but a positive integer means 1.
    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1)
    }

    /// Page size; a bad or non-positive value means 10, anything above
    /// [`MAX_HTTP_LIMIT`] is clamped.
    pub fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l > 0)
            .map_or(DEFAULT_LIMIT, |l| l.min(MAX_HTTP_LIMIT))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub page_count: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            page_count: page_count(total, limit),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn missing_or_garbage_values_fall_back() {
        let q = query(None, None);
        assert_eq!((q.page(), q.limit()), (1, 10));

        let q = query(Some("abc"), Some("-5"));
        assert_eq!((q.page(), q.limit()), (1, 10));

        let q = query(Some("0"), Some("0"));
        assert_eq!((q.page(), q.limit()), (1, 10));
    }

    #[test]
    fn limit_is_clamped_to_thirty() {
        assert_eq!(query(None, Some("30")).limit(), 30);
        assert_eq!(query(None, Some("31")).limit(), 30);
        assert_eq!(query(Some("3"), Some("5")).page(), 3);
    }

    #[test]
    fn pagination_counts_pages() {
        let p = Pagination::new(1, 10, 21);
        assert_eq!(p.page_count, 3);
    }
}
