//! Paging and date-range filters shared by the listing operations.

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Page size used where a caller needs every row at once.
pub const UNBOUNDED_LIMIT: i64 = 10_000;

/// Normalized page request. `page` and `limit` are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Non-positive values fall back to page 1 and limit 10. No upper bound
    /// is applied here.
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: if page > 0 { page } else { DEFAULT_PAGE },
            limit: if limit > 0 { limit } else { DEFAULT_LIMIT },
        }
    }

    pub fn unbounded() -> Self {
        Self::new(DEFAULT_PAGE, UNBOUNDED_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Slice `rows` to this page.
    pub fn apply<T: Clone>(&self, rows: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let len = usize::try_from(self.limit).unwrap_or(usize::MAX);
        rows.iter().skip(start).take(len).cloned().collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_LIMIT)
    }
}

/// Inclusive filter on reception open timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// The filter only applies when both bounds are present.
    pub fn from_bounds(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<Self> {
        match (start, end) {
            (Some(start), Some(end)) => Some(Self { start, end }),
            _ => None,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// One page of results with the total number of matches.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

pub fn page_count(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn non_positive_values_use_defaults() {
        assert_eq!(PageRequest::new(0, 0), PageRequest::new(1, 10));
        assert_eq!(PageRequest::new(-3, -1), PageRequest::default());
        assert_eq!(PageRequest::new(2, 500).limit, 500);
    }

    #[test]
    fn offset_and_slice() {
        let rows: Vec<i32> = (1..=25).collect();
        let page = PageRequest::new(3, 10);
        assert_eq!(page.offset(), 20);
        assert_eq!(page.apply(&rows), vec![21, 22, 23, 24, 25]);
        assert!(PageRequest::new(4, 10).apply(&rows).is_empty());
    }

    #[test]
    fn range_requires_both_bounds_and_is_inclusive() {
        let now = Utc::now();
        assert!(DateRange::from_bounds(Some(now), None).is_none());
        assert!(DateRange::from_bounds(None, Some(now)).is_none());

        let range = DateRange::from_bounds(Some(now), Some(now + Duration::hours(1))).unwrap();
        assert!(range.contains(now));
        assert!(range.contains(now + Duration::hours(1)));
        assert!(!range.contains(now - Duration::seconds(1)));
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
    }
}
