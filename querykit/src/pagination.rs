use axum::http::{HeaderMap, HeaderValue, header::CONTENT_RANGE};
use serde::Serialize;

/// One page of results plus the numbers a client needs to walk the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub last_page: u64,
}

/// `ceil(total / per_page)`, never less than 1.
#[must_use]
pub fn last_page(total: u64, per_page: u64) -> u64 {
    total.div_ceil(per_page.max(1)).max(1)
}

/// Sanitize resource name by removing control characters for HTTP headers
fn sanitize_resource_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect()
}

/// Build a `Content-Range` header for `count` items starting at `offset`.
///
/// Produces `{resource} {first}-{last}/{total}`, or `{resource} */{total}`
/// when there are no items to describe. The resource name is stripped of
/// anything that cannot appear in a header value.
#[must_use]
pub fn calculate_content_range(
    offset: u64,
    count: u64,
    total_count: u64,
    resource_name: &str,
) -> HeaderMap {
    let safe_name = sanitize_resource_name(resource_name);
    let content_range = if count == 0 {
        format!("{safe_name} */{total_count}")
    } else {
        let last = offset.saturating_add(count - 1);
        format!("{safe_name} {offset}-{last}/{total_count}")
    };

    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&content_range)
        .unwrap_or_else(|_| HeaderValue::from_static("items */0"));
    headers.insert(CONTENT_RANGE, value);
    headers
}

impl<T> PaginatedResult<T> {
    /// Wrap a fetched page. Zero `page`/`per_page` are read as 1.
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, page: u64, per_page: u64) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        Self {
            items,
            total,
            page,
            per_page,
            last_page: last_page(total, per_page),
        }
    }

    /// Zero-based index of the first item on this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    #[must_use]
    pub fn is_past_end(&self) -> bool {
        self.page > self.last_page
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            last_page: self.last_page,
        }
    }

    /// `Content-Range` header describing this page.
    #[must_use]
    pub fn content_range(&self, resource_name: &str) -> HeaderMap {
        calculate_content_range(
            self.offset(),
            u64::try_from(self.items.len()).unwrap_or(u64::MAX),
            self.total,
            resource_name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_page_is_ceiling() {
        for (total, per_page, expected) in [
            (0, 10, 1),
            (1, 10, 1),
            (10, 10, 1),
            (11, 10, 2),
            (95, 10, 10),
            (100, 1, 100),
            (7, 3, 3),
        ] {
            assert_eq!(last_page(total, per_page), expected, "total={total} per_page={per_page}");
        }
    }

    #[test]
    fn test_zero_per_page_does_not_divide_by_zero() {
        assert_eq!(last_page(5, 0), 5);
        let result = PaginatedResult::<u8>::new(Vec::new(), 5, 0, 0);
        assert_eq!((result.page, result.per_page, result.last_page), (1, 1, 5));
    }

    #[test]
    fn test_page_past_end_keeps_metadata() {
        let result = PaginatedResult::<u8>::new(Vec::new(), 25, 9, 10);
        assert_eq!(result.page, 9);
        assert_eq!(result.last_page, 3);
        assert!(result.is_past_end());
        assert_eq!(result.offset(), 80);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let result = PaginatedResult::new(vec![1, 2, 3], 13, 2, 3).map(|n| n * 10);
        assert_eq!(result.items, vec![10, 20, 30]);
        assert_eq!((result.total, result.page, result.per_page, result.last_page), (13, 2, 3, 5));
    }

    #[test]
    fn test_serializes_flat() {
        let result = PaginatedResult::new(vec!["a"], 1, 1, 10);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"items": ["a"], "total": 1, "page": 1, "per_page": 10, "last_page": 1})
        );
    }

    /// Test normal header generation
    #[test]
    fn test_content_range_normal() {
        let headers = calculate_content_range(0, 10, 100, "tasks");
        let value = headers.get(CONTENT_RANGE).unwrap().to_str().unwrap();
        assert_eq!(value, "tasks 0-9/100");
    }

    #[test]
    fn test_content_range_for_page() {
        let result = PaginatedResult::new(vec![(); 5], 25, 3, 10);
        let headers = result.content_range("tasks");
        assert_eq!(headers.get(CONTENT_RANGE).unwrap(), "tasks 20-24/25");
    }

    #[test]
    fn test_content_range_without_items() {
        let headers = calculate_content_range(0, 0, 0, "tasks");
        assert_eq!(headers.get(CONTENT_RANGE).unwrap(), "tasks */0");
    }

    #[test]
    fn test_content_range_handles_special_chars_gracefully() {
        let headers = calculate_content_range(0, 10, 100, "tasks\r\nInjected: evil");
        let value = headers.get(CONTENT_RANGE).unwrap().to_str().unwrap();
        assert!(!value.contains('\r'), "Should remove carriage returns");
        assert!(!value.contains('\n'), "Should remove newlines");
    }

    #[test]
    fn test_content_range_large_numbers() {
        let headers = calculate_content_range(u64::MAX - 100, 10, u64::MAX, "tasks");
        let value = headers.get(CONTENT_RANGE).unwrap().to_str().unwrap();
        assert!(value.starts_with("tasks "));
    }
}
