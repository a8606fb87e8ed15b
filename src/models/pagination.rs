use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The `?page=N` query string of listing pages.
///
/// Kept as a string so that garbage like `?page=abc` falls back to the first
/// page instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page
            .as_ref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(1)
    }
}

/// One page of a listing plus the numbers a pager needs.
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_num: Option<i64>,
    pub next_num: Option<i64>,
}

/// Row offset of `page`; pages start at 1.
pub fn offset(page: i64, per_page: i64) -> Result<i64, AppError> {
    if page < 1 || per_page < 1 {
        return Err(AppError::NotFound("Page not found".into()));
    }
    (page - 1)
        .checked_mul(per_page)
        .ok_or_else(|| AppError::NotFound("Page not found".into()))
}

impl<T> Page<T> {
    /// Wraps a fetched slice. An empty page past the first one does not exist.
    pub fn new(items: Vec<T>, page: i64, per_page: i64, total: i64) -> Result<Self, AppError> {
        offset(page, per_page)?;
        if items.is_empty() && page != 1 {
            return Err(AppError::NotFound("Page not found".into()));
        }

        let pages = if total <= 0 { 0 } else { (total - 1) / per_page + 1 };
        let has_prev = page > 1;
        let has_next = page < pages;
        Ok(Self {
            items,
            page,
            per_page,
            total,
            pages,
            has_prev,
            has_next,
            prev_num: has_prev.then(|| page - 1),
            next_num: if has_next { page.checked_add(1) } else { None },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_page_query_defaults_to_first_page() {
        assert_eq!(PageQuery::default().page(), 1);
        assert_eq!(PageQuery { page: Some("abc".into()) }.page(), 1);
        assert_eq!(PageQuery { page: Some("4".into()) }.page(), 4);
        assert_eq!(PageQuery { page: Some("-2".into()) }.page(), -2);
    }

    #[test]
    fn test_offset() {
        assert_eq!(offset(1, 3).unwrap(), 0);
        assert_eq!(offset(3, 3).unwrap(), 6);
        assert!(matches!(offset(0, 3), Err(AppError::NotFound(_))));
        assert!(matches!(offset(-1, 3), Err(AppError::NotFound(_))));
        assert!(matches!(offset(1, 0), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_huge_page_number_is_not_found() {
        let page = PageQuery { page: Some(i64::MAX.to_string()) }.page();
        assert_eq!(page, i64::MAX);
        assert!(matches!(offset(page, 3), Err(AppError::NotFound(_))));
        assert!(matches!(
            Page::<u8>::new(Vec::new(), i64::MAX, 3, 7),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_page_count_with_large_page_size() {
        let page = Page::new(vec![1u8], 1, i64::MAX, 1).unwrap();
        assert_eq!(page.pages, 1);
        assert!(!page.has_next);
    }

    #[test]
    fn test_middle_page_numbers() {
        let page = Page::new(vec!['d', 'e', 'f'], 2, 3, 7).unwrap();
        assert_eq!(page.pages, 3);
        assert!(page.has_prev);
        assert!(page.has_next);
        assert_eq!(page.prev_num, Some(1));
        assert_eq!(page.next_num, Some(3));
    }

    #[test]
    fn test_last_page_numbers() {
        let page = Page::new(vec!['g'], 3, 3, 7).unwrap();
        assert!(!page.has_next);
        assert_eq!(page.next_num, None);
    }

    #[test]
    fn test_empty_first_page_is_valid() {
        let page: Page<u8> = Page::new(Vec::new(), 1, 3, 0).unwrap();
        assert_eq!(page.pages, 0);
        assert!(!page.has_prev);
        assert!(!page.has_next);
    }

    #[test]
    fn test_empty_later_page_is_not_found() {
        let result: Result<Page<u8>, _> = Page::new(Vec::new(), 5, 3, 7);
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
