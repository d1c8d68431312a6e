//! Pagination parameters and the page window arithmetic.

use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use validator::Validate;

/// The largest page a client may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Pagination parameters.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// The 0-indexed page to fetch.
    page: Option<u32>,
    /// The number of elements per page.
    #[validate(range(min = 1, max = 100))]
    #[param(minimum = 1, maximum = 100)]
    page_size: Option<u32>,
}

impl PaginationParams {
    /// Constructs pagination parameters.
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self { page, page_size }
    }

    /// The requested page, first page if absent.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(0)
    }

    /// The requested page size, `default` if absent.
    pub fn page_size_or(&self, default: u32) -> u32 {
        self.page_size.unwrap_or(default)
    }
}

/// Which slice of a collection a page covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    /// Items before this page.
    pub skip: usize,
    /// Items on this page.
    pub take: usize,
    /// Whether more than a full page remains after skipping.
    pub has_more: bool,
}

impl PageWindow {
    /// Computes the window of page `page` over `total` items.
    ///
    /// `page_size` must be positive.
    pub fn new(total: usize, page: u32, page_size: u32) -> Self {
        debug_assert!(page_size > 0, "page size must be positive");
        let page_size = page_size as usize;
        let skip = page_size.saturating_mul(page as usize);
        let remaining = total.saturating_sub(skip);
        Self {
            skip,
            take: remaining.min(page_size),
            has_more: remaining > page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn seven_items_in_pages_of_five() {
        assert_eq!(
            PageWindow {
                skip: 0,
                take: 5,
                has_more: true
            },
            PageWindow::new(7, 0, 5)
        );
        assert_eq!(
            PageWindow {
                skip: 5,
                take: 2,
                has_more: false
            },
            PageWindow::new(7, 1, 5)
        );
        assert_eq!(
            PageWindow {
                skip: 10,
                take: 0,
                has_more: false
            },
            PageWindow::new(7, 2, 5)
        );
    }

    #[test]
    fn exactly_one_page_left_has_no_more() {
        let window = PageWindow::new(10, 1, 5);
        assert_eq!(5, window.take);
        assert!(!window.has_more);
    }

    #[test]
    fn empty_collection_gives_empty_window() {
        let window = PageWindow::new(0, 0, 5);
        assert_eq!(0, window.take);
        assert!(!window.has_more);
    }

    #[test]
    fn huge_page_does_not_overflow() {
        let window = PageWindow::new(3, u32::MAX, MAX_PAGE_SIZE);
        assert_eq!(0, window.take);
        assert!(!window.has_more);
    }

    #[test]
    fn page_size_out_of_range_is_invalid() {
        assert!(PaginationParams::new(Some(0), Some(0)).validate().is_err());
        assert!(PaginationParams::new(Some(0), Some(MAX_PAGE_SIZE + 1))
            .validate()
            .is_err());
        assert!(PaginationParams::new(Some(3), Some(MAX_PAGE_SIZE))
            .validate()
            .is_ok());
        assert!(PaginationParams::default().validate().is_ok());
    }

    #[test]
    fn defaults_apply_when_absent() {
        let params = PaginationParams::default();
        assert_eq!(0, params.page());
        assert_eq!(5, params.page_size_or(5));
    }

    proptest! {
        #[test]
        fn take_is_clamped_remainder(total in 0usize..10_000, page in 0u32..500, page_size in 1u32..=MAX_PAGE_SIZE) {
            let window = PageWindow::new(total, page, page_size);
            let remaining = total as i64 - page_size as i64 * page as i64;
            let expected = remaining.min(page_size as i64).max(0) as usize;
            prop_assert_eq!(expected, window.take);
            prop_assert_eq!(remaining > page_size as i64, window.has_more);
        }
    }
}
