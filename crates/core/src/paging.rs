//! Page arguments shared by the paged listings.

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::errors::{Error, Result, ValidationError};

/// Validates a 0-based page index and clamps the page size.
///
/// A size of zero or less falls back to [`DEFAULT_PAGE_SIZE`]; larger sizes
/// are capped at [`MAX_PAGE_SIZE`].
pub fn normalize_page(page: i64, page_size: i64) -> Result<(i64, i64)> {
    if page < 0 {
        return Err(Error::Validation(ValidationError::InvalidInput(format!(
            "Page index must not be negative (got {})",
            page
        ))));
    }
    let page_size = if page_size <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size.min(MAX_PAGE_SIZE)
    };
    Ok((page, page_size))
}

/// Rows skipped before `page`. Saturates instead of overflowing on huge indexes.
pub fn page_offset(page: i64, page_size: i64) -> i64 {
    page.saturating_mul(page_size)
}
