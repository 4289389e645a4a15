//! Offset pagination over the blog listing.
//!
//! The cursor is a plain offset into the total listing order. Untrusted
//! paging input is never rejected: anything unusable falls back to the
//! defaults below.

use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;

// 2^63: the first float past `i64::MAX`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page size must be greater than zero")]
    ZeroLimit,
}

/// A validated `(limit, offset)` pair handed to the page fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    limit: u32,
    offset: u64,
}

impl PageWindow {
    /// Build a window for trusted callers. The limit is not capped here; the
    /// cap only applies to client-supplied input.
    pub fn new(limit: u32, offset: u64) -> Result<Self, PaginationError> {
        if limit == 0 {
            return Err(PaginationError::ZeroLimit);
        }
        Ok(Self { limit, offset })
    }

    /// First page using the client-input policy for `limit`.
    pub fn first(limit: u32) -> Self {
        Self {
            limit: sanitize_limit(Some(i64::from(limit))),
            offset: 0,
        }
    }

    /// Normalize raw `cursor` / `limit` query parameters.
    ///
    /// `limit` outside `[1, MAX_PAGE_SIZE]` is replaced by the default rather
    /// than clamped to the nearest bound. A negative or unparsable cursor
    /// becomes zero.
    pub fn from_query(cursor: Option<&str>, limit: Option<&str>) -> Self {
        let limit = sanitize_limit(coerce_integer(limit));
        let offset = coerce_integer(cursor)
            .and_then(|value| u64::try_from(value).ok())
            .unwrap_or(0);
        Self { limit, offset }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Cursor for the page after this one, given how many rows came back.
    ///
    /// A full page means more rows may follow; a short page proves the store
    /// is exhausted. When the total is an exact multiple of the limit this
    /// costs one extra request that returns an empty page.
    pub fn next_cursor(&self, returned: usize) -> Option<u64> {
        if returned == self.limit as usize {
            self.offset.checked_add(u64::from(self.limit))
        } else {
            None
        }
    }

    /// The window starting at `cursor` with the same limit.
    pub fn at(&self, cursor: u64) -> Self {
        Self {
            limit: self.limit,
            offset: cursor,
        }
    }
}

fn sanitize_limit(value: Option<i64>) -> u32 {
    match value {
        Some(limit) if (1..=i64::from(MAX_PAGE_SIZE)).contains(&limit) => limit as u32,
        _ => DEFAULT_PAGE_SIZE,
    }
}

/// Coerce an untrusted query value to an integer.
///
/// Surrounding whitespace is ignored. Decimal and exponent forms are accepted
/// when they denote a whole number in `i64` range (`"1e1"`, `"20.0"`,
/// `"1e16"`); fractional, non-finite, out-of-range and empty values are
/// rejected.
pub fn coerce_integer(raw: Option<&str>) -> Option<i64> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }

    let value = trimmed.parse::<f64>().ok()?;
    if !value.is_finite() || value.fract() != 0.0 || !(-I64_BOUND..I64_BOUND).contains(&value) {
        return None;
    }
    Some(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parameters_use_defaults() {
        let window = PageWindow::from_query(None, None);
        assert_eq!(window.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(window.offset(), 0);
    }

    #[test]
    fn limit_outside_range_falls_back_to_default() {
        for raw in ["0", "-5", "51", "999", "abc", "", "  ", "2.5", "NaN", "inf"] {
            let window = PageWindow::from_query(None, Some(raw));
            assert_eq!(window.limit(), DEFAULT_PAGE_SIZE, "limit `{raw}`");
        }
    }

    #[test]
    fn limit_bounds_are_inclusive() {
        assert_eq!(PageWindow::from_query(None, Some("1")).limit(), 1);
        assert_eq!(PageWindow::from_query(None, Some("50")).limit(), 50);
        assert_eq!(PageWindow::from_query(None, Some(" 25 ")).limit(), 25);
        assert_eq!(PageWindow::from_query(None, Some("2e1")).limit(), 20);
    }

    #[test]
    fn invalid_cursor_becomes_zero() {
        for raw in ["-3", "x", "", "1.5", "-Infinity", "99999999999999999999999"] {
            let window = PageWindow::from_query(Some(raw), None);
            assert_eq!(window.offset(), 0, "cursor `{raw}`");
        }
        assert_eq!(PageWindow::from_query(Some("20"), None).offset(), 20);
    }

    #[test]
    fn cursor_spellings_agree() {
        for raw in ["10000000000000000", "1e16", "1.0e16", "10000000000000000.0"] {
            let window = PageWindow::from_query(Some(raw), None);
            assert_eq!(window.offset(), 10_000_000_000_000_000, "cursor `{raw}`");
        }
        assert_eq!(coerce_integer(Some("9.2e18")), Some(9_200_000_000_000_000_000));
        assert_eq!(coerce_integer(Some("9.3e18")), None);
        assert_eq!(coerce_integer(Some("-9.3e18")), None);
    }

    #[test]
    fn full_page_advances_cursor_by_limit() {
        let window = PageWindow::new(10, 20).expect("window");
        assert_eq!(window.next_cursor(10), Some(30));
        assert_eq!(window.next_cursor(5), None);
        assert_eq!(window.next_cursor(0), None);
    }

    #[test]
    fn zero_limit_is_rejected_for_trusted_callers() {
        assert_eq!(PageWindow::new(0, 0), Err(PaginationError::ZeroLimit));
        assert_eq!(PageWindow::new(200, 0).expect("window").limit(), 200);
    }

    #[test]
    fn first_page_applies_client_policy() {
        assert_eq!(PageWindow::first(0).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(PageWindow::first(80).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(PageWindow::first(6).limit(), 6);
    }
}
