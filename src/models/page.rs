//! Pagination envelope shared by the listing operations

use serde::Serialize;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// One page of a listing plus the unpaginated total
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, skip: i64, limit: i64) -> Self {
        Page {
            items,
            total,
            skip,
            limit,
        }
    }
}

/// Clamp caller-supplied pagination to sane bounds.
///
/// Negative skips become 0; limits are forced into 1..=MAX_LIMIT so a caller
/// can neither ask for an empty page nor an unbounded one.
pub fn clamp(skip: i64, limit: i64) -> (i64, i64) {
    (skip.max(0), limit.clamp(1, MAX_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_bounds_skip_and_limit() {
        assert_eq!(clamp(-5, 20), (0, 20));
        assert_eq!(clamp(0, 0), (0, 1));
        assert_eq!(clamp(40, 500), (40, MAX_LIMIT));
        assert_eq!(clamp(10, DEFAULT_LIMIT), (10, 20));
    }
}
