//! Add-compare-select
//!
//! The additions are done by the caller (path metric plus branch metric for each of the two
//! predecessors); this module holds the compare-select decision shared by every butterfly.

use crate::Bit;

/// Returns the smaller of two candidate path metrics and the survivor bit.
///
/// # Parameters
///
/// - `a`: Candidate metric through the predecessor whose most significant state bit is `0`.
///
/// - `b`: Candidate metric through the predecessor whose most significant state bit is `1`.
///
/// # Returns
///
/// - `(a, Bit::Zero)` if `a < b`.
///
/// - `(b, Bit::One)` otherwise, so that ties go to the second candidate.
///
/// # Examples
///
/// ```
/// use viterbi::{add_compare_select, Bit};
///
/// assert_eq!(add_compare_select(3, 5), (3, Bit::Zero));
/// assert_eq!(add_compare_select(5, 3), (3, Bit::One));
/// assert_eq!(add_compare_select(4, 4), (4, Bit::One));
/// ```
#[must_use]
pub fn add_compare_select(a: u32, b: u32) -> (u32, Bit) {
    if a < b {
        (a, Bit::Zero)
    } else {
        (b, Bit::One)
    }
}

#[cfg(test)]
mod tests_of_add_compare_select {
    use super::*;
    use Bit::{One, Zero};

    #[test]
    fn test_add_compare_select() {
        assert_eq!(add_compare_select(0, 1), (0, Zero));
        assert_eq!(add_compare_select(1, 0), (0, One));
        assert_eq!(add_compare_select(0, 0), (0, One));
        assert_eq!(add_compare_select(u32::MAX, u32::MAX - 1), (u32::MAX - 1, One));
        for a in 0 .. 16 {
            for b in 0 .. 16 {
                let (min, flag) = add_compare_select(a, b);
                assert_eq!(min, a.min(b));
                assert_eq!(flag == One, b <= a);
            }
        }
    }
}
