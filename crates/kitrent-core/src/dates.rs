//! # Rental Periods
//!
//! Inclusive day-granularity date ranges and the overlap predicate every
//! availability decision rests on.
//!
//! ## Inclusive-Day Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A rental occupies its unit on BOTH boundary days.                      │
//! │                                                                         │
//! │  Existing booking:      Jan 10 ██████████ Jan 12                        │
//! │  Requested period:             Jan 12 ██████████ Jan 14                 │
//! │                                   ▲                                     │
//! │                                   └── shared day ⇒ OVERLAP              │
//! │                                                                         │
//! │  Test: requestedStart ≤ existingEnd AND requestedEnd ≥ existingStart   │
//! │                                                                         │
//! │  The item comes back on the last day of a rental, but cannot be         │
//! │  handed to the next customer the same day.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// =============================================================================
// Rental Period
// =============================================================================

/// An inclusive [start, end] range of rental days.
///
/// Invariant: `start <= end`. A single-day rental has `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl RentalPeriod {
    /// Creates a period, rejecting inverted ranges.
    ///
    /// ## Example
    /// ```rust
    /// use kitrent_core::dates::RentalPeriod;
    /// use chrono::NaiveDate;
    ///
    /// let start = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    /// let end = NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();
    ///
    /// assert!(RentalPeriod::new(start, end).is_ok());
    /// assert!(RentalPeriod::new(end, start).is_err());
    /// ```
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvertedPeriod {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(RentalPeriod { start, end })
    }

    /// Creates a period from dates already known to be ordered.
    ///
    /// Used when reconstructing from persisted rows, which were validated
    /// on the way in. An inverted pair is normalized rather than panicking.
    pub fn new_unchecked(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            RentalPeriod { start: end, end: start }
        } else {
            RentalPeriod { start, end }
        }
    }

    #[inline]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[inline]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// The number of chargeable rental days (inclusive of both ends).
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The inclusive overlap test.
    ///
    /// `requestedStart ≤ existingEnd AND requestedEnd ≥ existingStart` —
    /// periods sharing even one day overlap.
    #[inline]
    pub fn overlaps(&self, other: &RentalPeriod) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    /// Whether the period starts strictly after the given day.
    ///
    /// Day granularity: a rental starting today is NOT in the future.
    #[inline]
    pub fn starts_after(&self, day: NaiveDate) -> bool {
        self.start > day
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period(s: (i32, u32, u32), e: (i32, u32, u32)) -> RentalPeriod {
        RentalPeriod::new(date(s.0, s.1, s.2), date(e.0, e.1, e.2)).unwrap()
    }

    #[test]
    fn test_rejects_inverted_period() {
        let err = RentalPeriod::new(date(2024, 1, 12), date(2024, 1, 10)).unwrap_err();
        assert!(matches!(err, ValidationError::InvertedPeriod { .. }));
    }

    #[test]
    fn test_single_day_period() {
        let p = period((2024, 1, 10), (2024, 1, 10));
        assert_eq!(p.days(), 1);
        assert!(p.overlaps(&p));
    }

    #[test]
    fn test_overlap_is_inclusive_on_boundaries() {
        let booked = period((2024, 1, 10), (2024, 1, 12));

        // Shares the end day.
        assert!(booked.overlaps(&period((2024, 1, 12), (2024, 1, 14))));
        // Shares the start day.
        assert!(booked.overlaps(&period((2024, 1, 8), (2024, 1, 10))));
        // Contained.
        assert!(booked.overlaps(&period((2024, 1, 11), (2024, 1, 11))));
        // Straddles.
        assert!(booked.overlaps(&period((2024, 1, 9), (2024, 1, 13))));
    }

    #[test]
    fn test_adjacent_periods_do_not_overlap() {
        let booked = period((2024, 1, 10), (2024, 1, 12));
        assert!(!booked.overlaps(&period((2024, 1, 13), (2024, 1, 15))));
        assert!(!booked.overlaps(&period((2024, 1, 7), (2024, 1, 9))));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let a = period((2024, 1, 10), (2024, 1, 12));
        let b = period((2024, 1, 11), (2024, 1, 13));
        assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn test_starts_after_is_strict() {
        let p = period((2024, 1, 10), (2024, 1, 12));
        assert!(p.starts_after(date(2024, 1, 9)));
        // Same-day start is not "after" - blocks refunds.
        assert!(!p.starts_after(date(2024, 1, 10)));
        assert!(!p.starts_after(date(2024, 1, 11)));
    }

    #[test]
    fn test_new_unchecked_normalizes() {
        let p = RentalPeriod::new_unchecked(date(2024, 1, 12), date(2024, 1, 10));
        assert_eq!(p.start(), date(2024, 1, 10));
        assert_eq!(p.end(), date(2024, 1, 12));
    }
}
