//! # Refund Window Calculator
//!
//! Time-windowed refund eligibility and percentage, as a pure function of
//! "now" and the earliest rental start. The clock is always a parameter so
//! every branch is deterministic under test.
//!
//! ## The Window
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Refund Percentage Timeline (H = 24h)                   │
//! │                                                                         │
//! │  ──────────────┬──────────────────────┬──────────────────────────►      │
//! │                │                      │                    time          │
//! │     100%       │         50%          │     NOT ELIGIBLE                │
//! │                │                      │                                 │
//! │            start − H             rental start                           │
//! │                               (midnight, UTC)                           │
//! │                                                                         │
//! │  hoursUntilStart ≥ H   →  100%                                          │
//! │  0 < hoursUntilStart < H  →  50%                                        │
//! │  hoursUntilStart ≤ 0   →  NotEligible                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Eligibility preconditions beyond the window (booking Confirmed, nothing
//! picked up, no prior refund) are enforced by the engine; this module only
//! answers the time question and the arithmetic.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::DEFAULT_FULL_REFUND_HOURS;

// =============================================================================
// Refund Policy
// =============================================================================

/// Configured refund window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundPolicy {
    /// Cancelling at least this many hours before the earliest rental start
    /// refunds 100%; any later (but still before the start day) refunds 50%.
    pub full_refund_hours: i64,
}

impl Default for RefundPolicy {
    fn default() -> Self {
        RefundPolicy {
            full_refund_hours: DEFAULT_FULL_REFUND_HOURS,
        }
    }
}

/// A computed refund: the percentage granted and the resulting amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundQuote {
    pub percentage: i64,
    pub amount: Money,
}

impl RefundPolicy {
    /// The refund percentage at `now` for a rental starting on `start_day`.
    ///
    /// The rental-day boundary is midnight UTC of the start date. Returns
    /// `NotEligible` once that moment has been reached.
    pub fn percentage_at(&self, now: DateTime<Utc>, start_day: NaiveDate) -> CoreResult<i64> {
        // NaiveDate::and_hms_opt(0, 0, 0) is always Some.
        let start = start_day
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc();
        let until_start = start - now;

        if until_start >= Duration::hours(self.full_refund_hours) {
            Ok(100)
        } else if until_start > Duration::zero() {
            Ok(50)
        } else {
            Err(CoreError::not_eligible(format!(
                "rental starting {start_day} has already begun"
            )))
        }
    }

    /// Full quote: percentage plus the amount against a booking total.
    pub fn quote(
        &self,
        now: DateTime<Utc>,
        earliest_start: NaiveDate,
        price_total: Money,
    ) -> CoreResult<RefundQuote> {
        let percentage = self.percentage_at(now, earliest_start)?;
        Ok(RefundQuote {
            percentage,
            amount: price_total.apply_percentage(percentage),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn start_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    /// "now" positioned `hours` before midnight UTC of the start day.
    fn now_hours_before_start(hours: i64) -> DateTime<Utc> {
        start_day().and_hms_opt(0, 0, 0).unwrap().and_utc() - Duration::hours(hours)
    }

    #[test]
    fn test_thirty_hours_out_is_full_refund() {
        let policy = RefundPolicy::default(); // H = 24
        let pct = policy
            .percentage_at(now_hours_before_start(30), start_day())
            .unwrap();
        assert_eq!(pct, 100);
    }

    #[test]
    fn test_ten_hours_out_is_half_refund() {
        let policy = RefundPolicy::default();
        let pct = policy
            .percentage_at(now_hours_before_start(10), start_day())
            .unwrap();
        assert_eq!(pct, 50);
    }

    #[test]
    fn test_after_start_is_not_eligible() {
        let policy = RefundPolicy::default();
        let err = policy
            .percentage_at(now_hours_before_start(-2), start_day())
            .unwrap_err();
        assert!(matches!(err, CoreError::NotEligible { .. }));
    }

    #[test]
    fn test_exact_threshold_is_full_refund() {
        let policy = RefundPolicy::default();
        let pct = policy
            .percentage_at(now_hours_before_start(24), start_day())
            .unwrap();
        assert_eq!(pct, 100);
    }

    #[test]
    fn test_exact_start_moment_is_not_eligible() {
        let policy = RefundPolicy::default();
        assert!(policy
            .percentage_at(now_hours_before_start(0), start_day())
            .is_err());
    }

    #[test]
    fn test_custom_window() {
        let policy = RefundPolicy {
            full_refund_hours: 48,
        };
        // 30h out is inside a 48h window: only 50%.
        let pct = policy
            .percentage_at(now_hours_before_start(30), start_day())
            .unwrap();
        assert_eq!(pct, 50);
    }

    #[test]
    fn test_quote_amount() {
        let policy = RefundPolicy::default();
        let quote = policy
            .quote(
                now_hours_before_start(10),
                start_day(),
                Money::from_cents(19998),
            )
            .unwrap();
        assert_eq!(quote.percentage, 50);
        assert_eq!(quote.amount.cents(), 9999);
    }
}
