//! # Refund Operations
//!
//! The time-windowed refund request plus the two processor outcome hooks.
//!
//! ## Preconditions (all reported as NotEligible)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      request_refund(booking_id)                         │
//! │                                                                         │
//! │  booking Confirmed?            ── no ──► NotEligible                   │
//! │  no refund row yet?            ── no ──► NotEligible                   │
//! │  every item still ToPickup?    ── no ──► NotEligible                   │
//! │  earliest start in the future? ── no ──► NotEligible                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  percentage from RefundPolicy (≥H hours ⇒ 100, inside ⇒ 50)            │
//! │  amount = priceTotal × percentage / 100 (half-up, integer cents)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  one transaction: INSERT Refund(Pending)                               │
//! │                 + booking Confirmed→PendingRefund (guarded)            │
//! │  guard missed ⇒ Conflict                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use kitrent_core::validation::validate_id;
use kitrent_core::{BookingStatus, FulfillmentStatus, Refund, RefundStatus};

use crate::error::{EngineError, EngineResult};
use crate::providers::BookingEvent;
use crate::ReservationEngine;

impl ReservationEngine {
    /// Requests a refund for a confirmed, untouched booking.
    ///
    /// On success the Pending refund row and the PendingRefund flip are
    /// already durable; the payment processor is told out of band and
    /// reports back through [`refund_settled`](Self::refund_settled) or
    /// [`refund_failed`](Self::refund_failed).
    pub async fn request_refund(&self, booking_id: &str) -> EngineResult<Refund> {
        validate_id("booking_id", booking_id)?;
        debug!(booking_id = %booking_id, "request_refund");

        let booking = self.load_booking(booking_id).await?;

        if booking.status != BookingStatus::Confirmed {
            return Err(EngineError::NotEligible {
                reason: format!("booking is {:?}, not confirmed", booking.status),
            });
        }

        if self.db.refunds().active_exists(booking_id).await? {
            return Err(EngineError::NotEligible {
                reason: "a refund already exists for this booking".to_string(),
            });
        }

        let touched = self
            .db
            .bookings()
            .count_details_not_in(booking_id, FulfillmentStatus::ToPickup)
            .await?;
        if touched > 0 {
            return Err(EngineError::NotEligible {
                reason: format!("{touched} line item(s) already picked up"),
            });
        }

        let earliest = self
            .db
            .bookings()
            .earliest_start(booking_id)
            .await?
            .ok_or_else(|| EngineError::NotEligible {
                reason: "booking has no line items".to_string(),
            })?;

        // The window calculation also rejects rentals that already started.
        let quote = self
            .refund_policy
            .quote(Utc::now(), earliest, booking.price_total())?;

        let now = Utc::now();
        let refund = Refund {
            id: Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            status: RefundStatus::Pending,
            percentage: quote.percentage,
            amount_cents: quote.amount.cents(),
            created_at: now,
            updated_at: now,
        };

        if !self.db.refunds().grant(&refund).await? {
            return Err(EngineError::Conflict);
        }

        self.notifier.notify(&BookingEvent::RefundRequested {
            booking_id: booking_id.to_string(),
            percentage: refund.percentage,
        });
        Ok(refund)
    }

    /// The processor confirmed the payout: PendingRefund→SucceededRefund,
    /// refund row Pending→Succeeded.
    pub async fn refund_settled(&self, booking_id: &str) -> EngineResult<()> {
        validate_id("booking_id", booking_id)?;
        debug!(booking_id = %booking_id, "refund_settled");

        self.load_booking(booking_id).await?;

        if !self.db.refunds().settle(booking_id).await? {
            return Err(EngineError::Conflict);
        }

        self.notifier.notify(&BookingEvent::RefundSettled {
            booking_id: booking_id.to_string(),
        });
        Ok(())
    }

    /// The processor rejected the payout: the booking returns to Confirmed
    /// and the pending refund row is removed so a new request is possible.
    pub async fn refund_failed(&self, booking_id: &str) -> EngineResult<()> {
        validate_id("booking_id", booking_id)?;
        debug!(booking_id = %booking_id, "refund_failed");

        self.load_booking(booking_id).await?;

        if !self.db.refunds().fail(booking_id).await? {
            return Err(EngineError::Conflict);
        }

        self.notifier.notify(&BookingEvent::RefundFailed {
            booking_id: booking_id.to_string(),
        });
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::AddToCartRequest;
    use crate::testutil::{seed_unit, test_engine, VARIANT_KAYAK};
    use chrono::Duration;
    use kitrent_core::RefundPolicy;
    use kitrent_db::Database;

    /// A confirmed single-item booking starting `days_ahead` days from now.
    async fn confirmed_booking(
        engine: &crate::ReservationEngine,
        db: &Database,
        days_ahead: i64,
    ) -> String {
        seed_unit(db, VARIANT_KAYAK, 1).await;
        let start = (Utc::now() + Duration::days(days_ahead)).date_naive();
        let cart = engine.get_or_create_cart("user-1").await.unwrap();
        engine
            .add_to_cart(AddToCartRequest {
                user_id: "user-1".to_string(),
                variant_id: VARIANT_KAYAK.to_string(),
                start_date: start,
                end_date: start + Duration::days(2),
                pickup_window: None,
                return_window: None,
            })
            .await
            .unwrap();
        engine.confirm_cart(&cart.id).await.unwrap();
        cart.id
    }

    #[tokio::test]
    async fn test_full_refund_far_ahead() {
        let (engine, db) = test_engine().await;
        // Starting in 3 days: always ≥ 24h before UTC midnight of the start.
        let booking_id = confirmed_booking(&engine, &db, 3).await;

        let refund = engine.request_refund(&booking_id).await.unwrap();
        assert_eq!(refund.percentage, 100);
        // 3 inclusive days × $15.00, fully refunded.
        assert_eq!(refund.amount_cents, 4500);
        assert_eq!(refund.status, RefundStatus::Pending);

        let booking = db.bookings().get_by_id(&booking_id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::PendingRefund);
    }

    #[tokio::test]
    async fn test_half_refund_inside_window() {
        let (engine, db) = test_engine().await;
        // A 48h window puts a tomorrow-start inside it deterministically.
        let engine = engine.with_refund_policy(RefundPolicy {
            full_refund_hours: 48,
        });
        let booking_id = confirmed_booking(&engine, &db, 1).await;

        let refund = engine.request_refund(&booking_id).await.unwrap();
        assert_eq!(refund.percentage, 50);
        assert_eq!(refund.amount_cents, 2250);
    }

    #[tokio::test]
    async fn test_started_rental_is_not_eligible() {
        let (engine, db) = test_engine().await;
        // Starts today: the window has closed.
        let booking_id = confirmed_booking(&engine, &db, 0).await;

        let err = engine.request_refund(&booking_id).await.unwrap_err();
        assert!(matches!(err, EngineError::NotEligible { .. }));
    }

    #[tokio::test]
    async fn test_picked_up_item_blocks_refund() {
        let (engine, db) = test_engine().await;
        let booking_id = confirmed_booking(&engine, &db, 3).await;

        engine.pickup_all(&booking_id).await.unwrap();

        let err = engine.request_refund(&booking_id).await.unwrap_err();
        match err {
            EngineError::NotEligible { reason } => {
                assert!(reason.contains("picked up"), "reason: {reason}")
            }
            other => panic!("expected NotEligible, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_second_request_blocked_by_existing_refund() {
        let (engine, db) = test_engine().await;
        let booking_id = confirmed_booking(&engine, &db, 3).await;

        engine.request_refund(&booking_id).await.unwrap();

        let err = engine.request_refund(&booking_id).await.unwrap_err();
        assert!(matches!(err, EngineError::NotEligible { .. }));
    }

    #[tokio::test]
    async fn test_settle_walks_to_terminal_state() {
        let (engine, db) = test_engine().await;
        let booking_id = confirmed_booking(&engine, &db, 3).await;

        engine.request_refund(&booking_id).await.unwrap();
        engine.refund_settled(&booking_id).await.unwrap();

        let booking = db.bookings().get_by_id(&booking_id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::SucceededRefund);
        let refund = db
            .refunds()
            .get_by_booking(&booking_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refund.status, RefundStatus::Succeeded);

        // Terminal: nothing left to settle.
        let err = engine.refund_settled(&booking_id).await.unwrap_err();
        assert!(matches!(err, EngineError::Conflict));
    }

    #[tokio::test]
    async fn test_failed_refund_compensates_and_allows_retry() {
        let (engine, db) = test_engine().await;
        let booking_id = confirmed_booking(&engine, &db, 3).await;

        engine.request_refund(&booking_id).await.unwrap();
        engine.refund_failed(&booking_id).await.unwrap();

        let booking = db.bookings().get_by_id(&booking_id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);

        // The pending row is gone: a fresh request succeeds.
        let refund = engine.request_refund(&booking_id).await.unwrap();
        assert_eq!(refund.status, RefundStatus::Pending);
    }

    #[tokio::test]
    async fn test_refund_on_cart_is_not_eligible() {
        let (engine, _db) = test_engine().await;
        let cart = engine.get_or_create_cart("user-1").await.unwrap();

        let err = engine.request_refund(&cart.id).await.unwrap_err();
        assert!(matches!(err, EngineError::NotEligible { .. }));
    }
}
