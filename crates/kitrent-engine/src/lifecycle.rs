//! # Booking Lifecycle Operations
//!
//! Operator- and processor-driven booking status moves: completion and its
//! undo, plus the payment hooks. Each is one status-guarded write; a missed
//! guard is a lost race, not corruption.

use tracing::debug;

use kitrent_core::lifecycle::check_booking_transition;
use kitrent_core::validation::validate_id;
use kitrent_core::{Booking, BookingStatus, FulfillmentStatus};

use crate::error::{EngineError, EngineResult};
use crate::providers::BookingEvent;
use crate::ReservationEngine;

impl ReservationEngine {
    /// Closes a rental. Valid only when the booking is Confirmed AND every
    /// line item is Returned - completion is an explicit operator action,
    /// never automatic on the last return.
    pub async fn mark_completed(&self, booking_id: &str) -> EngineResult<()> {
        validate_id("booking_id", booking_id)?;
        debug!(booking_id = %booking_id, "mark_completed");

        let booking = self.load_booking(booking_id).await?;
        check_booking_transition(booking.status, BookingStatus::Completed)?;

        let outstanding = self
            .db
            .bookings()
            .count_details_not_in(booking_id, FulfillmentStatus::Returned)
            .await?;
        if outstanding > 0 {
            return Err(EngineError::invalid_transition(format!(
                "cannot complete: {outstanding} line item(s) not returned"
            )));
        }

        let moved = self
            .db
            .bookings()
            .set_status_cas(booking_id, BookingStatus::Confirmed, BookingStatus::Completed)
            .await?;
        if !moved {
            return Err(EngineError::Conflict);
        }

        self.notifier.notify(&BookingEvent::Completed {
            booking_id: booking_id.to_string(),
        });
        Ok(())
    }

    /// Reopens a completed booking (admin): Completed→Confirmed, and every
    /// Returned line item rewinds to PickedUp.
    pub async fn undo_completion(&self, booking_id: &str) -> EngineResult<()> {
        validate_id("booking_id", booking_id)?;
        debug!(booking_id = %booking_id, "undo_completion");

        let booking = self.load_booking(booking_id).await?;
        if booking.status != BookingStatus::Completed {
            return Err(EngineError::invalid_transition(format!(
                "undo completion requires a completed booking, not {:?}",
                booking.status
            )));
        }

        if !self.db.bookings().undo_completion(booking_id).await? {
            return Err(EngineError::Conflict);
        }

        self.notifier.notify(&BookingEvent::CompletionUndone {
            booking_id: booking_id.to_string(),
        });
        Ok(())
    }

    /// Marks a payment attempt as in flight: Confirmed→InPayment.
    pub async fn begin_payment(&self, booking_id: &str) -> EngineResult<()> {
        self.payment_move(
            booking_id,
            BookingStatus::Confirmed,
            BookingStatus::InPayment,
        )
        .await?;
        self.notifier.notify(&BookingEvent::PaymentStarted {
            booking_id: booking_id.to_string(),
        });
        Ok(())
    }

    /// The processor reported the payment settled: InPayment→Confirmed.
    ///
    /// Failure lands on the same edge - the booking returns to Confirmed
    /// and the attempt can be retried.
    pub async fn payment_settled(&self, booking_id: &str) -> EngineResult<()> {
        self.payment_move(
            booking_id,
            BookingStatus::InPayment,
            BookingStatus::Confirmed,
        )
        .await?;
        self.notifier.notify(&BookingEvent::PaymentSettled {
            booking_id: booking_id.to_string(),
        });
        Ok(())
    }

    // =========================================================================
    // Shared plumbing
    // =========================================================================

    pub(crate) async fn load_booking(&self, booking_id: &str) -> EngineResult<Booking> {
        self.db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Booking", booking_id))
    }

    async fn payment_move(
        &self,
        booking_id: &str,
        from: BookingStatus,
        to: BookingStatus,
    ) -> EngineResult<()> {
        validate_id("booking_id", booking_id)?;
        debug!(booking_id = %booking_id, from = ?from, to = ?to, "payment transition");

        let booking = self.load_booking(booking_id).await?;
        if booking.status != from {
            return Err(EngineError::invalid_transition(format!(
                "payment transition {from:?} -> {to:?} on a {:?} booking",
                booking.status
            )));
        }

        if !self.db.bookings().set_status_cas(booking_id, from, to).await? {
            return Err(EngineError::Conflict);
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
