//! # Fulfillment Operations
//!
//! Physical custody tracking per line item: pickup, return, and the one-step
//! admin undos, in single-item and bulk form.
//!
//! ## Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ToPickup ──pickup──► PickedUp ──return──► Returned                     │
//! │      ▲                  │    ▲                │                         │
//! │      └────undo pickup───┘    └───undo return──┘                         │
//! │                                                                         │
//! │  Valid only while the parent booking is Confirmed.                     │
//! │                                                                         │
//! │  Bulk ops (pickup_all, return_all):                                    │
//! │    affect only details currently in the source state,                  │
//! │    return BulkOutcome { affected },                                    │
//! │    matching nothing is affected = 0, NEVER an error (idempotent).      │
//! │                                                                         │
//! │  Single-item ops on a detail in the wrong state: InvalidTransition.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use kitrent_core::lifecycle::{check_fulfillment_action, FulfillmentAction};
use kitrent_core::validation::validate_id;
use kitrent_core::{Booking, BookingStatus};

use crate::error::{EngineError, EngineResult};
use crate::ReservationEngine;

/// Result of a fulfillment operation: how many line items moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub affected: u64,
}

impl ReservationEngine {
    /// Hands one line item to the customer.
    pub async fn pickup_one(&self, booking_id: &str, detail_id: &str) -> EngineResult<BulkOutcome> {
        self.single_action(booking_id, detail_id, FulfillmentAction::Pickup)
            .await
    }

    /// Reverses an accidental pickup scan (admin).
    pub async fn undo_pickup(
        &self,
        booking_id: &str,
        detail_id: &str,
    ) -> EngineResult<BulkOutcome> {
        self.single_action(booking_id, detail_id, FulfillmentAction::UndoPickup)
            .await
    }

    /// Takes one line item back into the warehouse.
    pub async fn return_one(&self, booking_id: &str, detail_id: &str) -> EngineResult<BulkOutcome> {
        self.single_action(booking_id, detail_id, FulfillmentAction::Return)
            .await
    }

    /// Reverses an accidental return scan (admin).
    pub async fn undo_return(
        &self,
        booking_id: &str,
        detail_id: &str,
    ) -> EngineResult<BulkOutcome> {
        self.single_action(booking_id, detail_id, FulfillmentAction::UndoReturn)
            .await
    }

    /// Hands every still-waiting line item to the customer.
    pub async fn pickup_all(&self, booking_id: &str) -> EngineResult<BulkOutcome> {
        self.bulk_action(booking_id, FulfillmentAction::Pickup).await
    }

    /// Takes every outstanding line item back.
    pub async fn return_all(&self, booking_id: &str) -> EngineResult<BulkOutcome> {
        self.bulk_action(booking_id, FulfillmentAction::Return).await
    }

    // =========================================================================
    // Shared plumbing
    // =========================================================================

    /// Loads the booking and rejects fulfillment on anything not Confirmed.
    async fn confirmed_booking(&self, booking_id: &str) -> EngineResult<Booking> {
        let booking = self
            .db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Booking", booking_id))?;

        if booking.status != BookingStatus::Confirmed {
            return Err(EngineError::invalid_transition(format!(
                "fulfillment requires a confirmed booking, not {:?}",
                booking.status
            )));
        }

        Ok(booking)
    }

    async fn single_action(
        &self,
        booking_id: &str,
        detail_id: &str,
        action: FulfillmentAction,
    ) -> EngineResult<BulkOutcome> {
        validate_id("booking_id", booking_id)?;
        validate_id("detail_id", detail_id)?;

        debug!(booking_id = %booking_id, detail_id = %detail_id, action = action.name(), "fulfillment");

        self.confirmed_booking(booking_id).await?;

        let detail = self
            .db
            .bookings()
            .get_detail(detail_id)
            .await?
            .filter(|d| d.booking_id == booking_id)
            .ok_or_else(|| EngineError::not_found("Booking detail", detail_id))?;

        check_fulfillment_action(detail.fulfillment_status, action)?;

        let affected = self
            .db
            .bookings()
            .set_fulfillment_one(booking_id, detail_id, action.source(), action.target())
            .await?;

        if affected == 0 {
            // The guard in SQL missed after our read: someone else moved the
            // detail or the booking in between.
            return Err(EngineError::Conflict);
        }

        Ok(BulkOutcome { affected })
    }

    async fn bulk_action(
        &self,
        booking_id: &str,
        action: FulfillmentAction,
    ) -> EngineResult<BulkOutcome> {
        validate_id("booking_id", booking_id)?;

        debug!(booking_id = %booking_id, action = action.name(), "bulk fulfillment");

        self.confirmed_booking(booking_id).await?;

        let affected = self
            .db
            .bookings()
            .set_fulfillment_all(booking_id, action.source(), action.target())
            .await?;

        Ok(BulkOutcome { affected })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
