//! # Checkout
//!
//! Turns a cart into a binding reservation: the all-or-nothing allocation
//! plus the optimistic Cart→Confirmed flip.
//!
//! The heavy lifting is the single transaction in
//! `BookingRepository::allocate_and_confirm`; this module owns the
//! preconditions and the error mapping.

use tracing::debug;

use kitrent_core::lifecycle::check_booking_transition;
use kitrent_core::{BookingStatus, ValidationError};
use kitrent_core::validation::validate_id;
use kitrent_db::AllocationOutcome;

use crate::error::{EngineError, EngineResult};
use crate::providers::BookingEvent;
use crate::ReservationEngine;

impl ReservationEngine {
    /// Confirms a cart: binds a free unit to every line item and flips the
    /// booking to Confirmed, all inside one transaction.
    ///
    /// ## Errors
    /// - `Unavailable { products }` - some line item had no free unit for
    ///   its dates; nothing was persisted and the cart is untouched
    /// - `Conflict` - another request moved the booking out of Cart first;
    ///   retry
    /// - `InvalidTransition` - the booking is not a cart
    pub async fn confirm_cart(&self, cart_id: &str) -> EngineResult<String> {
        validate_id("cart_id", cart_id)?;

        debug!(booking_id = %cart_id, "confirm_cart");

        let booking = self
            .db
            .bookings()
            .get_by_id(cart_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Booking", cart_id))?;

        check_booking_transition(booking.status, BookingStatus::Confirmed)?;

        if self.db.bookings().count_details(cart_id).await? == 0 {
            return Err(ValidationError::Required {
                field: "cart line items".to_string(),
            }
            .into());
        }

        match self.db.bookings().allocate_and_confirm(cart_id).await? {
            AllocationOutcome::Confirmed => {
                self.notifier.notify(&BookingEvent::Confirmed {
                    booking_id: cart_id.to_string(),
                });
                Ok(cart_id.to_string())
            }
            AllocationOutcome::Unavailable { products } => {
                Err(EngineError::Unavailable { products })
            }
            AllocationOutcome::LostRace => Err(EngineError::Conflict),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
