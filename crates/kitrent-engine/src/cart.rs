//! # Cart Operations
//!
//! Non-locking reservation holds: get-or-create the user's cart, add and
//! remove line items. Nothing a cart does blocks anyone else's availability.
//!
//! ## Add To Cart
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        add_to_cart(request)                             │
//! │                                                                         │
//! │  validate period/ids ──► resolve variant (Catalog)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  advisory unit pre-pick (availability resolver)                        │
//! │       ├── free unit found        ──► use it                            │
//! │       ├── all claimed right now  ──► any rentable unit (soft hint;     │
//! │       │                              checkout re-resolves anyway)      │
//! │       └── variant has NO units   ──► Unavailable                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  stamp Pricing quote + product name onto the detail (snapshot),        │
//! │  insert, recompute the cart total                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use kitrent_core::validation::{validate_cart_size, validate_id, validate_window};
use kitrent_core::{BookingDetail, FulfillmentStatus, RentalPeriod, ValidationError};
use kitrent_core::{Booking, BookingStatus};

use crate::error::{EngineError, EngineResult};
use crate::providers::BookingEvent;
use crate::ReservationEngine;

/// Request to add one line item to the caller's cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub user_id: String,
    pub variant_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Agreed handover slot, e.g. "09:00-12:00". Free-form.
    pub pickup_window: Option<String>,
    pub return_window: Option<String>,
}

impl ReservationEngine {
    /// Returns the user's open cart, creating an empty one on first access.
    ///
    /// The one-open-cart-per-user invariant is a partial unique index; when
    /// two first-accesses race, the loser re-reads the winner's row.
    pub async fn get_or_create_cart(&self, user_id: &str) -> EngineResult<Booking> {
        if user_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "user_id".to_string(),
            }
            .into());
        }

        debug!(user_id = %user_id, "get_or_create_cart");

        if let Some(cart) = self.db.bookings().get_open_cart(user_id).await? {
            return Ok(cart);
        }

        match self.db.bookings().create_cart(user_id).await {
            Ok(cart) => {
                self.notifier.notify(&BookingEvent::CartCreated {
                    booking_id: cart.id.clone(),
                    user_id: user_id.to_string(),
                });
                Ok(cart)
            }
            Err(err) if err.is_unique_violation() => {
                // Lost the creation race; the winner's cart is ours too.
                self.db
                    .bookings()
                    .get_open_cart(user_id)
                    .await?
                    .ok_or(EngineError::Conflict)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Adds a line item to the caller's cart.
    ///
    /// The unit reference recorded here is advisory: checkout re-resolves
    /// it. The price and product name are frozen now and never recomputed.
    pub async fn add_to_cart(&self, request: AddToCartRequest) -> EngineResult<BookingDetail> {
        validate_id("variant_id", &request.variant_id)?;
        validate_window("pickup_window", request.pickup_window.as_deref())?;
        validate_window("return_window", request.return_window.as_deref())?;
        let period = RentalPeriod::new(request.start_date, request.end_date)
            .map_err(EngineError::Validation)?;

        debug!(
            user_id = %request.user_id,
            variant_id = %request.variant_id,
            start = %period.start(),
            end = %period.end(),
            "add_to_cart"
        );

        let variant = self
            .catalog
            .variant(&request.variant_id)
            .filter(|v| v.active)
            .ok_or_else(|| EngineError::not_found("Variant", &request.variant_id))?;

        let cart = self.get_or_create_cart(&request.user_id).await?;

        let existing = self.db.bookings().count_details(&cart.id).await?;
        validate_cart_size(existing as usize)?;

        // Advisory pre-pick: prefer a unit free for the dates, fall back to
        // any rentable unit, hard-error only on an empty variant.
        let unit = match self
            .db
            .units()
            .find_available(&request.variant_id, &period, None)
            .await?
        {
            Some(unit) => unit,
            None => self
                .db
                .units()
                .first_rentable(&request.variant_id)
                .await?
                .ok_or_else(|| EngineError::Unavailable {
                    products: vec![variant.product_name.clone()],
                })?,
        };

        let quote = self.pricing.quote(&request.variant_id, &period);

        let detail = BookingDetail {
            id: Uuid::new_v4().to_string(),
            booking_id: cart.id.clone(),
            unit_id: unit.id,
            variant_id: request.variant_id,
            product_name_snapshot: variant.product_name,
            start_date: period.start(),
            end_date: period.end(),
            pickup_window: request.pickup_window,
            return_window: request.return_window,
            price_cents: quote.price.cents(),
            deposit_cents: quote.deposit.cents(),
            fulfillment_status: FulfillmentStatus::ToPickup,
            created_at: Utc::now(),
        };

        self.db.bookings().insert_detail(&detail).await?;
        self.db.bookings().recompute_price_total(&cart.id).await?;

        Ok(detail)
    }

    /// Removes a line item from a cart and recomputes the total.
    ///
    /// Only carts are modifiable; anything confirmed rejects the removal.
    pub async fn remove_from_cart(&self, detail_id: &str) -> EngineResult<()> {
        validate_id("detail_id", detail_id)?;

        let detail = self
            .db
            .bookings()
            .get_detail(detail_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Cart line item", detail_id))?;

        let booking = self
            .db
            .bookings()
            .get_by_id(&detail.booking_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Booking", &detail.booking_id))?;

        if !booking.is_modifiable() {
            return Err(EngineError::invalid_transition(format!(
                "cannot remove items from a {:?} booking",
                booking.status
            )));
        }
        debug_assert_eq!(booking.status, BookingStatus::Cart);

        // The delete repeats the cart guard in SQL.
        self.db.bookings().delete_detail(detail_id).await?;
        self.db
            .bookings()
            .recompute_price_total(&detail.booking_id)
            .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
