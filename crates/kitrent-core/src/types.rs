//! # Domain Types
//!
//! Core domain types for the reservation engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Unit       │   │    Booking      │   │     Refund      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  variant_id     │   │  user_id        │   │  booking_id(FK) │       │
//! │  │  status         │   │  cart flag      │   │  percentage     │       │
//! │  │  label          │   │  status         │   │  amount_cents   │       │
//! │  └─────────────────┘   │  price_total    │   └─────────────────┘       │
//! │                        └────────┬────────┘                              │
//! │                                 │ owns N                                │
//! │                        ┌────────▼────────┐                              │
//! │                        │  BookingDetail  │                              │
//! │                        │  ─────────────  │                              │
//! │                        │  unit_id (FK)   │  ← soft while Cart,          │
//! │                        │  start/end date │    binding once Confirmed    │
//! │                        │  price, deposit │                              │
//! │                        │  fulfillment    │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Casing
//! Every status enum persists as a single snake_case spelling
//! (`to_pickup`, `in_payment`, ...). The legacy systems this replaces mixed
//! two casings for the same values; that is a data-migration concern only.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::RentalPeriod;
use crate::money::Money;

// =============================================================================
// Unit Status
// =============================================================================

/// Operational status of a physical inventory unit.
///
/// Only `Rentable` units participate in availability resolution. Status
/// changes are admin-driven; the engine never flips these on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// In circulation; a candidate for allocation.
    Rentable,
    /// Temporarily pulled for repair or inspection.
    UnderMaintenance,
    /// Permanently out of circulation.
    Retired,
}

// =============================================================================
// Unit
// =============================================================================

/// One physically trackable inventory item belonging to a variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Unit {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The variant (rentable SKU) this unit belongs to.
    pub variant_id: String,

    /// Optional human-readable asset tag.
    pub label: Option<String>,

    /// Operational status.
    pub status: UnitStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Unit {
    /// Whether this unit can ever be allocated.
    #[inline]
    pub fn is_rentable(&self) -> bool {
        self.status == UnitStatus::Rentable
    }
}

// =============================================================================
// Booking Status
// =============================================================================

/// Top-level booking lifecycle status.
///
/// See [`crate::lifecycle`] for the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Unconfirmed reservation hold; never blocks availability.
    Cart,
    /// Units are bound; the rental is live.
    Confirmed,
    /// A payment attempt is in flight (retriable).
    InPayment,
    /// Every unit returned, closed by an operator.
    Completed,
    /// Abandoned before confirmation.
    Cancelled,
    /// A refund was granted and awaits the payment processor.
    PendingRefund,
    /// The processor confirmed the refund.
    SucceededRefund,
}

impl BookingStatus {
    /// Whether details of a booking in this status claim their units.
    ///
    /// This is the heart of the availability rule: Cart holds and dead
    /// bookings never block, so abandoned carts cannot starve inventory
    /// and no hold TTL is needed.
    #[inline]
    pub const fn blocks_unit(self) -> bool {
        matches!(
            self,
            BookingStatus::Confirmed
                | BookingStatus::InPayment
                | BookingStatus::Completed
                | BookingStatus::PendingRefund
        )
    }

    /// Statuses from which no further transition exists.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::SucceededRefund)
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Cart
    }
}

// =============================================================================
// Delivery Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// Customer collects at the rental desk.
    StorePickup,
    /// Items are shipped out and back.
    Courier,
}

// =============================================================================
// Booking
// =============================================================================

/// A reservation: an open cart while `cart` is set, a binding rental after
/// confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    /// True while unconfirmed. Redundant with `status == Cart` but kept as
    /// its own column so the one-open-cart-per-user invariant can be a
    /// partial unique index.
    pub cart: bool,
    pub status: BookingStatus,
    pub price_total_cents: i64,
    pub delivery_method: Option<DeliveryMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Returns the booking total as Money.
    #[inline]
    pub fn price_total(&self) -> Money {
        Money::from_cents(self.price_total_cents)
    }

    /// Whether line items may still be added, removed, or rebound.
    #[inline]
    pub fn is_modifiable(&self) -> bool {
        self.status == BookingStatus::Cart
    }
}

// =============================================================================
// Fulfillment Status
// =============================================================================

/// Per-line-item physical custody state.
///
/// Moves forward (`ToPickup → PickedUp → Returned`) through pickup/return
/// operations, and one step back through the explicit admin undos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    /// Awaiting handover to the customer.
    ToPickup,
    /// In the customer's hands.
    PickedUp,
    /// Back in the warehouse.
    Returned,
}

impl Default for FulfillmentStatus {
    fn default() -> Self {
        FulfillmentStatus::ToPickup
    }
}

// =============================================================================
// Booking Detail
// =============================================================================

/// A line item: one unit, one rental period.
///
/// ## Snapshot Pattern
/// `product_name_snapshot` and the price/deposit are frozen at add-to-cart
/// time. The price is never recomputed at confirmation, and the name is what
/// an Unavailable error reports even if the catalog renames the product
/// later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BookingDetail {
    pub id: String,
    pub booking_id: String,
    /// The bound unit. A soft hint while the parent booking is a Cart;
    /// reassignable only then, binding once Confirmed.
    pub unit_id: String,
    pub variant_id: String,
    pub product_name_snapshot: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Agreed handover slot, e.g. "09:00-12:00". Free-form.
    pub pickup_window: Option<String>,
    pub return_window: Option<String>,
    pub price_cents: i64,
    pub deposit_cents: i64,
    pub fulfillment_status: FulfillmentStatus,
    pub created_at: DateTime<Utc>,
}

impl BookingDetail {
    /// The rental period of this line item.
    ///
    /// Dates are validated on the way in, so reconstruction cannot fail.
    pub fn period(&self) -> RentalPeriod {
        RentalPeriod::new_unchecked(self.start_date, self.end_date)
    }

    /// Returns the rental price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the deposit as Money.
    #[inline]
    pub fn deposit(&self) -> Money {
        Money::from_cents(self.deposit_cents)
    }
}

// =============================================================================
// Refund
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    /// Granted by the engine, awaiting the payment processor.
    Pending,
    /// Confirmed by the payment processor.
    Succeeded,
}

/// A granted refund. At most one Pending/Succeeded refund exists per booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Refund {
    pub id: String,
    pub booking_id: String,
    pub status: RefundStatus,
    /// 100 or 50, per the refund window.
    pub percentage: i64,
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Refund {
    /// Returns the refund amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_statuses() {
        assert!(BookingStatus::Confirmed.blocks_unit());
        assert!(BookingStatus::InPayment.blocks_unit());
        assert!(BookingStatus::Completed.blocks_unit());
        assert!(BookingStatus::PendingRefund.blocks_unit());

        // Cart holds and dead bookings never block availability.
        assert!(!BookingStatus::Cart.blocks_unit());
        assert!(!BookingStatus::Cancelled.blocks_unit());
        assert!(!BookingStatus::SucceededRefund.blocks_unit());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::SucceededRefund.is_terminal());
        // Completed is not terminal: undo-completion and refunds exist.
        assert!(!BookingStatus::Completed.is_terminal());
    }

    #[test]
    fn test_status_defaults() {
        assert_eq!(BookingStatus::default(), BookingStatus::Cart);
        assert_eq!(FulfillmentStatus::default(), FulfillmentStatus::ToPickup);
    }
}
