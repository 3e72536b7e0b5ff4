//! # kitrent-core: Pure Business Logic for Kitrent
//!
//! This crate is the **heart** of the reservation engine. It contains all
//! business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kitrent Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Surrounding Application                      │   │
//! │  │    Catalog UI ──► Cart UI ──► Checkout ──► Admin Desk          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kitrent-engine                               │   │
//! │  │    get_or_create_cart, confirm_cart, pickup_all, ...           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kitrent-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   dates   │  │ lifecycle │  │  refund   │  │   │
//! │  │   │  Booking  │  │  Rental   │  │  booking/ │  │  window   │  │   │
//! │  │   │   Unit    │  │  Period   │  │fulfillment│  │   calc    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kitrent-db (Database Layer)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Unit, Booking, BookingDetail, Refund, ...)
//! - [`dates`] - Inclusive rental periods and the overlap predicate
//! - [`lifecycle`] - Booking and fulfillment state machines
//! - [`refund`] - Refund-window eligibility and percentage calculation
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **No Clock**: "now" is always a parameter, never read from the system
//! 4. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 5. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use kitrent_core::dates::RentalPeriod;
//! use chrono::NaiveDate;
//!
//! let booked = RentalPeriod::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
//! ).unwrap();
//! let requested = RentalPeriod::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
//! ).unwrap();
//!
//! // Day semantics are inclusive: sharing the boundary day overlaps.
//! assert!(booked.overlaps(&requested));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dates;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod refund;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kitrent_core::Booking` instead of
// `use kitrent_core::types::Booking`

pub use dates::RentalPeriod;
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use refund::{RefundPolicy, RefundQuote};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts; a single rental rarely covers more than a
/// handful of physical items. Can be made configurable later.
pub const MAX_CART_ITEMS: usize = 50;

/// Default refund window, in hours before the earliest rental start
///
/// ## Business Reason
/// Cancelling at least this far ahead refunds 100%; any closer (but still
/// before the start day) refunds 50%. See [`refund::RefundPolicy`].
pub const DEFAULT_FULL_REFUND_HOURS: i64 = 24;
