//! # kitrent-engine: Reservation Operations for Kitrent
//!
//! The operation surface the surrounding application links against. Every
//! method on [`ReservationEngine`] orchestrates the pure rules in
//! `kitrent-core` against the repositories in `kitrent-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kitrent Architecture                             │
//! │                                                                         │
//! │  Surrounding application (storefront, admin desk, payment webhooks)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ kitrent-engine (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌─────────────┐ ┌────────────┐    │   │
//! │  │   │   cart   │ │ checkout │ │ fulfillment │ │   refund   │    │   │
//! │  │   │ add/rm   │ │ confirm  │ │ pickup/     │ │ request/   │    │   │
//! │  │   │ items    │ │ allocate │ │ return      │ │ settle     │    │   │
//! │  │   └──────────┘ └──────────┘ └─────────────┘ └────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   Seams: Catalog, Pricing, Notifier (providers.rs)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                          │                                      │
//! │       ▼                          ▼                                      │
//! │  kitrent-core (rules)       kitrent-db (repositories, CAS writes)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kitrent_db::{Database, DbConfig};
//! use kitrent_engine::{ReservationEngine, InMemoryCatalog, FlatPricing, LogNotifier};
//!
//! let db = Database::new(DbConfig::new("./kitrent.db")).await?;
//! let engine = ReservationEngine::new(
//!     db,
//!     Arc::new(catalog),
//!     Arc::new(pricing),
//!     Arc::new(LogNotifier),
//! );
//!
//! let cart = engine.get_or_create_cart("user-1").await?;
//! engine.add_to_cart(request).await?;
//! let booking_id = engine.confirm_cart(&cart.id).await?;
//! ```

use std::sync::Arc;

use kitrent_core::RefundPolicy;
use kitrent_db::Database;

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod fulfillment;
pub mod lifecycle;
pub mod providers;
pub mod refund;

// =============================================================================
// Re-exports
// =============================================================================

pub use cart::AddToCartRequest;
pub use error::{EngineError, EngineResult};
pub use fulfillment::BulkOutcome;
pub use providers::{
    BookingEvent, Catalog, FlatPricing, InMemoryCatalog, LogNotifier, Notifier, Pricing, Quote,
    VariantInfo,
};

// =============================================================================
// Reservation Engine
// =============================================================================

/// The reservation engine: carts, checkout allocation, fulfillment custody,
/// and refunds, behind one handle.
///
/// Cheap to clone (the database handle is a pool, the seams are `Arc`s);
/// operations take `&self` and are safe to call concurrently.
#[derive(Clone)]
pub struct ReservationEngine {
    pub(crate) db: Database,
    pub(crate) catalog: Arc<dyn Catalog>,
    pub(crate) pricing: Arc<dyn Pricing>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) refund_policy: RefundPolicy,
}

impl ReservationEngine {
    /// Creates an engine with the default refund policy.
    pub fn new(
        db: Database,
        catalog: Arc<dyn Catalog>,
        pricing: Arc<dyn Pricing>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        ReservationEngine {
            db,
            catalog,
            pricing,
            notifier,
            refund_policy: RefundPolicy::default(),
        }
    }

    /// Overrides the refund window policy.
    pub fn with_refund_policy(mut self, policy: RefundPolicy) -> Self {
        self.refund_policy = policy;
        self
    }
}

// =============================================================================
// Test Support
// =============================================================================
