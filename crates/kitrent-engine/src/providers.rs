//! # Collaborator Seams
//!
//! The three traits the engine consumes but does not implement: catalog
//! metadata, pricing quotes, and the transition observer. The surrounding
//! application plugs its real services in here; tests and the demo path use
//! the in-memory implementations at the bottom of this file.
//!
//! ## Seams
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     ReservationEngine                                   │
//! │                                                                         │
//! │   Catalog ──────► variant(id)            read-only metadata            │
//! │   Pricing ──────► quote(variant, period) stamped at add time,          │
//! │                                          NEVER recomputed at confirm   │
//! │   Notifier ─────► notify(&event)         fire-and-forget; failures     │
//! │                                          never affect the operation    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use kitrent_core::{Money, RentalPeriod};

// =============================================================================
// Catalog
// =============================================================================

/// Read-only variant metadata, resolved at add-to-cart time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantInfo {
    pub id: String,
    pub product_id: String,
    /// Stamped onto the line item as `product_name_snapshot`.
    pub product_name: String,
    pub active: bool,
}

/// Variant metadata lookup.
pub trait Catalog: Send + Sync {
    /// Resolves a variant. `None` for unknown ids.
    fn variant(&self, variant_id: &str) -> Option<VariantInfo>;
}

// =============================================================================
// Pricing
// =============================================================================

/// A per-period price/deposit quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub price: Money,
    pub deposit: Money,
}

/// Per-period pricing, consumed read-only.
///
/// The quote is frozen onto the line item when it enters the cart; checkout
/// never re-asks.
pub trait Pricing: Send + Sync {
    fn quote(&self, variant_id: &str, period: &RentalPeriod) -> Quote;
}

// =============================================================================
// Notifier
// =============================================================================

/// A state transition worth telling the outside world about.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BookingEvent {
    CartCreated { booking_id: String, user_id: String },
    Confirmed { booking_id: String },
    PaymentStarted { booking_id: String },
    PaymentSettled { booking_id: String },
    Completed { booking_id: String },
    CompletionUndone { booking_id: String },
    RefundRequested { booking_id: String, percentage: i64 },
    RefundSettled { booking_id: String },
    RefundFailed { booking_id: String },
}

/// Fire-and-forget observer of booking transitions.
///
/// Implementations must not panic; the engine calls `notify` after the state
/// change is durable and ignores whatever the observer does with it.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &BookingEvent);
}

// =============================================================================
// In-Memory Implementations
// =============================================================================

/// A fixed map of variants, for tests and the demo path.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    variants: HashMap<String, VariantInfo>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant registration.
    pub fn with_variant(mut self, info: VariantInfo) -> Self {
        self.variants.insert(info.id.clone(), info);
        self
    }
}

impl Catalog for InMemoryCatalog {
    fn variant(&self, variant_id: &str) -> Option<VariantInfo> {
        self.variants.get(variant_id).cloned()
    }
}

/// One daily rate and one deposit for every variant.
///
/// `price = daily_rate × inclusive rental days`.
#[derive(Debug, Clone, Copy)]
pub struct FlatPricing {
    pub daily_rate: Money,
    pub deposit: Money,
}

impl Pricing for FlatPricing {
    fn quote(&self, _variant_id: &str, period: &RentalPeriod) -> Quote {
        Quote {
            price: Money::from_cents(self.daily_rate.cents() * period.days()),
            deposit: self.deposit,
        }
    }
}

/// Logs every event through `tracing` as its JSON payload and does nothing
/// else.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &BookingEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => info!(event = %payload, "booking event"),
            Err(_) => info!(event = ?event, "booking event"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
