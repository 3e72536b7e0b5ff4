//! # Error Types
//!
//! Domain-specific error types for kitrent-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kitrent-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kitrent-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  kitrent-engine errors (separate crate)                                │
//! │  └── EngineError      - What callers see (full spec taxonomy)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → Caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (status names, hours, etc.)
//! 3. Errors are enum variants, never String
//! 4. State-machine guards always report both sides of the rejected move

use thiserror::Error;

use crate::types::{BookingStatus, FulfillmentStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Core business rule errors.
///
/// These represent rejected state-machine moves and failed refund
/// preconditions. The engine layer maps them onto its caller-facing
/// taxonomy without losing the context captured here.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A booking state-machine guard rejected the transition.
    #[error("invalid booking transition: {from:?} -> {to:?}")]
    InvalidBookingTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// A fulfillment state-machine guard rejected the move.
    ///
    /// ## When This Occurs
    /// - `return_one` on a detail still awaiting pickup
    /// - `undo_pickup` on a detail already returned
    #[error("invalid fulfillment transition: {from:?} -> {to:?}")]
    InvalidFulfillmentTransition {
        from: FulfillmentStatus,
        to: FulfillmentStatus,
    },

    /// Refund precondition failed; the reason is caller-displayable.
    #[error("refund not eligible: {reason}")]
    NotEligible { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotEligible error with the given reason.
    pub fn not_eligible(reason: impl Into<String>) -> Self {
        CoreError::NotEligible {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements. Used for early
/// validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A rental period whose end precedes its start.
    #[error("rental period end {end} precedes start {start}")]
    InvertedPeriod { start: String, end: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
