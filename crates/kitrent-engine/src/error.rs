//! # Engine Error Types
//!
//! The caller-facing error taxonomy. Everything an operation can fail with
//! is one of these variants; lower-layer errors are mapped, never leaked
//! as strings.
//!
//! ## Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Validation        malformed input (inverted period, bad id, ...)      │
//! │  NotFound          the referenced entity does not exist                │
//! │  InvalidTransition a state-machine guard rejected the move             │
//! │  NotEligible       a refund precondition failed (with reason)          │
//! │  Unavailable       checkout failed; names every affected product       │
//! │  Conflict          lost an optimistic race - retry the operation       │
//! │  Db                persistence failure                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use kitrent_core::{CoreError, ValidationError};
use kitrent_db::DbError;

/// Errors returned by every engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed caller input.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A booking or fulfillment state-machine guard rejected the move.
    #[error("invalid transition: {message}")]
    InvalidTransition { message: String },

    /// A refund precondition failed; the reason is caller-displayable.
    #[error("refund not eligible: {reason}")]
    NotEligible { reason: String },

    /// Checkout could not bind a unit for every line item.
    ///
    /// Carries the product-name snapshot of every affected line item so the
    /// caller can tell the customer exactly what to drop.
    #[error("unavailable for the requested dates: {}", products.join(", "))]
    Unavailable { products: Vec<String> },

    /// An optimistic compare-and-set write matched zero rows: a concurrent
    /// request moved the state first. Retry the whole operation.
    #[error("conflict: a concurrent update won the race")]
    Conflict,

    /// Persistence failure.
    #[error("database error: {0}")]
    Db(DbError),
}

impl EngineError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidTransition error from a guard message.
    pub fn invalid_transition(message: impl Into<String>) -> Self {
        EngineError::InvalidTransition {
            message: message.into(),
        }
    }
}

/// Core business-rule errors map onto the taxonomy without losing context.
impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidBookingTransition { .. }
            | CoreError::InvalidFulfillmentTransition { .. } => EngineError::InvalidTransition {
                message: err.to_string(),
            },
            CoreError::NotEligible { reason } => EngineError::NotEligible { reason },
            CoreError::Validation(v) => EngineError::Validation(v),
        }
    }
}

/// Database errors map onto the taxonomy: a repository NotFound stays a
/// NotFound for the caller, everything else is a Db failure.
impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            other => EngineError::Db(other),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kitrent_core::{BookingStatus, FulfillmentStatus};

    #[test]
    fn test_core_error_mapping() {
        let err: EngineError = CoreError::InvalidBookingTransition {
            from: BookingStatus::Cart,
            to: BookingStatus::Completed,
        }
        .into();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));

        let err: EngineError = CoreError::InvalidFulfillmentTransition {
            from: FulfillmentStatus::ToPickup,
            to: FulfillmentStatus::Returned,
        }
        .into();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));

        let err: EngineError = CoreError::not_eligible("already picked up").into();
        assert!(matches!(err, EngineError::NotEligible { .. }));
    }

    #[test]
    fn test_db_not_found_stays_not_found() {
        let err: EngineError = DbError::not_found("Booking", "b-1").into();
        assert!(matches!(err, EngineError::NotFound { .. }));

        let err: EngineError = DbError::PoolExhausted.into();
        assert!(matches!(err, EngineError::Db(_)));
    }

    #[test]
    fn test_unavailable_message_lists_products() {
        let err = EngineError::Unavailable {
            products: vec!["Touring Kayak".to_string(), "4-Person Tent".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unavailable for the requested dates: Touring Kayak, 4-Person Tent"
        );
    }
}
