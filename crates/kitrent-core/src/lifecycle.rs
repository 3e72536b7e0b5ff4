//! # Lifecycle State Machines
//!
//! The booking and fulfillment transition tables, as pure rules. The engine
//! consults these before touching the database; the repositories repeat the
//! same guards inside their conditional UPDATEs.
//!
//! ## Booking Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Booking State Machine                              │
//! │                                                                         │
//! │   Cart ──confirm──► Confirmed ◄───────payment settled──┐                │
//! │                        │  │                            │                │
//! │                        │  └──begin payment──────► InPayment             │
//! │                        │                                                │
//! │        ┌──cancel───────┼──mark completed (all returned)──► Completed    │
//! │        ▼               │                                      │   ▲     │
//! │    Cancelled           │              undo completion─────────┘   │     │
//! │    (terminal)          │              (rewinds details)           │     │
//! │                        │                                          │     │
//! │                        └──request refund──► PendingRefund ◄───────┘     │
//! │                                               │      │                  │
//! │                     processor failed──────────┘      │                  │
//! │                     (back to Confirmed)              ▼                  │
//! │                                              SucceededRefund            │
//! │                                                 (terminal)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fulfillment Lifecycle (per BookingDetail)
//! ```text
//!   ToPickup ──pickup──► PickedUp ──return──► Returned
//!       ▲                 │    ▲                │
//!       └───undo pickup───┘    └───undo return──┘
//! ```
//! Fulfillment moves only while the parent booking is Confirmed.

use crate::error::{CoreError, CoreResult};
use crate::types::{BookingStatus, FulfillmentStatus};

// =============================================================================
// Booking Transitions
// =============================================================================

/// Whether `from -> to` is a legal booking transition.
///
/// This is the single source of truth for the table in the module docs.
pub fn booking_transition_allowed(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;

    matches!(
        (from, to),
        (Cart, Confirmed)
            | (Cart, Cancelled)
            | (Confirmed, InPayment)
            | (Confirmed, Completed)
            | (Confirmed, Cancelled)
            | (Confirmed, PendingRefund)
            | (InPayment, Confirmed)
            | (Completed, Confirmed)       // admin undo-completion
            | (Completed, PendingRefund)
            | (PendingRefund, SucceededRefund)
            | (PendingRefund, Confirmed)   // processor-failure compensation
    )
}

/// Checks a booking transition, returning the guard error on rejection.
pub fn check_booking_transition(from: BookingStatus, to: BookingStatus) -> CoreResult<()> {
    if booking_transition_allowed(from, to) {
        Ok(())
    } else {
        Err(CoreError::InvalidBookingTransition { from, to })
    }
}

// =============================================================================
// Fulfillment Actions
// =============================================================================

/// The four custody moves an operator can make on a line item.
///
/// Each action is a fixed (source, target) edge; bulk operations apply the
/// action to every detail currently in the source state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentAction {
    Pickup,
    UndoPickup,
    Return,
    UndoReturn,
}

impl FulfillmentAction {
    /// The state a detail must be in for this action to apply.
    pub const fn source(self) -> FulfillmentStatus {
        match self {
            FulfillmentAction::Pickup => FulfillmentStatus::ToPickup,
            FulfillmentAction::UndoPickup => FulfillmentStatus::PickedUp,
            FulfillmentAction::Return => FulfillmentStatus::PickedUp,
            FulfillmentAction::UndoReturn => FulfillmentStatus::Returned,
        }
    }

    /// The state the action moves a detail into.
    pub const fn target(self) -> FulfillmentStatus {
        match self {
            FulfillmentAction::Pickup => FulfillmentStatus::PickedUp,
            FulfillmentAction::UndoPickup => FulfillmentStatus::ToPickup,
            FulfillmentAction::Return => FulfillmentStatus::Returned,
            FulfillmentAction::UndoReturn => FulfillmentStatus::PickedUp,
        }
    }

    /// Operator-facing name, used in logs and error messages.
    pub const fn name(self) -> &'static str {
        match self {
            FulfillmentAction::Pickup => "pickup",
            FulfillmentAction::UndoPickup => "undo pickup",
            FulfillmentAction::Return => "return",
            FulfillmentAction::UndoReturn => "undo return",
        }
    }
}

/// Checks that a single detail in `current` state can take `action`.
///
/// Bulk operations skip this check and simply match nothing; single-detail
/// operations surface the rejected edge.
pub fn check_fulfillment_action(
    current: FulfillmentStatus,
    action: FulfillmentAction,
) -> CoreResult<()> {
    if current == action.source() {
        Ok(())
    } else {
        Err(CoreError::InvalidFulfillmentTransition {
            from: current,
            to: action.target(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use BookingStatus::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(booking_transition_allowed(Cart, Confirmed));
        assert!(booking_transition_allowed(Confirmed, Completed));
        assert!(booking_transition_allowed(Confirmed, PendingRefund));
        assert!(booking_transition_allowed(PendingRefund, SucceededRefund));
    }

    #[test]
    fn test_payment_retry_loop() {
        assert!(booking_transition_allowed(Confirmed, InPayment));
        assert!(booking_transition_allowed(InPayment, Confirmed));
        // But a payment cannot begin from a cart.
        assert!(!booking_transition_allowed(Cart, InPayment));
    }

    #[test]
    fn test_compensating_transitions() {
        // Processor failure rolls the refund request back.
        assert!(booking_transition_allowed(PendingRefund, Confirmed));
        // Admin undo-completion.
        assert!(booking_transition_allowed(Completed, Confirmed));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for to in [Cart, Confirmed, InPayment, Completed, Cancelled, PendingRefund, SucceededRefund] {
            assert!(!booking_transition_allowed(Cancelled, to));
            assert!(!booking_transition_allowed(SucceededRefund, to));
        }
    }

    #[test]
    fn test_no_skipping_states() {
        assert!(!booking_transition_allowed(Cart, Completed));
        assert!(!booking_transition_allowed(Cart, PendingRefund));
        assert!(!booking_transition_allowed(Confirmed, SucceededRefund));
    }

    #[test]
    fn test_check_reports_both_sides() {
        let err = check_booking_transition(Cart, Completed).unwrap_err();
        match err {
            CoreError::InvalidBookingTransition { from, to } => {
                assert_eq!(from, Cart);
                assert_eq!(to, Completed);
            }
            _ => panic!("expected InvalidBookingTransition"),
        }
    }

    #[test]
    fn test_fulfillment_edges() {
        use FulfillmentAction::*;
        use FulfillmentStatus::*;

        assert_eq!(Pickup.source(), ToPickup);
        assert_eq!(Pickup.target(), PickedUp);
        assert_eq!(Return.source(), PickedUp);
        assert_eq!(Return.target(), Returned);
        assert_eq!(UndoPickup.target(), ToPickup);
        assert_eq!(UndoReturn.target(), PickedUp);
    }

    #[test]
    fn test_return_straight_from_to_pickup_is_rejected() {
        let err =
            check_fulfillment_action(FulfillmentStatus::ToPickup, FulfillmentAction::Return)
                .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidFulfillmentTransition {
                from: FulfillmentStatus::ToPickup,
                to: FulfillmentStatus::Returned,
            }
        ));
    }

    #[test]
    fn test_fulfillment_action_in_matching_state() {
        assert!(check_fulfillment_action(
            FulfillmentStatus::PickedUp,
            FulfillmentAction::Return
        )
        .is_ok());
        assert!(check_fulfillment_action(
            FulfillmentStatus::Returned,
            FulfillmentAction::UndoReturn
        )
        .is_ok());
    }
}
