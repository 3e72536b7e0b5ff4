//! # Validation Module
//!
//! Input validation utilities for the reservation engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (storefront / admin surface)                          │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine operation (Rust)                                      │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (one open cart per user)                       │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kitrent_core::validation::{validate_id, validate_price_cents};
//!
//! validate_id("user_id", "550e8400-e29b-41d4-a716-446655440000").unwrap();
//! validate_price_cents(2500).unwrap();
//! ```

use crate::error::ValidationError;
use crate::MAX_CART_ITEMS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a free-form handover window string ("09:00-12:00").
const MAX_WINDOW_LEN: usize = 50;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an identifier field (user id, variant id, unit id, ...).
///
/// ## Rules
/// - Must not be empty
/// - Must be a valid UUID
///
/// ## Example
/// ```rust
/// use kitrent_core::validation::validate_id;
///
/// assert!(validate_id("unit_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_id("unit_id", "not-a-uuid").is_err());
/// assert!(validate_id("unit_id", "").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a rental price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (promotional rentals)
///
/// ## Example
/// ```rust
/// use kitrent_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());  // $10.99
/// assert!(validate_price_cents(0).is_ok());     // Free rental
/// assert!(validate_price_cents(-100).is_err()); // Invalid
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a deposit amount in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (no-deposit items)
pub fn validate_deposit_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "deposit".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size before adding another line item.
///
/// ## Rules
/// - Must not exceed MAX_CART_ITEMS (50)
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates an optional handover window string.
///
/// Free-form by design ("09:00-12:00", "after lunch"); only bounded in
/// length.
pub fn validate_window(field: &str, window: Option<&str>) -> ValidationResult<()> {
    if let Some(w) = window {
        if w.len() > MAX_WINDOW_LEN {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: format!("must be at most {MAX_WINDOW_LEN} characters"),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
