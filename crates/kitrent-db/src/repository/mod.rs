//! # Repository Module
//!
//! Database repository implementations for Kitrent.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Engine operation                                                      │
//! │       │                                                                 │
//! │       │  db.units().find_available(variant_id, &period, None)          │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  UnitRepository                                                        │
//! │  ├── find_available(&self, variant_id, period, exclude)                │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, unit)                                               │
//! │  └── set_status(&self, id, status)                                     │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Every write that the no-double-booking invariant depends on is a      │
//! │  conditional UPDATE here: the precondition is re-verified inside the   │
//! │  statement, and 0 rows affected means the caller lost the race.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`unit::UnitRepository`] - Inventory unit registry + availability resolver
//! - [`booking::BookingRepository`] - Carts, checkout allocation, fulfillment
//! - [`refund::RefundRepository`] - Refund rows and the grant transaction

pub mod booking;
pub mod refund;
pub mod unit;
