//! # kitrent-db: Database Layer for Kitrent
//!
//! This crate provides database access for the Kitrent reservation engine.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kitrent Data Flow                                │
//! │                                                                         │
//! │  Engine operation (confirm_cart)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kitrent-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (unit.rs,    │    │  (embedded)  │  │   │
//! │  │   │               │    │   booking.rs, │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│   refund.rs)  │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │               │    │              │  │   │
//! │  │   │ Management    │    │ CAS updates   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL mode)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (unit, booking, refund)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kitrent_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/kitrent.db");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let cart = db.bookings().get_open_cart("user-id").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::booking::{AllocationOutcome, BookingRepository};
pub use repository::refund::RefundRepository;
pub use repository::unit::UnitRepository;
