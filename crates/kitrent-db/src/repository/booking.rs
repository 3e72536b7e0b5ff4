//! # Booking Repository
//!
//! Database operations for bookings and their line items: cart rows, the
//! checkout allocation transaction, status compare-and-set flips, and the
//! guarded fulfillment updates.
//!
//! ## Checkout Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  allocate_and_confirm(booking_id)                       │
//! │                                                                         │
//! │  BEGIN TRANSACTION                                                     │
//! │     │                                                                   │
//! │     ▼  for each detail of the cart:                                     │
//! │  re-resolve a free unit (excluding the detail's own claim AND          │
//! │  units already taken by an earlier sibling for overlapping dates)      │
//! │     │                                                                   │
//! │     ├── none free ──► collect product name, keep scanning              │
//! │     │                                                                   │
//! │     └── found ──► conditional UPDATE binds the unit, re-verifying      │
//! │                   in the SAME statement that no blocking overlap       │
//! │                   exists ("bind X to Y only if Y is still free")       │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  any product unresolved?  ──► ROLLBACK, Unavailable { products }       │
//! │     │                          (zero mutation persists)                │
//! │     ▼                                                                   │
//! │  UPDATE bookings SET status='confirmed', cart=0                        │
//! │  WHERE id=? AND status='cart'        ◄── the optimistic CAS flip       │
//! │     │                                                                   │
//! │     ├── 0 rows ──► ROLLBACK, LostRace (caller maps to Conflict)        │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  reset every detail to to_pickup, COMMIT                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::unit::available_units;
use kitrent_core::{Booking, BookingDetail, BookingStatus, FulfillmentStatus, RentalPeriod};

/// Result of the checkout allocation transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationOutcome {
    /// Every detail bound, booking flipped to Confirmed.
    Confirmed,
    /// At least one line item had no free unit; nothing was persisted.
    /// Carries the product-name snapshots of every affected line item.
    Unavailable { products: Vec<String> },
    /// The Cart→Confirmed flip matched zero rows: another request moved the
    /// booking first. Nothing was persisted.
    LostRace,
}

/// Repository for booking and booking-detail database operations.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    // =========================================================================
    // Bookings
    // =========================================================================

    /// Gets a booking by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Booking>> {
        let booking: Option<Booking> = sqlx::query_as(
            r#"
            SELECT id, user_id, cart, status, price_total_cents, delivery_method,
                   created_at, updated_at, confirmed_at
            FROM bookings
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    /// Gets the user's open cart, if one exists.
    pub async fn get_open_cart(&self, user_id: &str) -> DbResult<Option<Booking>> {
        let booking: Option<Booking> = sqlx::query_as(
            r#"
            SELECT id, user_id, cart, status, price_total_cents, delivery_method,
                   created_at, updated_at, confirmed_at
            FROM bookings
            WHERE user_id = ?1 AND cart = 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    /// Creates a new empty cart booking for a user.
    ///
    /// The partial unique index on `bookings(user_id) WHERE cart = 1` rejects
    /// a second open cart; the engine turns that `UniqueViolation` into a
    /// re-read of the winner's row.
    pub async fn create_cart(&self, user_id: &str) -> DbResult<Booking> {
        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            cart: true,
            status: BookingStatus::Cart,
            price_total_cents: 0,
            delivery_method: None,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
        };

        debug!(booking_id = %booking.id, user_id = %user_id, "Creating cart");

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, user_id, cart, status, price_total_cents, delivery_method,
                created_at, updated_at, confirmed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.user_id)
        .bind(booking.cart)
        .bind(booking.status)
        .bind(booking.price_total_cents)
        .bind(booking.delivery_method)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .bind(booking.confirmed_at)
        .execute(&self.pool)
        .await?;

        Ok(booking)
    }

    /// Status-guarded booking status update (compare-and-set).
    ///
    /// Returns `true` when the row moved, `false` when the booking was not in
    /// `from` anymore (or doesn't exist) - the caller lost the race.
    pub async fn set_status_cas(
        &self,
        booking_id: &str,
        from: BookingStatus,
        to: BookingStatus,
    ) -> DbResult<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE bookings SET status = ?3, updated_at = ?4
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(booking_id)
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let moved = result.rows_affected() > 0;
        if moved {
            info!(booking_id = %booking_id, from = ?from, to = ?to, "Booking status changed");
        }
        Ok(moved)
    }

    // =========================================================================
    // Booking Details (line items)
    // =========================================================================

    /// Inserts a line item.
    ///
    /// ## Snapshot Pattern
    /// The product name and the price/deposit quote arrive already frozen on
    /// the detail; they are never recomputed from the catalog afterwards.
    pub async fn insert_detail(&self, detail: &BookingDetail) -> DbResult<()> {
        debug!(
            booking_id = %detail.booking_id,
            variant_id = %detail.variant_id,
            unit_id = %detail.unit_id,
            "Inserting booking detail"
        );

        sqlx::query(
            r#"
            INSERT INTO booking_details (
                id, booking_id, unit_id, variant_id, product_name_snapshot,
                start_date, end_date, pickup_window, return_window,
                price_cents, deposit_cents, fulfillment_status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&detail.id)
        .bind(&detail.booking_id)
        .bind(&detail.unit_id)
        .bind(&detail.variant_id)
        .bind(&detail.product_name_snapshot)
        .bind(detail.start_date)
        .bind(detail.end_date)
        .bind(&detail.pickup_window)
        .bind(&detail.return_window)
        .bind(detail.price_cents)
        .bind(detail.deposit_cents)
        .bind(detail.fulfillment_status)
        .bind(detail.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a line item by ID.
    pub async fn get_detail(&self, detail_id: &str) -> DbResult<Option<BookingDetail>> {
        let detail: Option<BookingDetail> = sqlx::query_as(
            r#"
            SELECT id, booking_id, unit_id, variant_id, product_name_snapshot,
                   start_date, end_date, pickup_window, return_window,
                   price_cents, deposit_cents, fulfillment_status, created_at
            FROM booking_details
            WHERE id = ?1
            "#,
        )
        .bind(detail_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(detail)
    }

    /// Gets all line items of a booking, in insertion order.
    pub async fn get_details(&self, booking_id: &str) -> DbResult<Vec<BookingDetail>> {
        let details: Vec<BookingDetail> = sqlx::query_as(
            r#"
            SELECT id, booking_id, unit_id, variant_id, product_name_snapshot,
                   start_date, end_date, pickup_window, return_window,
                   price_cents, deposit_cents, fulfillment_status, created_at
            FROM booking_details
            WHERE booking_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    /// Counts the line items of a booking.
    pub async fn count_details(&self, booking_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM booking_details WHERE booking_id = ?1")
                .bind(booking_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Counts line items NOT in the given fulfillment state.
    ///
    /// Zero means "every detail is in `status`" - the guard behind
    /// mark_completed (all Returned) and the refund preconditions
    /// (all ToPickup).
    pub async fn count_details_not_in(
        &self,
        booking_id: &str,
        status: FulfillmentStatus,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM booking_details
            WHERE booking_id = ?1 AND fulfillment_status <> ?2
            "#,
        )
        .bind(booking_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Earliest rental start among a booking's line items.
    pub async fn earliest_start(&self, booking_id: &str) -> DbResult<Option<NaiveDate>> {
        let start: Option<NaiveDate> = sqlx::query_scalar(
            "SELECT MIN(start_date) FROM booking_details WHERE booking_id = ?1",
        )
        .bind(booking_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(start)
    }

    /// Deletes a line item, guarded on the parent still being a cart.
    ///
    /// Confirmed bookings are immutable at this level; the guard lives in the
    /// statement so a concurrent confirm can't race the delete.
    pub async fn delete_detail(&self, detail_id: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM booking_details
            WHERE id = ?1
              AND EXISTS (
                  SELECT 1 FROM bookings b
                  WHERE b.id = booking_details.booking_id AND b.status = 'cart'
              )
            "#,
        )
        .bind(detail_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart line item", detail_id));
        }

        Ok(())
    }

    /// Recomputes a booking's price total from its line items.
    ///
    /// Deposits are held, not charged, so they stay out of the total.
    ///
    /// ## When To Call
    /// After every add/remove on a cart.
    pub async fn recompute_price_total(&self, booking_id: &str) -> DbResult<i64> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                price_total_cents = (
                    SELECT COALESCE(SUM(price_cents), 0)
                    FROM booking_details WHERE booking_id = ?1
                ),
                updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(booking_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking", booking_id));
        }

        let total: i64 =
            sqlx::query_scalar("SELECT price_total_cents FROM bookings WHERE id = ?1")
                .bind(booking_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(total)
    }

    // =========================================================================
    // Checkout Allocation
    // =========================================================================

    /// The all-or-nothing checkout transaction. See the module docs.
    pub async fn allocate_and_confirm(&self, booking_id: &str) -> DbResult<AllocationOutcome> {
        debug!(booking_id = %booking_id, "Allocating units for checkout");

        let mut tx = self.pool.begin().await?;

        let details: Vec<BookingDetail> = sqlx::query_as(
            r#"
            SELECT id, booking_id, unit_id, variant_id, product_name_snapshot,
                   start_date, end_date, pickup_window, return_window,
                   price_cents, deposit_cents, fulfillment_status, created_at
            FROM booking_details
            WHERE booking_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(booking_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut unavailable: Vec<String> = Vec::new();
        // Units handed to earlier line items in this loop, with the dates
        // they were taken for. The blocking subqueries cannot see these
        // bindings while the parent booking is still a cart, so sibling
        // conflicts are resolved here.
        let mut assigned: Vec<(String, RentalPeriod)> = Vec::new();

        for detail in &details {
            let period = RentalPeriod::new_unchecked(detail.start_date, detail.end_date);

            let candidate =
                available_units(&mut *tx, &detail.variant_id, &period, Some(&detail.id))
                    .await?
                    .into_iter()
                    .find(|unit| {
                        !assigned
                            .iter()
                            .any(|(taken, when)| taken == &unit.id && when.overlaps(&period))
                    });

            let Some(unit) = candidate else {
                unavailable.push(detail.product_name_snapshot.clone());
                continue;
            };

            // Bind the unit, re-verifying in the same statement that it still
            // has no blocking overlap for these dates.
            let bound = sqlx::query(
                r#"
                UPDATE booking_details SET unit_id = ?2
                WHERE id = ?1
                  AND NOT EXISTS (
                      SELECT 1
                      FROM booking_details d
                      JOIN bookings b ON b.id = d.booking_id
                      WHERE d.unit_id = ?2
                        AND d.id <> ?1
                        AND b.status IN ('confirmed', 'in_payment', 'completed', 'pending_refund')
                        AND d.start_date <= ?4
                        AND d.end_date >= ?3
                  )
                "#,
            )
            .bind(&detail.id)
            .bind(&unit.id)
            .bind(period.start())
            .bind(period.end())
            .execute(&mut *tx)
            .await?;

            if bound.rows_affected() == 0 {
                unavailable.push(detail.product_name_snapshot.clone());
            } else {
                assigned.push((unit.id.clone(), period));
            }
        }

        if !unavailable.is_empty() {
            // Keep one entry per product, in cart order.
            let mut seen: HashSet<String> = HashSet::new();
            unavailable.retain(|name| seen.insert(name.clone()));
            tx.rollback().await?;
            info!(booking_id = %booking_id, products = ?unavailable, "Checkout unavailable");
            return Ok(AllocationOutcome::Unavailable {
                products: unavailable,
            });
        }

        // The optimistic flip: only one request moves the booking out of Cart.
        let now = Utc::now();
        let flipped = sqlx::query(
            r#"
            UPDATE bookings SET
                status = 'confirmed',
                cart = 0,
                confirmed_at = ?2,
                updated_at = ?2
            WHERE id = ?1 AND status = 'cart'
            "#,
        )
        .bind(booking_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(AllocationOutcome::LostRace);
        }

        sqlx::query(
            "UPDATE booking_details SET fulfillment_status = 'to_pickup' WHERE booking_id = ?1",
        )
        .bind(booking_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(booking_id = %booking_id, details = details.len(), "Booking confirmed");
        Ok(AllocationOutcome::Confirmed)
    }

    // =========================================================================
    // Fulfillment
    // =========================================================================

    /// Moves a single line item `from -> to`, guarded in SQL.
    ///
    /// The statement matches only when the detail is in `from` AND the parent
    /// booking is Confirmed. Returns the rows affected (0 or 1).
    pub async fn set_fulfillment_one(
        &self,
        booking_id: &str,
        detail_id: &str,
        from: FulfillmentStatus,
        to: FulfillmentStatus,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE booking_details SET fulfillment_status = ?4
            WHERE id = ?1
              AND booking_id = ?2
              AND fulfillment_status = ?3
              AND EXISTS (
                  SELECT 1 FROM bookings b WHERE b.id = ?2 AND b.status = 'confirmed'
              )
            "#,
        )
        .bind(detail_id)
        .bind(booking_id)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Moves every qualifying line item of a booking `from -> to`.
    ///
    /// Affects only details currently in `from`; matching nothing is not an
    /// error. Returns the rows affected.
    pub async fn set_fulfillment_all(
        &self,
        booking_id: &str,
        from: FulfillmentStatus,
        to: FulfillmentStatus,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE booking_details SET fulfillment_status = ?3
            WHERE booking_id = ?1
              AND fulfillment_status = ?2
              AND EXISTS (
                  SELECT 1 FROM bookings b WHERE b.id = ?1 AND b.status = 'confirmed'
              )
            "#,
        )
        .bind(booking_id)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;

        let affected = result.rows_affected();
        if affected > 0 {
            info!(booking_id = %booking_id, from = ?from, to = ?to, affected, "Bulk fulfillment update");
        }
        Ok(affected)
    }

    /// Rewinds a completed booking: Completed→Confirmed plus every Returned
    /// detail back to PickedUp, in one transaction.
    ///
    /// Returns `false` (nothing persisted) when the booking was not Completed.
    pub async fn undo_completion(&self, booking_id: &str) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let flipped = sqlx::query(
            r#"
            UPDATE bookings SET status = 'confirmed', updated_at = ?2
            WHERE id = ?1 AND status = 'completed'
            "#,
        )
        .bind(booking_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE booking_details SET fulfillment_status = 'picked_up'
            WHERE booking_id = ?1 AND fulfillment_status = 'returned'
            "#,
        )
        .bind(booking_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(booking_id = %booking_id, "Completion undone");
        Ok(true)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use kitrent_core::{Unit, UnitStatus};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_unit(db: &Database, variant_id: &str) -> Unit {
        let now = Utc::now();
        let unit = Unit {
            id: Uuid::new_v4().to_string(),
            variant_id: variant_id.to_string(),
            label: None,
            status: UnitStatus::Rentable,
            created_at: now,
            updated_at: now,
        };
        db.units().insert(&unit).await.unwrap();
        unit
    }

    fn make_detail(booking_id: &str, unit_id: &str, variant_id: &str) -> BookingDetail {
        BookingDetail {
            id: Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            unit_id: unit_id.to_string(),
            variant_id: variant_id.to_string(),
            product_name_snapshot: "Touring Kayak".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 12).unwrap(),
            pickup_window: None,
            return_window: None,
            price_cents: 4500,
            deposit_cents: 10000,
            fulfillment_status: FulfillmentStatus::ToPickup,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_one_open_cart_per_user() {
        let db = test_db().await;
        let repo = db.bookings();

        repo.create_cart("user-1").await.unwrap();
        let err = repo.create_cart("user-1").await.unwrap_err();
        assert!(err.is_unique_violation());

        // A different user is unaffected.
        assert!(repo.create_cart("user-2").await.is_ok());
    }

    #[tokio::test]
    async fn test_recompute_price_total() {
        let db = test_db().await;
        let repo = db.bookings();
        let unit = seed_unit(&db, "variant-1").await;

        let cart = repo.create_cart("user-1").await.unwrap();
        let mut a = make_detail(&cart.id, &unit.id, "variant-1");
        a.price_cents = 4500;
        let mut b = make_detail(&cart.id, &unit.id, "variant-1");
        b.price_cents = 2000;
        repo.insert_detail(&a).await.unwrap();
        repo.insert_detail(&b).await.unwrap();

        // Deposits stay out of the total.
        let total = repo.recompute_price_total(&cart.id).await.unwrap();
        assert_eq!(total, 6500);

        repo.delete_detail(&b.id).await.unwrap();
        let total = repo.recompute_price_total(&cart.id).await.unwrap();
        assert_eq!(total, 4500);
    }

    #[tokio::test]
    async fn test_allocate_and_confirm_happy_path() {
        let db = test_db().await;
        let repo = db.bookings();
        let unit = seed_unit(&db, "variant-1").await;

        let cart = repo.create_cart("user-1").await.unwrap();
        repo.insert_detail(&make_detail(&cart.id, &unit.id, "variant-1"))
            .await
            .unwrap();

        let outcome = repo.allocate_and_confirm(&cart.id).await.unwrap();
        assert_eq!(outcome, AllocationOutcome::Confirmed);

        let booking = repo.get_by_id(&cart.id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert!(!booking.cart);
        assert!(booking.confirmed_at.is_some());

        let details = repo.get_details(&cart.id).await.unwrap();
        assert_eq!(details[0].fulfillment_status, FulfillmentStatus::ToPickup);
    }

    #[tokio::test]
    async fn test_allocate_and_confirm_lost_race() {
        let db = test_db().await;
        let repo = db.bookings();
        let unit = seed_unit(&db, "variant-1").await;

        let cart = repo.create_cart("user-1").await.unwrap();
        repo.insert_detail(&make_detail(&cart.id, &unit.id, "variant-1"))
            .await
            .unwrap();

        assert_eq!(
            repo.allocate_and_confirm(&cart.id).await.unwrap(),
            AllocationOutcome::Confirmed
        );
        // Second confirm finds the booking no longer a cart.
        assert_eq!(
            repo.allocate_and_confirm(&cart.id).await.unwrap(),
            AllocationOutcome::LostRace
        );
    }

    #[tokio::test]
    async fn test_allocate_unavailable_rolls_back_everything() {
        let db = test_db().await;
        let repo = db.bookings();
        let unit = seed_unit(&db, "variant-1").await;

        // First user confirms and claims the only unit.
        let first = repo.create_cart("user-1").await.unwrap();
        repo.insert_detail(&make_detail(&first.id, &unit.id, "variant-1"))
            .await
            .unwrap();
        assert_eq!(
            repo.allocate_and_confirm(&first.id).await.unwrap(),
            AllocationOutcome::Confirmed
        );

        // Second user holds the same unit/dates in a cart (allowed), but
        // checkout must fail naming the product.
        let second = repo.create_cart("user-2").await.unwrap();
        let held = make_detail(&second.id, &unit.id, "variant-1");
        repo.insert_detail(&held).await.unwrap();

        let outcome = repo.allocate_and_confirm(&second.id).await.unwrap();
        assert_eq!(
            outcome,
            AllocationOutcome::Unavailable {
                products: vec!["Touring Kayak".to_string()]
            }
        );

        // Zero mutation: still a cart, detail untouched.
        let booking = repo.get_by_id(&second.id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Cart);
        assert!(booking.cart);
        let detail = repo.get_detail(&held.id).await.unwrap().unwrap();
        assert_eq!(detail.unit_id, unit.id);
    }

    #[tokio::test]
    async fn test_allocate_rebinds_to_free_unit() {
        let db = test_db().await;
        let repo = db.bookings();
        // Fixed ids so the ascending-id resolver is deterministic.
        let now = Utc::now();
        let taken = Unit {
            id: "00000000-0000-4000-8000-000000000001".to_string(),
            variant_id: "variant-1".to_string(),
            label: None,
            status: UnitStatus::Rentable,
            created_at: now,
            updated_at: now,
        };
        let free = Unit {
            id: "00000000-0000-4000-8000-000000000002".to_string(),
            ..taken.clone()
        };
        db.units().insert(&taken).await.unwrap();
        db.units().insert(&free).await.unwrap();

        // First booking claims `taken`.
        let first = repo.create_cart("user-1").await.unwrap();
        repo.insert_detail(&make_detail(&first.id, &taken.id, "variant-1"))
            .await
            .unwrap();
        repo.allocate_and_confirm(&first.id).await.unwrap();

        // Second cart also points at `taken`; checkout rewrites to `free`.
        let second = repo.create_cart("user-2").await.unwrap();
        let held = make_detail(&second.id, &taken.id, "variant-1");
        repo.insert_detail(&held).await.unwrap();

        assert_eq!(
            repo.allocate_and_confirm(&second.id).await.unwrap(),
            AllocationOutcome::Confirmed
        );
        let detail = repo.get_detail(&held.id).await.unwrap().unwrap();
        assert_eq!(detail.unit_id, free.id);
    }

    #[tokio::test]
    async fn test_allocate_same_cart_overlapping_details_get_distinct_units() {
        let db = test_db().await;
        let repo = db.bookings();
        // Fixed ids so the ascending-id resolver is deterministic.
        let now = Utc::now();
        let first = Unit {
            id: "00000000-0000-4000-8000-000000000001".to_string(),
            variant_id: "variant-1".to_string(),
            label: None,
            status: UnitStatus::Rentable,
            created_at: now,
            updated_at: now,
        };
        let second = Unit {
            id: "00000000-0000-4000-8000-000000000002".to_string(),
            ..first.clone()
        };
        db.units().insert(&first).await.unwrap();
        db.units().insert(&second).await.unwrap();

        // One cart, two identical-date line items, both soft-referencing the
        // same unit. The allocation must spread them across both units.
        let cart = repo.create_cart("user-1").await.unwrap();
        let a = make_detail(&cart.id, &first.id, "variant-1");
        let b = make_detail(&cart.id, &first.id, "variant-1");
        repo.insert_detail(&a).await.unwrap();
        repo.insert_detail(&b).await.unwrap();

        assert_eq!(
            repo.allocate_and_confirm(&cart.id).await.unwrap(),
            AllocationOutcome::Confirmed
        );

        let da = repo.get_detail(&a.id).await.unwrap().unwrap();
        let db_ = repo.get_detail(&b.id).await.unwrap().unwrap();
        assert_ne!(da.unit_id, db_.unit_id);
    }

    #[tokio::test]
    async fn test_allocate_same_cart_overbooked_variant_is_unavailable() {
        let db = test_db().await;
        let repo = db.bookings();
        let unit = seed_unit(&db, "variant-1").await;

        // Two overlapping line items, one physical unit: the second cannot
        // bind and the whole checkout rolls back.
        let cart = repo.create_cart("user-1").await.unwrap();
        repo.insert_detail(&make_detail(&cart.id, &unit.id, "variant-1"))
            .await
            .unwrap();
        repo.insert_detail(&make_detail(&cart.id, &unit.id, "variant-1"))
            .await
            .unwrap();

        let outcome = repo.allocate_and_confirm(&cart.id).await.unwrap();
        assert_eq!(
            outcome,
            AllocationOutcome::Unavailable {
                products: vec!["Touring Kayak".to_string()]
            }
        );
        let booking = repo.get_by_id(&cart.id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Cart);
    }

    #[tokio::test]
    async fn test_allocate_same_cart_disjoint_dates_share_one_unit() {
        let db = test_db().await;
        let repo = db.bookings();
        let unit = seed_unit(&db, "variant-1").await;

        // Same unit twice is fine when the periods don't touch.
        let cart = repo.create_cart("user-1").await.unwrap();
        let a = make_detail(&cart.id, &unit.id, "variant-1");
        let mut b = make_detail(&cart.id, &unit.id, "variant-1");
        b.start_date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        b.end_date = NaiveDate::from_ymd_opt(2024, 7, 3).unwrap();
        repo.insert_detail(&a).await.unwrap();
        repo.insert_detail(&b).await.unwrap();

        assert_eq!(
            repo.allocate_and_confirm(&cart.id).await.unwrap(),
            AllocationOutcome::Confirmed
        );
        let da = repo.get_detail(&a.id).await.unwrap().unwrap();
        let db_ = repo.get_detail(&b.id).await.unwrap().unwrap();
        assert_eq!(da.unit_id, unit.id);
        assert_eq!(db_.unit_id, unit.id);
    }

    #[tokio::test]
    async fn test_unavailable_products_deduplicate_across_cart_order() {
        let db = test_db().await;
        let repo = db.bookings();

        // Every unit is in the shop: all three line items come back
        // unavailable.
        let kayak_unit = seed_unit(&db, "variant-1").await;
        let tent_unit = seed_unit(&db, "variant-2").await;
        db.units()
            .set_status(&kayak_unit.id, UnitStatus::UnderMaintenance)
            .await
            .unwrap();
        db.units()
            .set_status(&tent_unit.id, UnitStatus::UnderMaintenance)
            .await
            .unwrap();

        let cart = repo.create_cart("user-1").await.unwrap();
        let kayak_1 = make_detail(&cart.id, &kayak_unit.id, "variant-1");
        let mut tent = make_detail(&cart.id, &tent_unit.id, "variant-2");
        tent.product_name_snapshot = "4-Person Tent".to_string();
        let kayak_2 = make_detail(&cart.id, &kayak_unit.id, "variant-1");
        repo.insert_detail(&kayak_1).await.unwrap();
        repo.insert_detail(&tent).await.unwrap();
        repo.insert_detail(&kayak_2).await.unwrap();

        // Kayak, tent, kayak: the non-adjacent duplicate still collapses.
        let outcome = repo.allocate_and_confirm(&cart.id).await.unwrap();
        assert_eq!(
            outcome,
            AllocationOutcome::Unavailable {
                products: vec!["Touring Kayak".to_string(), "4-Person Tent".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn test_bulk_fulfillment_is_idempotent() {
        let db = test_db().await;
        let repo = db.bookings();
        let a = seed_unit(&db, "variant-1").await;
        let b = seed_unit(&db, "variant-1").await;

        let cart = repo.create_cart("user-1").await.unwrap();
        let mut d1 = make_detail(&cart.id, &a.id, "variant-1");
        let mut d2 = make_detail(&cart.id, &b.id, "variant-1");
        // Disjoint dates so both can bind distinct units deterministically.
        d2.start_date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        d2.end_date = NaiveDate::from_ymd_opt(2024, 7, 3).unwrap();
        d1.price_cents = 1000;
        d2.price_cents = 1000;
        repo.insert_detail(&d1).await.unwrap();
        repo.insert_detail(&d2).await.unwrap();
        repo.allocate_and_confirm(&cart.id).await.unwrap();

        let affected = repo
            .set_fulfillment_all(
                &cart.id,
                FulfillmentStatus::ToPickup,
                FulfillmentStatus::PickedUp,
            )
            .await
            .unwrap();
        assert_eq!(affected, 2);

        // Second run matches nothing.
        let affected = repo
            .set_fulfillment_all(
                &cart.id,
                FulfillmentStatus::ToPickup,
                FulfillmentStatus::PickedUp,
            )
            .await
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn test_fulfillment_requires_confirmed_parent() {
        let db = test_db().await;
        let repo = db.bookings();
        let unit = seed_unit(&db, "variant-1").await;

        let cart = repo.create_cart("user-1").await.unwrap();
        let detail = make_detail(&cart.id, &unit.id, "variant-1");
        repo.insert_detail(&detail).await.unwrap();

        // Still a cart: the guard in the statement matches nothing.
        let affected = repo
            .set_fulfillment_one(
                &cart.id,
                &detail.id,
                FulfillmentStatus::ToPickup,
                FulfillmentStatus::PickedUp,
            )
            .await
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn test_undo_completion_rewinds_details() {
        let db = test_db().await;
        let repo = db.bookings();
        let unit = seed_unit(&db, "variant-1").await;

        let cart = repo.create_cart("user-1").await.unwrap();
        let detail = make_detail(&cart.id, &unit.id, "variant-1");
        repo.insert_detail(&detail).await.unwrap();
        repo.allocate_and_confirm(&cart.id).await.unwrap();

        // Walk the detail to Returned, complete the booking.
        repo.set_fulfillment_all(
            &cart.id,
            FulfillmentStatus::ToPickup,
            FulfillmentStatus::PickedUp,
        )
        .await
        .unwrap();
        repo.set_fulfillment_all(
            &cart.id,
            FulfillmentStatus::PickedUp,
            FulfillmentStatus::Returned,
        )
        .await
        .unwrap();
        assert!(repo
            .set_status_cas(&cart.id, BookingStatus::Confirmed, BookingStatus::Completed)
            .await
            .unwrap());

        assert!(repo.undo_completion(&cart.id).await.unwrap());

        let booking = repo.get_by_id(&cart.id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        let fetched = repo.get_detail(&detail.id).await.unwrap().unwrap();
        assert_eq!(fetched.fulfillment_status, FulfillmentStatus::PickedUp);

        // Not completed anymore: second undo is a no-op.
        assert!(!repo.undo_completion(&cart.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_status_cas_misses_wrong_state() {
        let db = test_db().await;
        let repo = db.bookings();

        let cart = repo.create_cart("user-1").await.unwrap();
        // Cart is not Confirmed: CAS must miss.
        assert!(!repo
            .set_status_cas(&cart.id, BookingStatus::Confirmed, BookingStatus::InPayment)
            .await
            .unwrap());
    }
}
