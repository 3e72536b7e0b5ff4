//! # Refund Repository
//!
//! Database operations for refund rows, including the grant transaction that
//! couples the refund insert with the booking's PendingRefund flip.
//!
//! ## Grant Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       grant(refund)                                     │
//! │                                                                         │
//! │  BEGIN TRANSACTION                                                     │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  INSERT refunds (status = 'pending')                                   │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  UPDATE bookings SET status = 'pending_refund'                         │
//! │  WHERE id = ? AND status = 'confirmed'   ◄── status-guarded            │
//! │     │                                                                   │
//! │     ├── 0 rows ──► ROLLBACK, return false (caller maps to Conflict)    │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use kitrent_core::Refund;

/// Repository for refund database operations.
#[derive(Debug, Clone)]
pub struct RefundRepository {
    pool: SqlitePool,
}

impl RefundRepository {
    /// Creates a new RefundRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RefundRepository { pool }
    }

    /// Whether an active (Pending or Succeeded) refund exists for a booking.
    ///
    /// At most one active refund per booking; failed refunds are deleted, so
    /// any row at all counts as active.
    pub async fn active_exists(&self, booking_id: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM refunds WHERE booking_id = ?1")
            .bind(booking_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Gets the refund for a booking, if any.
    pub async fn get_by_booking(&self, booking_id: &str) -> DbResult<Option<Refund>> {
        let refund: Option<Refund> = sqlx::query_as(
            r#"
            SELECT id, booking_id, status, percentage, amount_cents, created_at, updated_at
            FROM refunds
            WHERE booking_id = ?1
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(refund)
    }

    /// Inserts the refund and flips the booking Confirmed→PendingRefund in
    /// one transaction.
    ///
    /// Returns `false` (nothing persisted) when the booking was not Confirmed
    /// anymore - the caller lost the race.
    pub async fn grant(&self, refund: &Refund) -> DbResult<bool> {
        debug!(
            booking_id = %refund.booking_id,
            percentage = refund.percentage,
            amount_cents = refund.amount_cents,
            "Granting refund"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO refunds (id, booking_id, status, percentage, amount_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&refund.id)
        .bind(&refund.booking_id)
        .bind(refund.status)
        .bind(refund.percentage)
        .bind(refund.amount_cents)
        .bind(refund.created_at)
        .bind(refund.updated_at)
        .execute(&mut *tx)
        .await?;

        let now = Utc::now();
        let flipped = sqlx::query(
            r#"
            UPDATE bookings SET status = 'pending_refund', updated_at = ?2
            WHERE id = ?1 AND status = 'confirmed'
            "#,
        )
        .bind(&refund.booking_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;

        info!(
            booking_id = %refund.booking_id,
            percentage = refund.percentage,
            "Refund granted"
        );
        Ok(true)
    }

    /// Settles a refund: booking PendingRefund→SucceededRefund and the
    /// refund row Pending→Succeeded, in one transaction.
    ///
    /// Returns `false` when either guard missed.
    pub async fn settle(&self, booking_id: &str) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let refund_moved = sqlx::query(
            r#"
            UPDATE refunds SET status = 'succeeded', updated_at = ?2
            WHERE booking_id = ?1 AND status = 'pending'
            "#,
        )
        .bind(booking_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let booking_moved = sqlx::query(
            r#"
            UPDATE bookings SET status = 'succeeded_refund', updated_at = ?2
            WHERE id = ?1 AND status = 'pending_refund'
            "#,
        )
        .bind(booking_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if refund_moved.rows_affected() == 0 || booking_moved.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;

        info!(booking_id = %booking_id, "Refund settled");
        Ok(true)
    }

    /// Compensates a processor failure: booking PendingRefund→Confirmed and
    /// the pending refund row deleted so a new request is possible.
    ///
    /// Returns `false` when the booking was not PendingRefund.
    pub async fn fail(&self, booking_id: &str) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let booking_moved = sqlx::query(
            r#"
            UPDATE bookings SET status = 'confirmed', updated_at = ?2
            WHERE id = ?1 AND status = 'pending_refund'
            "#,
        )
        .bind(booking_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if booking_moved.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM refunds WHERE booking_id = ?1 AND status = 'pending'")
            .bind(booking_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(booking_id = %booking_id, "Refund failed, booking restored");
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
    use kitrent_core::{BookingStatus, RefundStatus};
    use uuid::Uuid;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// A booking already moved to Confirmed, the state refunds start from.
    async fn confirmed_booking(db: &Database, user_id: &str) -> String {
        let cart = db.bookings().create_cart(user_id).await.unwrap();
        assert!(db
            .bookings()
            .set_status_cas(&cart.id, BookingStatus::Cart, BookingStatus::Confirmed)
            .await
            .unwrap());
        cart.id
    }

    fn make_refund(booking_id: &str, percentage: i64, amount_cents: i64) -> Refund {
        let now = Utc::now();
        Refund {
            id: Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            status: RefundStatus::Pending,
            percentage,
            amount_cents,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_grant_flips_booking() {
        let db = test_db().await;
        let booking_id = confirmed_booking(&db, "user-1").await;

        let granted = db
            .refunds()
            .grant(&make_refund(&booking_id, 100, 4500))
            .await
            .unwrap();
        assert!(granted);

        let booking = db.bookings().get_by_id(&booking_id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::PendingRefund);
        assert!(db.refunds().active_exists(&booking_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_grant_lost_race_persists_nothing() {
        let db = test_db().await;
        let cart = db.bookings().create_cart("user-1").await.unwrap();

        // Booking still a cart: the guard misses and the insert rolls back.
        let granted = db
            .refunds()
            .grant(&make_refund(&cart.id, 50, 1000))
            .await
            .unwrap();
        assert!(!granted);
        assert!(!db.refunds().active_exists(&cart.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_settle() {
        let db = test_db().await;
        let booking_id = confirmed_booking(&db, "user-1").await;
        db.refunds()
            .grant(&make_refund(&booking_id, 50, 2250))
            .await
            .unwrap();

        assert!(db.refunds().settle(&booking_id).await.unwrap());

        let booking = db.bookings().get_by_id(&booking_id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::SucceededRefund);
        let refund = db
            .refunds()
            .get_by_booking(&booking_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refund.status, RefundStatus::Succeeded);

        // Already settled: second call misses both guards.
        assert!(!db.refunds().settle(&booking_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_fail_restores_and_allows_retry() {
        let db = test_db().await;
        let booking_id = confirmed_booking(&db, "user-1").await;
        db.refunds()
            .grant(&make_refund(&booking_id, 50, 2250))
            .await
            .unwrap();

        assert!(db.refunds().fail(&booking_id).await.unwrap());

        let booking = db.bookings().get_by_id(&booking_id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        // Pending row removed: a new request is possible.
        assert!(!db.refunds().active_exists(&booking_id).await.unwrap());

        assert!(db
            .refunds()
            .grant(&make_refund(&booking_id, 100, 4500))
            .await
            .unwrap());
    }
}
