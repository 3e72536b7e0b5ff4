//! # Unit Repository
//!
//! Database operations for physical inventory units, including the
//! availability resolver.
//!
//! ## Availability Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              find_available(variant, [start, end])                      │
//! │                                                                         │
//! │  Units of the variant                                                  │
//! │  ├── unit A (rentable)      ──┐                                        │
//! │  ├── unit B (rentable)        │  filter: NOT EXISTS a blocking         │
//! │  ├── unit C (maintenance) ✗   │  detail with an overlapping period     │
//! │  └── unit D (retired)     ✗   │                                        │
//! │                               ▼                                        │
//! │  Blocking = parent booking status ∈                                    │
//! │    {confirmed, in_payment, completed, pending_refund}                  │
//! │  Cart holds NEVER block. Cancelled/refunded bookings never block.      │
//! │                                                                         │
//! │  Overlap is inclusive on both boundary days:                           │
//! │    requestedStart ≤ existingEnd AND requestedEnd ≥ existingStart       │
//! │                                                                         │
//! │  Winner: first free unit in ascending id order (deterministic).        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use kitrent_core::{RentalPeriod, Unit, UnitStatus};

/// The shared availability query: every free unit, ascending id order.
///
/// Generic over the executor so the checkout allocator can run the same
/// resolution inside its transaction (and skip units it has already handed
/// to an earlier line item, which this query cannot see while the parent is
/// still a cart). Date binds are ISO-8601 day strings, which compare
/// correctly as TEXT.
pub(crate) async fn available_units<'e, E>(
    executor: E,
    variant_id: &str,
    period: &RentalPeriod,
    exclude_detail: Option<&str>,
) -> DbResult<Vec<Unit>>
where
    E: SqliteExecutor<'e>,
{
    let units: Vec<Unit> = sqlx::query_as(
        r#"
        SELECT u.id, u.variant_id, u.label, u.status, u.created_at, u.updated_at
        FROM units u
        WHERE u.variant_id = ?1
          AND u.status = 'rentable'
          AND NOT EXISTS (
              SELECT 1
              FROM booking_details d
              JOIN bookings b ON b.id = d.booking_id
              WHERE d.unit_id = u.id
                AND (?2 IS NULL OR d.id <> ?2)
                AND b.status IN ('confirmed', 'in_payment', 'completed', 'pending_refund')
                AND d.start_date <= ?4
                AND d.end_date >= ?3
          )
        ORDER BY u.id
        "#,
    )
    .bind(variant_id)
    .bind(exclude_detail)
    .bind(period.start())
    .bind(period.end())
    .fetch_all(executor)
    .await?;

    Ok(units)
}

/// Repository for inventory unit database operations.
#[derive(Debug, Clone)]
pub struct UnitRepository {
    pool: SqlitePool,
}

impl UnitRepository {
    /// Creates a new UnitRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UnitRepository { pool }
    }

    /// Inserts a unit.
    pub async fn insert(&self, unit: &Unit) -> DbResult<()> {
        debug!(id = %unit.id, variant_id = %unit.variant_id, "Inserting unit");

        sqlx::query(
            r#"
            INSERT INTO units (id, variant_id, label, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&unit.id)
        .bind(&unit.variant_id)
        .bind(&unit.label)
        .bind(unit.status)
        .bind(unit.created_at)
        .bind(unit.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a unit by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Unit>> {
        let unit: Option<Unit> = sqlx::query_as(
            r#"
            SELECT id, variant_id, label, status, created_at, updated_at
            FROM units
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    /// Lists all units of a variant, ascending by id.
    pub async fn list_for_variant(&self, variant_id: &str) -> DbResult<Vec<Unit>> {
        let units: Vec<Unit> = sqlx::query_as(
            r#"
            SELECT id, variant_id, label, status, created_at, updated_at
            FROM units
            WHERE variant_id = ?1
            ORDER BY id
            "#,
        )
        .bind(variant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(units)
    }

    /// Sets a unit's operational status (admin-driven).
    pub async fn set_status(&self, id: &str, status: UnitStatus) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE units SET status = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Unit", id));
        }

        Ok(())
    }

    /// Finds the first available unit of a variant for a period.
    ///
    /// Returns `None` when the variant is booked out for those dates.
    /// `exclude_detail` removes one detail's own claim from the overlap set,
    /// so re-resolution at checkout doesn't see the detail's current binding
    /// as a conflict with itself.
    pub async fn find_available(
        &self,
        variant_id: &str,
        period: &RentalPeriod,
        exclude_detail: Option<&str>,
    ) -> DbResult<Option<Unit>> {
        let units = available_units(&self.pool, variant_id, period, exclude_detail).await?;
        Ok(units.into_iter().next())
    }

    /// First rentable unit of a variant in ascending id order, ignoring
    /// bookings entirely.
    ///
    /// Fallback for the advisory cart pre-pick: when every rentable unit is
    /// claimed for the dates, the cart still records a soft reference and the
    /// real allocation happens at checkout.
    pub async fn first_rentable(&self, variant_id: &str) -> DbResult<Option<Unit>> {
        let unit: Option<Unit> = sqlx::query_as(
            r#"
            SELECT id, variant_id, label, status, created_at, updated_at
            FROM units
            WHERE variant_id = ?1 AND status = 'rentable'
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    /// Counts the rentable units of a variant.
    pub async fn count_rentable(&self, variant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM units
            WHERE variant_id = ?1 AND status = 'rentable'
            "#,
        )
        .bind(variant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use uuid::Uuid;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn make_unit(variant_id: &str, label: &str) -> Unit {
        let now = Utc::now();
        Unit {
            id: Uuid::new_v4().to_string(),
            variant_id: variant_id.to_string(),
            label: Some(label.to_string()),
            status: UnitStatus::Rentable,
            created_at: now,
            updated_at: now,
        }
    }

    fn period(s: (i32, u32, u32), e: (i32, u32, u32)) -> RentalPeriod {
        RentalPeriod::new(
            NaiveDate::from_ymd_opt(s.0, s.1, s.2).unwrap(),
            NaiveDate::from_ymd_opt(e.0, e.1, e.2).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.units();

        let unit = make_unit("variant-1", "KAYAK-01");
        repo.insert(&unit).await.unwrap();

        let fetched = repo.get_by_id(&unit.id).await.unwrap().unwrap();
        assert_eq!(fetched.variant_id, "variant-1");
        assert_eq!(fetched.label.as_deref(), Some("KAYAK-01"));
        assert_eq!(fetched.status, UnitStatus::Rentable);
    }

    #[tokio::test]
    async fn test_set_status() {
        let db = test_db().await;
        let repo = db.units();

        let unit = make_unit("variant-1", "KAYAK-01");
        repo.insert(&unit).await.unwrap();

        repo.set_status(&unit.id, UnitStatus::UnderMaintenance)
            .await
            .unwrap();

        let fetched = repo.get_by_id(&unit.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, UnitStatus::UnderMaintenance);
    }

    #[tokio::test]
    async fn test_set_status_unknown_unit() {
        let db = test_db().await;
        let err = db
            .units()
            .set_status("no-such-unit", UnitStatus::Retired)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_find_available_ignores_non_rentable() {
        let db = test_db().await;
        let repo = db.units();

        let mut unit = make_unit("variant-1", "KAYAK-01");
        unit.status = UnitStatus::UnderMaintenance;
        repo.insert(&unit).await.unwrap();

        let found = repo
            .find_available("variant-1", &period((2024, 6, 1), (2024, 6, 3)), None)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_available_picks_lowest_id() {
        let db = test_db().await;
        let repo = db.units();

        let mut a = make_unit("variant-1", "A");
        let mut b = make_unit("variant-1", "B");
        a.id = "00000000-0000-4000-8000-000000000001".to_string();
        b.id = "00000000-0000-4000-8000-000000000002".to_string();
        repo.insert(&b).await.unwrap();
        repo.insert(&a).await.unwrap();

        let found = repo
            .find_available("variant-1", &period((2024, 6, 1), (2024, 6, 3)), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, a.id);
    }

    #[tokio::test]
    async fn test_count_rentable() {
        let db = test_db().await;
        let repo = db.units();

        repo.insert(&make_unit("variant-1", "A")).await.unwrap();
        repo.insert(&make_unit("variant-1", "B")).await.unwrap();
        let mut retired = make_unit("variant-1", "C");
        retired.status = UnitStatus::Retired;
        repo.insert(&retired).await.unwrap();

        assert_eq!(repo.count_rentable("variant-1").await.unwrap(), 2);
        assert_eq!(repo.count_rentable("variant-2").await.unwrap(), 0);
    }
}
