//! Repository for the append-only `driver_movements` log.

use fleetline_core::types::DriverId;
use sqlx::PgPool;

use crate::models::movement::{MovementLogEntry, NewMovement};

/// Column list for `driver_movements` queries.
const COLUMNS: &str =
    "id, driver_id, zone_id, product_id, quantity_change, action, details, created_at";

/// Provides append and read operations for the driver movement log.
pub struct MovementLogRepo;

impl MovementLogRepo {
    /// Append a movement-log entry.
    pub async fn append(pool: &PgPool, entry: &NewMovement) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO driver_movements \
             (driver_id, zone_id, product_id, quantity_change, action, details) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.driver_id)
        .bind(entry.zone_id)
        .bind(entry.product_id)
        .bind(entry.quantity_change)
        .bind(entry.action.as_str())
        .bind(entry.details.as_deref())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Most recent movement entries for a driver, newest first.
    pub async fn recent(
        pool: &PgPool,
        driver_id: DriverId,
        limit: i64,
    ) -> Result<Vec<MovementLogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM driver_movements \
             WHERE driver_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, MovementLogEntry>(&query)
            .bind(driver_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
