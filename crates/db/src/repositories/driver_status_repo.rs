//! Repository for the `driver_statuses` table.

use sqlx::PgPool;

use crate::models::driver::{DriverStatusPatch, DriverStatusRecord};
use crate::store::DriverStatusFilter;

/// Column list for `driver_statuses` queries.
const COLUMNS: &str = "driver_id, status, is_online, current_zone_id, note, updated_at";

/// Provides read and patch operations for driver status rows.
pub struct DriverStatusRepo;

impl DriverStatusRepo {
    /// List driver statuses, optionally scoped to a zone, a single driver,
    /// or only-online rows.
    pub async fn list(
        pool: &PgPool,
        filter: &DriverStatusFilter,
    ) -> Result<Vec<DriverStatusRecord>, sqlx::Error> {
        let online = if filter.only_online {
            "AND is_online = true"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM driver_statuses \
             WHERE ($1::uuid IS NULL OR current_zone_id = $1) \
               AND ($2::uuid IS NULL OR driver_id = $2) \
               {online} \
             ORDER BY driver_id"
        );
        sqlx::query_as::<_, DriverStatusRecord>(&query)
            .bind(filter.zone_id)
            .bind(filter.driver_id)
            .fetch_all(pool)
            .await
    }

    /// Apply a status patch. `zone_id` and `is_online` keep their stored
    /// values when the patch leaves them unset; `note` is overwritten.
    ///
    /// Returns `true` if a row was updated.
    pub async fn update(pool: &PgPool, patch: &DriverStatusPatch) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE driver_statuses \
             SET status = $2, \
                 current_zone_id = COALESCE($3, current_zone_id), \
                 is_online = COALESCE($4, is_online), \
                 note = $5, \
                 updated_at = NOW() \
             WHERE driver_id = $1",
        )
        .bind(patch.driver_id)
        .bind(patch.status.as_str())
        .bind(patch.zone_id)
        .bind(patch.is_online)
        .bind(patch.note.as_deref())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
