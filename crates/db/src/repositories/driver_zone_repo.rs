//! Repository for the `driver_zones` assignment table.

use sqlx::PgPool;

use crate::models::zone::DriverZoneAssignment;
use crate::store::ZoneAssignmentFilter;

/// Column list for `driver_zones` queries.
const COLUMNS: &str = "id, driver_id, zone_id, active, created_at, updated_at";

/// Provides read operations for driver-to-zone assignments.
pub struct DriverZoneRepo;

impl DriverZoneRepo {
    /// List assignments, optionally scoped to a zone, a set of drivers,
    /// or only active rows.
    pub async fn list(
        pool: &PgPool,
        filter: &ZoneAssignmentFilter,
    ) -> Result<Vec<DriverZoneAssignment>, sqlx::Error> {
        let active = if filter.active_only {
            "AND active = true"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM driver_zones \
             WHERE ($1::uuid IS NULL OR zone_id = $1) \
               AND ($2::uuid[] IS NULL OR driver_id = ANY($2)) \
               {active} \
             ORDER BY id"
        );
        sqlx::query_as::<_, DriverZoneAssignment>(&query)
            .bind(filter.zone_id)
            .bind(filter.driver_ids.as_deref())
            .fetch_all(pool)
            .await
    }
}
