//! Repository for the `zones` table.

use sqlx::PgPool;

use crate::models::zone::Zone;
use crate::store::ZoneFilter;

/// Column list for `zones` queries.
const COLUMNS: &str = "id, name, region, polygon, active, created_at";

/// Provides read operations for dispatch zones.
pub struct ZoneRepo;

impl ZoneRepo {
    /// List zones, optionally filtered to one zone, a region, or only
    /// active zones.
    pub async fn list(pool: &PgPool, filter: &ZoneFilter) -> Result<Vec<Zone>, sqlx::Error> {
        let active = if filter.active_only {
            "AND active = true"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM zones \
             WHERE ($1::uuid IS NULL OR id = $1) \
               AND ($2::text IS NULL OR region = $2) \
               {active} \
             ORDER BY name"
        );
        sqlx::query_as::<_, Zone>(&query)
            .bind(filter.zone_id)
            .bind(filter.region.as_deref())
            .fetch_all(pool)
            .await
    }
}
