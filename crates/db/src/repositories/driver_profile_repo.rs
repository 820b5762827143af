//! Repository for the `driver_profiles` table.

use sqlx::PgPool;

use crate::models::driver::DriverProfile;
use crate::store::ProfileFilter;

/// Column list for `driver_profiles` queries, qualified for joins.
const COLUMNS: &str = "p.driver_id, p.display_name, p.rating, p.active_orders, p.max_capacity, \
                       p.avg_delivery_minutes, p.last_lat, p.last_lng, p.updated_at";

/// Provides read operations for driver profile rows.
pub struct DriverProfileRepo;

impl DriverProfileRepo {
    /// List driver profiles. With `only_available`, joins the status table
    /// and keeps only online drivers whose status is `available`.
    pub async fn list(
        pool: &PgPool,
        filter: &ProfileFilter,
    ) -> Result<Vec<DriverProfile>, sqlx::Error> {
        let availability = if filter.only_available {
            "JOIN driver_statuses s ON s.driver_id = p.driver_id \
             AND s.is_online = true AND s.status = 'available'"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM driver_profiles p \
             {availability} \
             WHERE ($1::uuid[] IS NULL OR p.driver_id = ANY($1)) \
             ORDER BY p.driver_id"
        );
        sqlx::query_as::<_, DriverProfile>(&query)
            .bind(filter.driver_ids.as_deref())
            .fetch_all(pool)
            .await
    }
}
