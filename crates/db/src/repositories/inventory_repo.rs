//! Repository for the `driver_inventory` table.

use sqlx::PgPool;

use crate::models::inventory::DriverInventoryRecord;
use crate::store::InventoryFilter;

/// Column list for `driver_inventory` queries.
const COLUMNS: &str = "id, driver_id, product_id, quantity, zone_id, updated_at";

/// Provides read operations for driver carried inventory.
pub struct InventoryRepo;

impl InventoryRepo {
    /// List carried-inventory rows, optionally scoped to a set of drivers
    /// or a single product.
    pub async fn list(
        pool: &PgPool,
        filter: &InventoryFilter,
    ) -> Result<Vec<DriverInventoryRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM driver_inventory \
             WHERE ($1::uuid[] IS NULL OR driver_id = ANY($1)) \
               AND ($2::uuid IS NULL OR product_id = $2) \
               AND quantity > 0 \
             ORDER BY id"
        );
        sqlx::query_as::<_, DriverInventoryRecord>(&query)
            .bind(filter.driver_ids.as_deref())
            .bind(filter.product_id)
            .fetch_all(pool)
            .await
    }
}
