//! Repository for the optional `zone_coverage` view.
//!
//! The view pre-aggregates, per zone, the online drivers, active
//! assignments, carried inventory, and outstanding orders as JSONB
//! arrays. It is only present in deployments that provision it; stores
//! without the view simply do not advertise the coverage capability.

use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use crate::models::driver::DriverStatusRecord;
use crate::models::inventory::DriverInventoryRecord;
use crate::models::order::Order;
use crate::models::zone::{DriverZoneAssignment, Zone};
use crate::models::coverage::ZoneCoverageSnapshot;
use crate::store::CoverageFilter;

/// One row of the `zone_coverage` view.
#[derive(Debug, FromRow)]
struct CoverageRow {
    zone: Json<Zone>,
    online_drivers: Json<Vec<DriverStatusRecord>>,
    assignments: Json<Vec<DriverZoneAssignment>>,
    inventory: Json<Vec<DriverInventoryRecord>>,
    outstanding_orders: Json<Vec<Order>>,
}

/// Provides the pre-aggregated coverage query.
pub struct CoverageRepo;

impl CoverageRepo {
    /// Fetch coverage snapshots from the view.
    pub async fn snapshots(
        pool: &PgPool,
        filter: &CoverageFilter,
    ) -> Result<Vec<ZoneCoverageSnapshot>, sqlx::Error> {
        let active = if filter.only_active {
            "AND (zone->>'active')::boolean = true"
        } else {
            ""
        };
        let query = format!(
            "SELECT zone, online_drivers, assignments, inventory, outstanding_orders \
             FROM zone_coverage \
             WHERE ($1::uuid IS NULL OR (zone->>'id')::uuid = $1) \
               {active} \
             ORDER BY zone->>'name'"
        );
        let rows = sqlx::query_as::<_, CoverageRow>(&query)
            .bind(filter.zone_id)
            .fetch_all(pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let online_drivers = row.online_drivers.0;
                let idle_drivers = online_drivers
                    .iter()
                    .filter(|d| d.status == "available")
                    .cloned()
                    .collect();
                let outstanding_orders = if filter.include_orders {
                    row.outstanding_orders.0
                } else {
                    Vec::new()
                };
                ZoneCoverageSnapshot {
                    zone: row.zone.0,
                    online_drivers,
                    idle_drivers,
                    assignments: row.assignments.0,
                    inventory: row.inventory.0,
                    outstanding_orders,
                }
            })
            .collect())
    }
}
