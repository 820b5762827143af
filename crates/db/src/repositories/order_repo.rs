//! Repository for the `orders` table.

use fleetline_core::order::OrderStatus;
use fleetline_core::types::OrderId;
use sqlx::PgPool;

use crate::models::order::{Order, OrderAssignmentPatch};
use crate::store::OrderFilter;

/// Column list for `orders` queries.
const COLUMNS: &str = "id, status, items, assigned_driver, zone_id, created_at, confirmed_at, \
                       preparing_at, ready_at, out_for_delivery_at, delivered_at, cancelled_at";

/// Provides the read and assignment-patch operations the dispatch
/// subsystem performs on orders.
pub struct OrderRepo;

impl OrderRepo {
    /// List orders, optionally restricted to a set of statuses.
    pub async fn list(pool: &PgPool, filter: &OrderFilter) -> Result<Vec<Order>, sqlx::Error> {
        let statuses: Option<Vec<String>> = filter
            .statuses
            .as_ref()
            .map(|s| s.iter().map(|st| st.as_str().to_string()).collect());
        let query = format!(
            "SELECT {COLUMNS} FROM orders \
             WHERE ($1::text[] IS NULL OR status = ANY($1)) \
             ORDER BY created_at"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(statuses)
            .fetch_all(pool)
            .await
    }

    /// Apply an assignment patch: status, assigned driver, and the
    /// lifecycle timestamp matching the new status. Reverting to `new`
    /// clears `confirmed_at` so the row reads as never assigned.
    ///
    /// Returns `true` if a row was updated.
    pub async fn update_assignment(
        pool: &PgPool,
        id: OrderId,
        patch: &OrderAssignmentPatch,
    ) -> Result<bool, sqlx::Error> {
        let ts_clause = match patch.status {
            OrderStatus::New => ", confirmed_at = NULL",
            OrderStatus::Confirmed => ", confirmed_at = NOW()",
            OrderStatus::Preparing => ", preparing_at = NOW()",
            OrderStatus::Ready => ", ready_at = NOW()",
            OrderStatus::OutForDelivery => ", out_for_delivery_at = NOW()",
            OrderStatus::Delivered => ", delivered_at = NOW()",
            OrderStatus::Cancelled => ", cancelled_at = NOW()",
        };
        let query = format!(
            "UPDATE orders SET status = $2, assigned_driver = $3{ts_clause} WHERE id = $1"
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(patch.status.as_str())
            .bind(patch.assigned_driver)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
