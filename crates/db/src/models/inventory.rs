//! Driver carried-inventory entity model.

use fleetline_core::types::{DriverId, ProductId, Timestamp, ZoneId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `driver_inventory` table: the stock a driver is
/// physically carrying, distinct from warehouse inventory.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DriverInventoryRecord {
    pub id: i64,
    pub driver_id: DriverId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Zone the stock was loaded in, when known.
    pub zone_id: Option<ZoneId>,
    pub updated_at: Timestamp,
}
