//! Driver movement-log entity model and append DTO.

use fleetline_core::driver::MovementAction;
use fleetline_core::types::{DriverId, ProductId, Timestamp, ZoneId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the append-only `driver_movements` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MovementLogEntry {
    pub id: i64,
    pub driver_id: DriverId,
    pub zone_id: Option<ZoneId>,
    pub product_id: Option<ProductId>,
    pub quantity_change: Option<i32>,
    pub action: String,
    pub details: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for appending a movement-log entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMovement {
    pub driver_id: DriverId,
    pub zone_id: Option<ZoneId>,
    pub product_id: Option<ProductId>,
    pub quantity_change: Option<i32>,
    pub action: MovementAction,
    pub details: Option<String>,
}
