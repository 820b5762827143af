//! Zone and driver-zone-assignment entity models.

use fleetline_core::types::{DriverId, Timestamp, ZoneId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `zones` table: a geographic dispatch partition.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub region: Option<String>,
    /// Optional GeoJSON polygon describing the zone boundary.
    pub polygon: Option<serde_json::Value>,
    pub active: bool,
    pub created_at: Timestamp,
}

/// A row from the `driver_zones` table: a driver's assignment to a zone.
///
/// A driver is expected to hold at most one active assignment, but the
/// schema does not enforce it; readers treat any active matching row as
/// "assigned to the zone".
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DriverZoneAssignment {
    pub id: i64,
    pub driver_id: DriverId,
    pub zone_id: ZoneId,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
