//! Driver status and profile entity models and DTOs.

use fleetline_core::driver::DriverAvailability;
use fleetline_core::types::{DriverId, Timestamp, ZoneId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `driver_statuses` table: the driver's own availability
/// push, refreshed by their device.
///
/// Also deserializable: the coverage view returns these rows embedded in
/// JSONB arrays.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DriverStatusRecord {
    pub driver_id: DriverId,
    pub status: String,
    pub is_online: bool,
    pub current_zone_id: Option<ZoneId>,
    pub note: Option<String>,
    pub updated_at: Timestamp,
}

impl DriverStatusRecord {
    /// Parse the stored status text into the domain enum.
    ///
    /// Returns `None` for an unrecognised value; callers treat such rows
    /// as ineligible rather than failing the whole batch.
    pub fn availability(&self) -> Option<DriverAvailability> {
        DriverAvailability::from_str_value(&self.status).ok()
    }
}

/// A row from the `driver_profiles` table: slow-moving per-driver facts
/// used by the geodistance search and workload analytics.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DriverProfile {
    pub driver_id: DriverId,
    pub display_name: String,
    pub rating: Option<f64>,
    pub active_orders: i32,
    pub max_capacity: i32,
    pub avg_delivery_minutes: Option<f64>,
    pub last_lat: Option<f64>,
    pub last_lng: Option<f64>,
    pub updated_at: Timestamp,
}

impl DriverProfile {
    /// Last known position, if the driver has ever pushed one.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.last_lat, self.last_lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// DTO for updating a driver's status row.
///
/// `zone_id` and `is_online` are merge-patched: `None` leaves the stored
/// value untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverStatusPatch {
    pub driver_id: DriverId,
    pub status: DriverAvailability,
    pub zone_id: Option<ZoneId>,
    pub is_online: Option<bool>,
    pub note: Option<String>,
}
