//! Per-zone coverage snapshot, assembled rather than stored.

use serde::Serialize;

use crate::models::driver::DriverStatusRecord;
use crate::models::inventory::DriverInventoryRecord;
use crate::models::order::Order;
use crate::models::zone::{DriverZoneAssignment, Zone};

/// A per-zone summary of online drivers, idle drivers, active
/// assignments, carried inventory, and outstanding orders.
///
/// Produced either by the store's optimized coverage query or by the
/// fallback aggregation over the primitive queries; the two sources must
/// be structurally interchangeable.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneCoverageSnapshot {
    pub zone: Zone,
    pub online_drivers: Vec<DriverStatusRecord>,
    /// Online drivers whose status is `available`.
    pub idle_drivers: Vec<DriverStatusRecord>,
    pub assignments: Vec<DriverZoneAssignment>,
    /// Carried inventory belonging to this zone's online drivers.
    pub inventory: Vec<DriverInventoryRecord>,
    /// Outstanding orders assigned to this zone's online drivers.
    pub outstanding_orders: Vec<Order>,
}
