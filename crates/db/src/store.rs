//! The persistence port consumed by the dispatch services.
//!
//! [`DispatchStore`] is the narrow, typed surface the subsystem sees of
//! the managed backend. Implementations advertise which operations they
//! support through a [`CapabilitySet`]; callers probe [`supports`]
//! before invoking an operation so that a missing capability surfaces as
//! an explicit [`StoreError::Unsupported`] instead of a silent empty
//! result.
//!
//! [`supports`]: DispatchStore::supports

use std::collections::HashSet;

use async_trait::async_trait;
use fleetline_core::order::OrderStatus;
use fleetline_core::types::{DriverId, NotificationId, OrderId, ProductId, ZoneId};

use crate::models::driver::{DriverProfile, DriverStatusPatch, DriverStatusRecord};
use crate::models::inventory::DriverInventoryRecord;
use crate::models::movement::NewMovement;
use crate::models::notification::NewNotification;
use crate::models::order::{Order, OrderAssignmentPatch};
use crate::models::zone::{DriverZoneAssignment, Zone};
use crate::models::coverage::ZoneCoverageSnapshot;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by a [`DispatchStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The operation is not implemented by this store.
    #[error("Operation not supported by this store: {operation}")]
    Unsupported { operation: &'static str },

    /// The backend rejected the operation for authorization reasons.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backend is unreachable or refused the connection.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be interpreted.
    #[error("Malformed row: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// One negotiable operation of the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DriverStatuses,
    DriverZones,
    DriverInventory,
    DriverProfiles,
    Zones,
    Orders,
    UpdateOrder,
    UpdateDriverStatus,
    MovementLog,
    Notifications,
    /// The optional pre-aggregated coverage query.
    ZoneCoverage,
}

impl Capability {
    /// Every capability, including the optional coverage aggregate.
    pub const ALL: &'static [Capability] = &[
        Capability::DriverStatuses,
        Capability::DriverZones,
        Capability::DriverInventory,
        Capability::DriverProfiles,
        Capability::Zones,
        Capability::Orders,
        Capability::UpdateOrder,
        Capability::UpdateDriverStatus,
        Capability::MovementLog,
        Capability::Notifications,
        Capability::ZoneCoverage,
    ];
}

/// The set of operations a store implementation advertises.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet(HashSet<Capability>);

impl CapabilitySet {
    /// An empty set (nothing supported).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every capability, including [`Capability::ZoneCoverage`].
    pub fn full() -> Self {
        Self(Capability::ALL.iter().copied().collect())
    }

    /// Add a capability.
    pub fn with(mut self, cap: Capability) -> Self {
        self.0.insert(cap);
        self
    }

    /// Remove a capability.
    pub fn without(mut self, cap: Capability) -> Self {
        self.0.remove(&cap);
        self
    }

    pub fn contains(&self, cap: Capability) -> bool {
        self.0.contains(&cap)
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Filter for [`DispatchStore::list_driver_statuses`].
#[derive(Debug, Clone, Default)]
pub struct DriverStatusFilter {
    pub zone_id: Option<ZoneId>,
    pub driver_id: Option<DriverId>,
    pub only_online: bool,
}

/// Filter for [`DispatchStore::list_driver_zones`].
#[derive(Debug, Clone, Default)]
pub struct ZoneAssignmentFilter {
    pub zone_id: Option<ZoneId>,
    pub driver_ids: Option<Vec<DriverId>>,
    pub active_only: bool,
}

/// Filter for [`DispatchStore::list_driver_inventory`].
#[derive(Debug, Clone, Default)]
pub struct InventoryFilter {
    pub driver_ids: Option<Vec<DriverId>>,
    pub product_id: Option<ProductId>,
}

/// Filter for [`DispatchStore::list_zones`].
#[derive(Debug, Clone, Default)]
pub struct ZoneFilter {
    pub zone_id: Option<ZoneId>,
    pub region: Option<String>,
    pub active_only: bool,
}

/// Filter for [`DispatchStore::list_orders`].
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub statuses: Option<Vec<OrderStatus>>,
}

/// Filter for [`DispatchStore::list_driver_profiles`].
#[derive(Debug, Clone, Default)]
pub struct ProfileFilter {
    pub driver_ids: Option<Vec<DriverId>>,
    /// Restrict to drivers that are online with status `available`.
    pub only_available: bool,
}

/// Filter for [`DispatchStore::zone_coverage`].
#[derive(Debug, Clone, Default)]
pub struct CoverageFilter {
    pub zone_id: Option<ZoneId>,
    pub include_orders: bool,
    pub only_active: bool,
}

// ---------------------------------------------------------------------------
// The port
// ---------------------------------------------------------------------------

/// Typed read/write operations over the dispatch tables.
///
/// Implementations must be cheap to share (`Arc<dyn DispatchStore>`);
/// every method takes `&self`.
#[async_trait]
pub trait DispatchStore: Send + Sync {
    /// The operations this store implements.
    fn capabilities(&self) -> &CapabilitySet;

    /// Convenience probe for a single capability.
    fn supports(&self, cap: Capability) -> bool {
        self.capabilities().contains(cap)
    }

    async fn list_driver_statuses(
        &self,
        filter: DriverStatusFilter,
    ) -> Result<Vec<DriverStatusRecord>, StoreError>;

    async fn list_driver_zones(
        &self,
        filter: ZoneAssignmentFilter,
    ) -> Result<Vec<DriverZoneAssignment>, StoreError>;

    async fn list_driver_inventory(
        &self,
        filter: InventoryFilter,
    ) -> Result<Vec<DriverInventoryRecord>, StoreError>;

    async fn list_zones(&self, filter: ZoneFilter) -> Result<Vec<Zone>, StoreError>;

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, StoreError>;

    async fn list_driver_profiles(
        &self,
        filter: ProfileFilter,
    ) -> Result<Vec<DriverProfile>, StoreError>;

    /// Apply an assignment patch to an order.
    async fn update_order(
        &self,
        id: OrderId,
        patch: OrderAssignmentPatch,
    ) -> Result<(), StoreError>;

    /// Apply a status patch to a driver row.
    ///
    /// Returns `false` when no row matched (unknown driver).
    async fn update_driver_status(&self, patch: DriverStatusPatch) -> Result<bool, StoreError>;

    /// Append an entry to the driver movement log.
    async fn log_movement(&self, entry: NewMovement) -> Result<(), StoreError>;

    /// Create a notification, returning its id.
    async fn create_notification(
        &self,
        input: NewNotification,
    ) -> Result<NotificationId, StoreError>;

    /// The optional pre-aggregated coverage query.
    async fn zone_coverage(
        &self,
        filter: CoverageFilter,
    ) -> Result<Vec<ZoneCoverageSnapshot>, StoreError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_set_contains_every_capability() {
        let caps = CapabilitySet::full();
        for cap in Capability::ALL {
            assert!(caps.contains(*cap), "missing {cap:?}");
        }
    }

    #[test]
    fn empty_set_contains_nothing() {
        let caps = CapabilitySet::empty();
        assert!(!caps.contains(Capability::DriverStatuses));
    }

    #[test]
    fn without_removes_a_single_capability() {
        let caps = CapabilitySet::full().without(Capability::ZoneCoverage);
        assert!(!caps.contains(Capability::ZoneCoverage));
        assert!(caps.contains(Capability::Orders));
    }

    #[test]
    fn with_adds_to_an_empty_set() {
        let caps = CapabilitySet::empty().with(Capability::Notifications);
        assert!(caps.contains(Capability::Notifications));
        assert!(!caps.contains(Capability::Orders));
    }

    #[test]
    fn filters_default_to_unconstrained() {
        let filter = DriverStatusFilter::default();
        assert!(filter.zone_id.is_none());
        assert!(filter.driver_id.is_none());
        assert!(!filter.only_online);
    }
}
