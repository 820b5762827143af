//! PostgreSQL implementation of the dispatch persistence port.

use async_trait::async_trait;
use fleetline_core::types::{NotificationId, OrderId};
use sqlx::PgPool;

use crate::models::driver::{DriverProfile, DriverStatusPatch, DriverStatusRecord};
use crate::models::inventory::DriverInventoryRecord;
use crate::models::movement::NewMovement;
use crate::models::notification::NewNotification;
use crate::models::order::{Order, OrderAssignmentPatch};
use crate::models::zone::{DriverZoneAssignment, Zone};
use crate::models::coverage::ZoneCoverageSnapshot;
use crate::repositories::{
    CoverageRepo, DriverProfileRepo, DriverStatusRepo, DriverZoneRepo, InventoryRepo,
    MovementLogRepo, NotificationRepo, OrderRepo, ZoneRepo,
};
use crate::store::{
    Capability, CapabilitySet, CoverageFilter, DispatchStore, DriverStatusFilter, InventoryFilter,
    OrderFilter, ProfileFilter, StoreError, ZoneAssignmentFilter, ZoneFilter,
};

/// [`DispatchStore`] backed by the PostgreSQL schema in `migrations/`.
///
/// Supports every port operation except the pre-aggregated coverage
/// query, which requires the `zone_coverage` view; deployments that
/// provision it construct the store via [`with_coverage_view`].
///
/// [`with_coverage_view`]: PgDispatchStore::with_coverage_view
pub struct PgDispatchStore {
    pool: PgPool,
    capabilities: CapabilitySet,
}

impl PgDispatchStore {
    /// A store over the base schema (no `zone_coverage` view).
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            capabilities: CapabilitySet::full().without(Capability::ZoneCoverage),
        }
    }

    /// A store over a schema that also provisions the `zone_coverage`
    /// view, enabling the direct coverage path.
    pub fn with_coverage_view(pool: PgPool) -> Self {
        Self {
            pool,
            capabilities: CapabilitySet::full(),
        }
    }

    fn ensure(&self, cap: Capability, operation: &'static str) -> Result<(), StoreError> {
        if self.capabilities.contains(cap) {
            Ok(())
        } else {
            tracing::warn!(operation, "Store capability not provisioned");
            Err(StoreError::Unsupported { operation })
        }
    }
}

#[async_trait]
impl DispatchStore for PgDispatchStore {
    fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    async fn list_driver_statuses(
        &self,
        filter: DriverStatusFilter,
    ) -> Result<Vec<DriverStatusRecord>, StoreError> {
        self.ensure(Capability::DriverStatuses, "list_driver_statuses")?;
        Ok(DriverStatusRepo::list(&self.pool, &filter).await?)
    }

    async fn list_driver_zones(
        &self,
        filter: ZoneAssignmentFilter,
    ) -> Result<Vec<DriverZoneAssignment>, StoreError> {
        self.ensure(Capability::DriverZones, "list_driver_zones")?;
        Ok(DriverZoneRepo::list(&self.pool, &filter).await?)
    }

    async fn list_driver_inventory(
        &self,
        filter: InventoryFilter,
    ) -> Result<Vec<DriverInventoryRecord>, StoreError> {
        self.ensure(Capability::DriverInventory, "list_driver_inventory")?;
        Ok(InventoryRepo::list(&self.pool, &filter).await?)
    }

    async fn list_zones(&self, filter: ZoneFilter) -> Result<Vec<Zone>, StoreError> {
        self.ensure(Capability::Zones, "list_zones")?;
        Ok(ZoneRepo::list(&self.pool, &filter).await?)
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, StoreError> {
        self.ensure(Capability::Orders, "list_orders")?;
        Ok(OrderRepo::list(&self.pool, &filter).await?)
    }

    async fn list_driver_profiles(
        &self,
        filter: ProfileFilter,
    ) -> Result<Vec<DriverProfile>, StoreError> {
        self.ensure(Capability::DriverProfiles, "list_driver_profiles")?;
        Ok(DriverProfileRepo::list(&self.pool, &filter).await?)
    }

    async fn update_order(
        &self,
        id: OrderId,
        patch: OrderAssignmentPatch,
    ) -> Result<(), StoreError> {
        self.ensure(Capability::UpdateOrder, "update_order")?;
        let updated = OrderRepo::update_assignment(&self.pool, id, &patch).await?;
        if !updated {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        Ok(())
    }

    async fn update_driver_status(&self, patch: DriverStatusPatch) -> Result<bool, StoreError> {
        self.ensure(Capability::UpdateDriverStatus, "update_driver_status")?;
        Ok(DriverStatusRepo::update(&self.pool, &patch).await?)
    }

    async fn log_movement(&self, entry: NewMovement) -> Result<(), StoreError> {
        self.ensure(Capability::MovementLog, "log_movement")?;
        Ok(MovementLogRepo::append(&self.pool, &entry).await?)
    }

    async fn create_notification(
        &self,
        input: NewNotification,
    ) -> Result<NotificationId, StoreError> {
        self.ensure(Capability::Notifications, "create_notification")?;
        Ok(NotificationRepo::create(&self.pool, &input).await?)
    }

    async fn zone_coverage(
        &self,
        filter: CoverageFilter,
    ) -> Result<Vec<ZoneCoverageSnapshot>, StoreError> {
        self.ensure(Capability::ZoneCoverage, "zone_coverage")?;
        Ok(CoverageRepo::snapshots(&self.pool, &filter).await?)
    }
}
