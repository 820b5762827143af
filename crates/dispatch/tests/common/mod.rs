//! Shared test harness: a configurable in-memory [`DispatchStore`].
//!
//! Supports capability masking (to exercise the `Unsupported` paths),
//! per-operation failure injection (to exercise degradation and
//! rollback), and an optional artificial latency so concurrent callers
//! genuinely interleave.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use fleetline_core::driver::DriverAvailability;
use fleetline_core::order::{OrderItem, OrderStatus};
use fleetline_core::types::{DriverId, NotificationId, OrderId, ProductId, ZoneId};
use fleetline_db::models::driver::{DriverProfile, DriverStatusPatch, DriverStatusRecord};
use fleetline_db::models::inventory::DriverInventoryRecord;
use fleetline_db::models::movement::NewMovement;
use fleetline_db::models::notification::NewNotification;
use fleetline_db::models::order::{Order, OrderAssignmentPatch};
use fleetline_db::models::zone::{DriverZoneAssignment, Zone};
use fleetline_db::models::coverage::ZoneCoverageSnapshot;
use fleetline_db::store::{
    Capability, CapabilitySet, CoverageFilter, DispatchStore, DriverStatusFilter, InventoryFilter,
    OrderFilter, ProfileFilter, StoreError, ZoneAssignmentFilter, ZoneFilter,
};
use sqlx::types::Json;
use uuid::Uuid;

/// Initialise test logging once; safe to call from every test.
///
/// Run with `RUST_LOG=fleetline_dispatch=debug` to watch the services.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Mutable backing state, exposed for seeding and assertions.
#[derive(Default)]
pub struct State {
    pub statuses: Vec<DriverStatusRecord>,
    pub profiles: Vec<DriverProfile>,
    pub zones: Vec<Zone>,
    pub assignments: Vec<DriverZoneAssignment>,
    pub inventory: Vec<DriverInventoryRecord>,
    pub orders: Vec<Order>,
    pub movements: Vec<NewMovement>,
    pub notifications: Vec<NewNotification>,
    failing_ops: HashSet<&'static str>,
    coverage_omits_orders: bool,
    next_row_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_row_id += 1;
        self.next_row_id
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct MemoryStore {
    capabilities: CapabilitySet,
    state: Mutex<State>,
    op_delay: Option<Duration>,
}

impl MemoryStore {
    /// A store supporting every operation except the coverage aggregate,
    /// so coverage requests take the fallback path.
    pub fn new() -> Self {
        Self::with_capabilities(CapabilitySet::full().without(Capability::ZoneCoverage))
    }

    /// A store that also supports the coverage aggregate.
    pub fn with_coverage() -> Self {
        Self::with_capabilities(CapabilitySet::full())
    }

    pub fn with_capabilities(capabilities: CapabilitySet) -> Self {
        Self {
            capabilities,
            state: Mutex::new(State::default()),
            op_delay: None,
        }
    }

    /// Add artificial latency to every operation so concurrent callers
    /// interleave at the await points.
    pub fn with_op_delay(mut self, delay: Duration) -> Self {
        self.op_delay = Some(delay);
        self
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("memory store poisoned")
    }

    /// Make one operation fail with `StoreError::Unavailable` until
    /// cleared.
    pub fn fail_op(&self, operation: &'static str) {
        self.state().failing_ops.insert(operation);
    }

    pub fn clear_failures(&self) {
        self.state().failing_ops.clear();
    }

    /// Make the coverage aggregate report zero outstanding orders in
    /// every snapshot, as some backends' coverage views do.
    pub fn omit_orders_from_coverage(&self) {
        self.state().coverage_omits_orders = true;
    }

    // -- Seed helpers -------------------------------------------------------

    pub fn seed_zone(&self, name: &str) -> ZoneId {
        let id = Uuid::new_v4();
        self.state().zones.push(Zone {
            id,
            name: name.to_string(),
            region: None,
            polygon: None,
            active: true,
            created_at: Utc::now(),
        });
        id
    }

    pub fn seed_driver(
        &self,
        status: DriverAvailability,
        is_online: bool,
        zone: Option<ZoneId>,
    ) -> DriverId {
        let driver_id = Uuid::new_v4();
        self.state().statuses.push(DriverStatusRecord {
            driver_id,
            status: status.as_str().to_string(),
            is_online,
            current_zone_id: zone,
            note: None,
            updated_at: Utc::now(),
        });
        driver_id
    }

    pub fn seed_assignment(&self, driver_id: DriverId, zone_id: ZoneId) {
        let mut state = self.state();
        let id = state.next_id();
        state.assignments.push(DriverZoneAssignment {
            id,
            driver_id,
            zone_id,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }

    pub fn seed_inventory(&self, driver_id: DriverId, product_id: ProductId, quantity: i32) {
        let mut state = self.state();
        let id = state.next_id();
        state.inventory.push(DriverInventoryRecord {
            id,
            driver_id,
            product_id,
            quantity,
            zone_id: None,
            updated_at: Utc::now(),
        });
    }

    pub fn seed_order(&self, items: Vec<OrderItem>) -> Order {
        let order = Order {
            id: Uuid::new_v4(),
            status: OrderStatus::New.as_str().to_string(),
            items: Json(items),
            assigned_driver: None,
            zone_id: None,
            created_at: Utc::now(),
            confirmed_at: None,
            preparing_at: None,
            ready_at: None,
            out_for_delivery_at: None,
            delivered_at: None,
            cancelled_at: None,
        };
        self.state().orders.push(order.clone());
        order
    }

    /// An order already assigned to a driver, in the given status.
    pub fn seed_assigned_order(&self, driver_id: DriverId, status: OrderStatus) -> OrderId {
        let id = Uuid::new_v4();
        self.state().orders.push(Order {
            id,
            status: status.as_str().to_string(),
            items: Json(Vec::new()),
            assigned_driver: Some(driver_id),
            zone_id: None,
            created_at: Utc::now(),
            confirmed_at: Some(Utc::now()),
            preparing_at: None,
            ready_at: None,
            out_for_delivery_at: None,
            delivered_at: None,
            cancelled_at: None,
        });
        id
    }

    pub fn seed_profile(
        &self,
        display_name: &str,
        rating: Option<f64>,
        active_orders: i32,
        max_capacity: i32,
        position: Option<(f64, f64)>,
    ) -> DriverId {
        let driver_id = Uuid::new_v4();
        self.state().profiles.push(DriverProfile {
            driver_id,
            display_name: display_name.to_string(),
            rating,
            active_orders,
            max_capacity,
            avg_delivery_minutes: None,
            last_lat: position.map(|p| p.0),
            last_lng: position.map(|p| p.1),
            updated_at: Utc::now(),
        });
        driver_id
    }

    // -- Internals ----------------------------------------------------------

    async fn begin(&self, operation: &'static str, cap: Capability) -> Result<(), StoreError> {
        if !self.capabilities.contains(cap) {
            return Err(StoreError::Unsupported { operation });
        }
        if let Some(delay) = self.op_delay {
            tokio::time::sleep(delay).await;
        }
        if self.state().failing_ops.contains(operation) {
            return Err(StoreError::Unavailable(format!(
                "injected failure for {operation}"
            )));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DispatchStore for MemoryStore {
    fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    async fn list_driver_statuses(
        &self,
        filter: DriverStatusFilter,
    ) -> Result<Vec<DriverStatusRecord>, StoreError> {
        self.begin("list_driver_statuses", Capability::DriverStatuses)
            .await?;
        let mut rows: Vec<DriverStatusRecord> = self
            .state()
            .statuses
            .iter()
            .filter(|s| filter.zone_id.map(|z| s.current_zone_id == Some(z)).unwrap_or(true))
            .filter(|s| filter.driver_id.map(|d| s.driver_id == d).unwrap_or(true))
            .filter(|s| !filter.only_online || s.is_online)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.driver_id);
        Ok(rows)
    }

    async fn list_driver_zones(
        &self,
        filter: ZoneAssignmentFilter,
    ) -> Result<Vec<DriverZoneAssignment>, StoreError> {
        self.begin("list_driver_zones", Capability::DriverZones)
            .await?;
        let rows = self
            .state()
            .assignments
            .iter()
            .filter(|a| filter.zone_id.map(|z| a.zone_id == z).unwrap_or(true))
            .filter(|a| {
                filter
                    .driver_ids
                    .as_ref()
                    .map(|ids| ids.contains(&a.driver_id))
                    .unwrap_or(true)
            })
            .filter(|a| !filter.active_only || a.active)
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn list_driver_inventory(
        &self,
        filter: InventoryFilter,
    ) -> Result<Vec<DriverInventoryRecord>, StoreError> {
        self.begin("list_driver_inventory", Capability::DriverInventory)
            .await?;
        let rows = self
            .state()
            .inventory
            .iter()
            .filter(|i| i.quantity > 0)
            .filter(|i| {
                filter
                    .driver_ids
                    .as_ref()
                    .map(|ids| ids.contains(&i.driver_id))
                    .unwrap_or(true)
            })
            .filter(|i| filter.product_id.map(|p| i.product_id == p).unwrap_or(true))
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn list_zones(&self, filter: ZoneFilter) -> Result<Vec<Zone>, StoreError> {
        self.begin("list_zones", Capability::Zones).await?;
        let mut rows: Vec<Zone> = self
            .state()
            .zones
            .iter()
            .filter(|z| filter.zone_id.map(|id| z.id == id).unwrap_or(true))
            .filter(|z| {
                filter
                    .region
                    .as_ref()
                    .map(|r| z.region.as_deref() == Some(r.as_str()))
                    .unwrap_or(true)
            })
            .filter(|z| !filter.active_only || z.active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, StoreError> {
        self.begin("list_orders", Capability::Orders).await?;
        let wanted: Option<Vec<&'static str>> = filter
            .statuses
            .map(|statuses| statuses.iter().map(|s| s.as_str()).collect());
        let rows = self
            .state()
            .orders
            .iter()
            .filter(|o| {
                wanted
                    .as_ref()
                    .map(|w| w.contains(&o.status.as_str()))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn list_driver_profiles(
        &self,
        filter: ProfileFilter,
    ) -> Result<Vec<DriverProfile>, StoreError> {
        self.begin("list_driver_profiles", Capability::DriverProfiles)
            .await?;
        let state = self.state();
        let available: HashSet<DriverId> = state
            .statuses
            .iter()
            .filter(|s| s.is_online && s.status == DriverAvailability::Available.as_str())
            .map(|s| s.driver_id)
            .collect();
        let mut rows: Vec<DriverProfile> = state
            .profiles
            .iter()
            .filter(|p| {
                filter
                    .driver_ids
                    .as_ref()
                    .map(|ids| ids.contains(&p.driver_id))
                    .unwrap_or(true)
            })
            .filter(|p| !filter.only_available || available.contains(&p.driver_id))
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.driver_id);
        Ok(rows)
    }

    async fn update_order(
        &self,
        id: OrderId,
        patch: OrderAssignmentPatch,
    ) -> Result<(), StoreError> {
        self.begin("update_order", Capability::UpdateOrder).await?;
        let mut state = self.state();
        let Some(order) = state.orders.iter_mut().find(|o| o.id == id) else {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        };
        order.status = patch.status.as_str().to_string();
        order.assigned_driver = patch.assigned_driver;
        let now = Utc::now();
        match patch.status {
            OrderStatus::New => order.confirmed_at = None,
            OrderStatus::Confirmed => order.confirmed_at = Some(now),
            OrderStatus::Preparing => order.preparing_at = Some(now),
            OrderStatus::Ready => order.ready_at = Some(now),
            OrderStatus::OutForDelivery => order.out_for_delivery_at = Some(now),
            OrderStatus::Delivered => order.delivered_at = Some(now),
            OrderStatus::Cancelled => order.cancelled_at = Some(now),
        }
        Ok(())
    }

    async fn update_driver_status(&self, patch: DriverStatusPatch) -> Result<bool, StoreError> {
        self.begin("update_driver_status", Capability::UpdateDriverStatus)
            .await?;
        let mut state = self.state();
        let Some(row) = state
            .statuses
            .iter_mut()
            .find(|s| s.driver_id == patch.driver_id)
        else {
            return Ok(false);
        };
        row.status = patch.status.as_str().to_string();
        if let Some(zone) = patch.zone_id {
            row.current_zone_id = Some(zone);
        }
        if let Some(online) = patch.is_online {
            row.is_online = online;
        }
        row.note = patch.note;
        row.updated_at = Utc::now();
        Ok(true)
    }

    async fn log_movement(&self, entry: NewMovement) -> Result<(), StoreError> {
        self.begin("log_movement", Capability::MovementLog).await?;
        self.state().movements.push(entry);
        Ok(())
    }

    async fn create_notification(
        &self,
        input: NewNotification,
    ) -> Result<NotificationId, StoreError> {
        self.begin("create_notification", Capability::Notifications)
            .await?;
        self.state().notifications.push(input);
        Ok(Uuid::new_v4())
    }

    async fn zone_coverage(
        &self,
        filter: CoverageFilter,
    ) -> Result<Vec<ZoneCoverageSnapshot>, StoreError> {
        self.begin("zone_coverage", Capability::ZoneCoverage).await?;
        let state = self.state();
        let mut zones: Vec<Zone> = state
            .zones
            .iter()
            .filter(|z| filter.zone_id.map(|id| z.id == id).unwrap_or(true))
            .filter(|z| !filter.only_active || z.active)
            .cloned()
            .collect();
        zones.sort_by(|a, b| a.name.cmp(&b.name));

        let snapshots = zones
            .into_iter()
            .map(|zone| {
                let mut online_drivers: Vec<DriverStatusRecord> = state
                    .statuses
                    .iter()
                    .filter(|s| s.is_online && s.current_zone_id == Some(zone.id))
                    .cloned()
                    .collect();
                online_drivers.sort_by_key(|s| s.driver_id);
                let online_ids: HashSet<DriverId> =
                    online_drivers.iter().map(|s| s.driver_id).collect();
                let idle_drivers = online_drivers
                    .iter()
                    .filter(|s| s.status == DriverAvailability::Available.as_str())
                    .cloned()
                    .collect();
                let assignments = state
                    .assignments
                    .iter()
                    .filter(|a| a.active && a.zone_id == zone.id)
                    .cloned()
                    .collect();
                let inventory = state
                    .inventory
                    .iter()
                    .filter(|i| i.quantity > 0 && online_ids.contains(&i.driver_id))
                    .cloned()
                    .collect();
                let outstanding_orders = if filter.include_orders && !state.coverage_omits_orders {
                    state
                        .orders
                        .iter()
                        .filter(|o| {
                            o.is_outstanding()
                                && o.assigned_driver
                                    .map(|d| online_ids.contains(&d))
                                    .unwrap_or(false)
                        })
                        .cloned()
                        .collect()
                } else {
                    Vec::new()
                };
                ZoneCoverageSnapshot {
                    zone,
                    online_drivers,
                    idle_drivers,
                    assignments,
                    inventory,
                    outstanding_orders,
                }
            })
            .collect();
        Ok(snapshots)
    }
}
