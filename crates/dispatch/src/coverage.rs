//! Per-zone coverage reports for operational dashboards.
//!
//! Two interchangeable construction paths exist: the store's optimized
//! aggregate query ([`DirectCoverageProvider`]) and a reconstruction
//! from the primitive queries ([`FallbackCoverageProvider`]).
//! [`CoverageService`] probes the store's capabilities per call and
//! picks the path; dashboards must render identically regardless of
//! which one ran.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use fleetline_core::driver::DriverAvailability;
use fleetline_core::order::OUTSTANDING_STATUSES;
use fleetline_core::types::{DriverId, ZoneId};
use fleetline_db::models::driver::DriverStatusRecord;
use fleetline_db::models::order::Order;
use fleetline_db::models::coverage::ZoneCoverageSnapshot;
use fleetline_db::store::{
    Capability, CoverageFilter, DispatchStore, DriverStatusFilter, InventoryFilter, OrderFilter,
    ZoneAssignmentFilter, ZoneFilter,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::port;

/// The full coverage picture returned to dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub coverage: Vec<ZoneCoverageSnapshot>,
    /// Online drivers not attached to any zone.
    pub unassigned_drivers: Vec<DriverStatusRecord>,
    /// Outstanding orders across all snapshots, de-duplicated by id.
    pub outstanding_orders: Vec<Order>,
}

// ---------------------------------------------------------------------------
// Provider strategy
// ---------------------------------------------------------------------------

/// One way of producing per-zone snapshots.
#[async_trait]
pub trait CoverageProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the store advertises everything this path needs.
    fn is_supported(&self) -> bool;

    async fn snapshots(
        &self,
        zone_id: Option<ZoneId>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ZoneCoverageSnapshot>, DispatchError>;
}

/// Coverage via the store's pre-aggregated query.
pub struct DirectCoverageProvider {
    store: Arc<dyn DispatchStore>,
    config: DispatchConfig,
}

impl DirectCoverageProvider {
    pub fn new(store: Arc<dyn DispatchStore>, config: DispatchConfig) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl CoverageProvider for DirectCoverageProvider {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn is_supported(&self) -> bool {
        self.store.supports(Capability::ZoneCoverage)
    }

    async fn snapshots(
        &self,
        zone_id: Option<ZoneId>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ZoneCoverageSnapshot>, DispatchError> {
        port::call(
            "zone_coverage",
            self.config.port_call_timeout,
            cancel,
            self.store.zone_coverage(CoverageFilter {
                zone_id,
                include_orders: true,
                only_active: true,
            }),
        )
        .await
    }
}

/// Coverage reconstructed from the primitive queries.
///
/// The zone list is the spine of the report; its failure propagates.
/// The four per-section queries (statuses, assignments, inventory,
/// orders) degrade to empty with a warning, so one failing query dims a
/// section of the dashboard instead of blanking the whole thing.
pub struct FallbackCoverageProvider {
    store: Arc<dyn DispatchStore>,
    config: DispatchConfig,
}

impl FallbackCoverageProvider {
    pub fn new(store: Arc<dyn DispatchStore>, config: DispatchConfig) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl CoverageProvider for FallbackCoverageProvider {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn is_supported(&self) -> bool {
        [
            Capability::Zones,
            Capability::DriverStatuses,
            Capability::DriverZones,
            Capability::DriverInventory,
            Capability::Orders,
        ]
        .iter()
        .all(|cap| self.store.supports(*cap))
    }

    async fn snapshots(
        &self,
        zone_id: Option<ZoneId>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ZoneCoverageSnapshot>, DispatchError> {
        let store = self.store.as_ref();
        port::require(store, Capability::Zones, "list_zones")?;
        port::require(store, Capability::DriverStatuses, "list_driver_statuses")?;
        port::require(store, Capability::DriverZones, "list_driver_zones")?;
        port::require(store, Capability::DriverInventory, "list_driver_inventory")?;
        port::require(store, Capability::Orders, "list_orders")?;

        let timeout = self.config.port_call_timeout;
        let zones = port::call(
            "list_zones",
            timeout,
            cancel,
            store.list_zones(ZoneFilter {
                zone_id,
                active_only: true,
                ..Default::default()
            }),
        )
        .await?;
        if zones.is_empty() {
            return Ok(Vec::new());
        }

        let statuses = degrade(
            "online_drivers",
            port::call(
                "list_driver_statuses",
                timeout,
                cancel,
                store.list_driver_statuses(DriverStatusFilter {
                    only_online: true,
                    ..Default::default()
                }),
            )
            .await,
        )?;

        let assignments = degrade(
            "assignments",
            port::call(
                "list_driver_zones",
                timeout,
                cancel,
                store.list_driver_zones(ZoneAssignmentFilter {
                    zone_id,
                    active_only: true,
                    ..Default::default()
                }),
            )
            .await,
        )?;

        let online_ids: Vec<DriverId> = statuses.iter().map(|s| s.driver_id).collect();
        let inventory = if online_ids.is_empty() {
            Vec::new()
        } else {
            degrade(
                "inventory",
                port::call(
                    "list_driver_inventory",
                    timeout,
                    cancel,
                    store.list_driver_inventory(InventoryFilter {
                        driver_ids: Some(online_ids),
                        ..Default::default()
                    }),
                )
                .await,
            )?
        };

        let orders = degrade(
            "outstanding_orders",
            port::call(
                "list_orders",
                timeout,
                cancel,
                store.list_orders(OrderFilter {
                    statuses: Some(OUTSTANDING_STATUSES.to_vec()),
                }),
            )
            .await,
        )?;

        let snapshots = zones
            .into_iter()
            .map(|zone| {
                let online_drivers: Vec<DriverStatusRecord> = statuses
                    .iter()
                    .filter(|s| s.current_zone_id == Some(zone.id))
                    .cloned()
                    .collect();
                let online_set: HashSet<DriverId> =
                    online_drivers.iter().map(|s| s.driver_id).collect();
                let idle_drivers = online_drivers
                    .iter()
                    .filter(|s| s.availability() == Some(DriverAvailability::Available))
                    .cloned()
                    .collect();
                let zone_assignments = assignments
                    .iter()
                    .filter(|a| a.zone_id == zone.id)
                    .cloned()
                    .collect();
                let zone_inventory = inventory
                    .iter()
                    .filter(|i| online_set.contains(&i.driver_id))
                    .cloned()
                    .collect();
                let outstanding_orders = orders
                    .iter()
                    .filter(|o| {
                        o.is_outstanding()
                            && o.assigned_driver
                                .map(|d| online_set.contains(&d))
                                .unwrap_or(false)
                    })
                    .cloned()
                    .collect();
                ZoneCoverageSnapshot {
                    zone,
                    online_drivers,
                    idle_drivers,
                    assignments: zone_assignments,
                    inventory: zone_inventory,
                    outstanding_orders,
                }
            })
            .collect();
        Ok(snapshots)
    }
}

/// Degrade a per-section query failure to an empty section.
///
/// Capability absence and caller cancellation still propagate; only
/// runtime failures are downgraded, and always with a warning so the
/// dashboard gap is traceable.
fn degrade<T>(
    section: &'static str,
    result: Result<Vec<T>, DispatchError>,
) -> Result<Vec<T>, DispatchError> {
    match result {
        Ok(rows) => Ok(rows),
        Err(err @ (DispatchError::Cancelled | DispatchError::Unsupported { .. })) => Err(err),
        Err(err) => {
            tracing::warn!(section, error = %err, "Coverage section degraded to empty");
            Ok(Vec::new())
        }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Builds [`CoverageReport`]s, choosing the construction path per call.
pub struct CoverageService {
    store: Arc<dyn DispatchStore>,
    config: DispatchConfig,
    direct: DirectCoverageProvider,
    fallback: FallbackCoverageProvider,
}

impl CoverageService {
    pub fn new(store: Arc<dyn DispatchStore>, config: DispatchConfig) -> Self {
        Self {
            direct: DirectCoverageProvider::new(Arc::clone(&store), config.clone()),
            fallback: FallbackCoverageProvider::new(Arc::clone(&store), config.clone()),
            store,
            config,
        }
    }

    /// Build the coverage report, optionally restricted to one zone.
    pub async fn get_coverage(
        &self,
        zone_id: Option<ZoneId>,
        cancel: &CancellationToken,
    ) -> Result<CoverageReport, DispatchError> {
        let provider: &dyn CoverageProvider = if self.direct.is_supported() {
            &self.direct
        } else {
            &self.fallback
        };
        tracing::debug!(provider = provider.name(), "Building zone coverage");
        let snapshots = provider.snapshots(zone_id, cancel).await?;

        let unassigned_drivers = self.unassigned_drivers(cancel).await?;
        let outstanding_orders = self.outstanding_orders(&snapshots, cancel).await?;

        Ok(CoverageReport {
            coverage: snapshots,
            unassigned_drivers,
            outstanding_orders,
        })
    }

    /// Online drivers not attached to any zone. Degrades to empty on a
    /// runtime query failure, like any other section.
    async fn unassigned_drivers(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<DriverStatusRecord>, DispatchError> {
        let store = self.store.as_ref();
        port::require(store, Capability::DriverStatuses, "list_driver_statuses")?;
        let online = degrade(
            "unassigned_drivers",
            port::call(
                "list_driver_statuses",
                self.config.port_call_timeout,
                cancel,
                store.list_driver_statuses(DriverStatusFilter {
                    only_online: true,
                    ..Default::default()
                }),
            )
            .await,
        )?;
        Ok(online
            .into_iter()
            .filter(|s| s.current_zone_id.is_none())
            .collect())
    }

    /// Union of every snapshot's outstanding orders, de-duplicated by
    /// order id. When the coverage source reported none at all, re-derive
    /// from the order list filtered to the known coverage drivers.
    async fn outstanding_orders(
        &self,
        snapshots: &[ZoneCoverageSnapshot],
        cancel: &CancellationToken,
    ) -> Result<Vec<Order>, DispatchError> {
        let mut seen = HashSet::new();
        let mut outstanding: Vec<Order> = Vec::new();
        for snapshot in snapshots {
            for order in &snapshot.outstanding_orders {
                if seen.insert(order.id) {
                    outstanding.push(order.clone());
                }
            }
        }
        if !outstanding.is_empty() || !self.store.supports(Capability::Orders) {
            return Ok(outstanding);
        }

        let covered: HashSet<DriverId> = snapshots
            .iter()
            .flat_map(|s| s.online_drivers.iter().map(|d| d.driver_id))
            .collect();
        if covered.is_empty() {
            return Ok(outstanding);
        }
        let orders = degrade(
            "outstanding_orders",
            port::call(
                "list_orders",
                self.config.port_call_timeout,
                cancel,
                self.store.list_orders(OrderFilter {
                    statuses: Some(OUTSTANDING_STATUSES.to_vec()),
                }),
            )
            .await,
        )?;
        Ok(orders
            .into_iter()
            .filter(|o| {
                o.assigned_driver
                    .map(|d| covered.contains(&d))
                    .unwrap_or(false)
            })
            .collect())
    }
}
