//! Candidate evaluation: rank online drivers against an order's items.

use std::collections::HashMap;
use std::sync::Arc;

use fleetline_core::driver::DriverAvailability;
use fleetline_core::order::OrderItem;
use fleetline_core::scoring::{self, ItemShortfall};
use fleetline_core::types::{DriverId, ProductId, ZoneId};
use fleetline_db::models::driver::DriverStatusRecord;
use fleetline_db::models::inventory::DriverInventoryRecord;
use fleetline_db::models::zone::DriverZoneAssignment;
use fleetline_db::store::{
    Capability, DispatchStore, DriverStatusFilter, InventoryFilter, ZoneAssignmentFilter,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::port;

/// One driver evaluated against an order's item requirements.
///
/// Computed fresh on every call; nothing here is persisted.
#[derive(Debug, Clone, Serialize)]
pub struct DriverCandidate {
    pub driver: DriverStatusRecord,
    /// The driver's active zone assignments.
    pub assignments: Vec<DriverZoneAssignment>,
    /// The driver's carried stock.
    pub inventory: Vec<DriverInventoryRecord>,
    /// Per-required-item missing units.
    pub shortfalls: Vec<ItemShortfall>,
    /// True iff every shortfall is zero.
    pub matches: bool,
    pub score: i64,
}

impl DriverCandidate {
    pub fn driver_id(&self) -> DriverId {
        self.driver.driver_id
    }
}

/// Evaluates and ranks drivers for a specific order.
pub struct CandidateEvaluator {
    store: Arc<dyn DispatchStore>,
    config: DispatchConfig,
}

impl CandidateEvaluator {
    pub fn new(store: Arc<dyn DispatchStore>, config: DispatchConfig) -> Self {
        Self { store, config }
    }

    /// Evaluate every online driver (optionally scoped to a zone) against
    /// the required items, including non-matching candidates.
    ///
    /// Sorted by score descending, then driver id ascending so equal
    /// scores rank deterministically. Callers that only want dispatchable
    /// drivers use [`find_eligible_drivers`].
    ///
    /// [`find_eligible_drivers`]: CandidateEvaluator::find_eligible_drivers
    pub async fn evaluate_candidates(
        &self,
        zone_id: Option<ZoneId>,
        items: &[OrderItem],
        cancel: &CancellationToken,
    ) -> Result<Vec<DriverCandidate>, DispatchError> {
        let store = self.store.as_ref();
        port::require(store, Capability::DriverStatuses, "list_driver_statuses")?;
        port::require(store, Capability::DriverZones, "list_driver_zones")?;
        port::require(store, Capability::DriverInventory, "list_driver_inventory")?;

        let timeout = self.config.port_call_timeout;
        let mut statuses = port::call(
            "list_driver_statuses",
            timeout,
            cancel,
            store.list_driver_statuses(DriverStatusFilter {
                zone_id,
                only_online: true,
                ..Default::default()
            }),
        )
        .await?;
        // The port is asked for online rows only; a store that ignores the
        // flag must not leak offline drivers into scoring.
        statuses.retain(|s| s.is_online);
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let driver_ids: Vec<DriverId> = statuses.iter().map(|s| s.driver_id).collect();
        let assignments = port::call(
            "list_driver_zones",
            timeout,
            cancel,
            store.list_driver_zones(ZoneAssignmentFilter {
                driver_ids: Some(driver_ids.clone()),
                active_only: true,
                ..Default::default()
            }),
        )
        .await?;
        let inventory = port::call(
            "list_driver_inventory",
            timeout,
            cancel,
            store.list_driver_inventory(InventoryFilter {
                driver_ids: Some(driver_ids),
                ..Default::default()
            }),
        )
        .await?;

        let mut assignments_by_driver: HashMap<DriverId, Vec<DriverZoneAssignment>> =
            HashMap::new();
        for assignment in assignments {
            assignments_by_driver
                .entry(assignment.driver_id)
                .or_default()
                .push(assignment);
        }
        let mut inventory_by_driver: HashMap<DriverId, Vec<DriverInventoryRecord>> =
            HashMap::new();
        for record in inventory {
            inventory_by_driver
                .entry(record.driver_id)
                .or_default()
                .push(record);
        }

        let mut candidates: Vec<DriverCandidate> = statuses
            .into_iter()
            .map(|driver| {
                let assignments = assignments_by_driver
                    .remove(&driver.driver_id)
                    .unwrap_or_default();
                let inventory = inventory_by_driver
                    .remove(&driver.driver_id)
                    .unwrap_or_default();
                evaluate_one(driver, assignments, inventory, zone_id, items)
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.driver.driver_id.cmp(&b.driver.driver_id))
        });
        Ok(candidates)
    }

    /// Evaluate drivers and keep only those carrying every required item
    /// in full (`matches == true`), ranked best first.
    pub async fn find_eligible_drivers(
        &self,
        zone_id: Option<ZoneId>,
        items: &[OrderItem],
        cancel: &CancellationToken,
    ) -> Result<Vec<DriverCandidate>, DispatchError> {
        let mut candidates = self.evaluate_candidates(zone_id, items, cancel).await?;
        candidates.retain(|c| c.matches);
        Ok(candidates)
    }
}

/// Score a single driver against the order.
fn evaluate_one(
    driver: DriverStatusRecord,
    assignments: Vec<DriverZoneAssignment>,
    inventory: Vec<DriverInventoryRecord>,
    zone_id: Option<ZoneId>,
    items: &[OrderItem],
) -> DriverCandidate {
    let carried: HashMap<ProductId, i64> = inventory
        .iter()
        .map(|r| (r.product_id, i64::from(r.quantity)))
        .fold(HashMap::new(), |mut acc, (product, qty)| {
            *acc.entry(product).or_insert(0) += qty;
            acc
        });
    let total_carried: i64 = carried.values().sum();

    let shortfalls = scoring::compute_shortfalls(items, &carried);
    let total_missing = scoring::total_missing(&shortfalls);
    let matches = total_missing == 0;

    let has_zone_match = zone_id
        .map(|z| assignments.iter().any(|a| a.zone_id == z))
        .unwrap_or(false);

    let availability = driver.availability().unwrap_or_else(|| {
        tracing::warn!(
            driver_id = %driver.driver_id,
            status = %driver.status,
            "Unrecognised driver status, scoring as off_shift"
        );
        DriverAvailability::OffShift
    });

    let score = scoring::candidate_score(
        zone_id.is_some(),
        has_zone_match,
        total_carried,
        availability,
        total_missing,
    );

    DriverCandidate {
        driver,
        assignments,
        inventory,
        shortfalls,
        matches,
        score,
    }
}
