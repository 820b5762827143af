//! Read-only workload analytics and availability prediction.
//!
//! Not a control loop: `balance_workload` emits textual recommendations
//! for a human dispatcher, it never moves an order itself.

use std::collections::HashMap;
use std::sync::Arc;

use fleetline_core::order::OUTSTANDING_STATUSES;
use fleetline_core::types::DriverId;
use fleetline_core::workload::{
    estimated_busy_minutes, is_overloaded, utilization_pct, PredictionConfidence,
    OVERLOAD_UTILIZATION_PCT, REBALANCE_RECEIVER_MAX_PCT,
};
use fleetline_db::store::{Capability, DispatchStore, OrderFilter, ProfileFilter};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::port;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// One driver's current load.
#[derive(Debug, Clone, Serialize)]
pub struct DriverWorkload {
    pub driver_id: DriverId,
    pub display_name: String,
    /// Outstanding orders currently assigned to the driver.
    pub active_orders: i32,
    pub max_capacity: i32,
    pub utilization_pct: f64,
    pub is_overloaded: bool,
}

/// A suggested order move from an overloaded driver to an underused one.
#[derive(Debug, Clone, Serialize)]
pub struct RebalanceRecommendation {
    pub from_driver: DriverId,
    pub to_driver: DriverId,
    pub from_utilization_pct: f64,
    pub to_utilization_pct: f64,
    /// Human-readable recommendation for the dispatcher.
    pub message: String,
}

/// Heuristic estimate of when a driver frees up.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityPrediction {
    pub driver_id: DriverId,
    pub active_orders: i32,
    pub estimated_busy_minutes: f64,
    /// Whether the driver is expected free within the requested horizon.
    pub available_within_horizon: bool,
    pub confidence: PredictionConfidence,
    /// Human-readable explanation of the estimate.
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Computes workload distributions, rebalance suggestions, and
/// availability predictions over the driver/order data.
pub struct WorkloadAnalyzer {
    store: Arc<dyn DispatchStore>,
    config: DispatchConfig,
}

impl WorkloadAnalyzer {
    pub fn new(store: Arc<dyn DispatchStore>, config: DispatchConfig) -> Self {
        Self { store, config }
    }

    /// Per-driver utilization, most loaded first.
    pub async fn workload_distribution(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<DriverWorkload>, DispatchError> {
        let (profiles, active_counts) = self.load_inputs(cancel).await?;

        let mut distribution: Vec<DriverWorkload> = profiles
            .into_iter()
            .map(|profile| {
                let active_orders = active_counts
                    .get(&profile.driver_id)
                    .copied()
                    .unwrap_or(0);
                let utilization = utilization_pct(active_orders, profile.max_capacity);
                DriverWorkload {
                    driver_id: profile.driver_id,
                    display_name: profile.display_name,
                    active_orders,
                    max_capacity: profile.max_capacity,
                    utilization_pct: utilization,
                    is_overloaded: is_overloaded(utilization),
                }
            })
            .collect();
        distribution.sort_by(|a, b| {
            b.utilization_pct
                .partial_cmp(&a.utilization_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.driver_id.cmp(&b.driver_id))
        });
        Ok(distribution)
    }

    /// Pair each driver above `threshold_pct` (default 80%) with the
    /// least-utilized driver under 50%, as a textual recommendation.
    ///
    /// Each pairing counts one hypothetical order against the receiver so
    /// successive recommendations spread over several underused drivers
    /// instead of piling onto one.
    pub async fn balance_workload(
        &self,
        threshold_pct: Option<f64>,
        cancel: &CancellationToken,
    ) -> Result<Vec<RebalanceRecommendation>, DispatchError> {
        let threshold = threshold_pct.unwrap_or(OVERLOAD_UTILIZATION_PCT);
        let distribution = self.workload_distribution(cancel).await?;

        let overloaded: Vec<&DriverWorkload> = distribution
            .iter()
            .filter(|w| w.utilization_pct > threshold)
            .collect();
        let mut receivers: Vec<DriverWorkload> = distribution
            .iter()
            .filter(|w| w.utilization_pct < REBALANCE_RECEIVER_MAX_PCT)
            .cloned()
            .collect();
        if overloaded.is_empty() || receivers.is_empty() {
            return Ok(Vec::new());
        }

        let mut recommendations = Vec::new();
        for from in overloaded {
            // A low custom threshold can make a driver both overloaded and
            // a receiver; never pair a driver with itself.
            let Some(to) = receivers
                .iter_mut()
                .filter(|w| w.driver_id != from.driver_id)
                .min_by(|a, b| {
                    a.utilization_pct
                        .partial_cmp(&b.utilization_pct)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.driver_id.cmp(&b.driver_id))
                })
            else {
                continue;
            };
            recommendations.push(RebalanceRecommendation {
                from_driver: from.driver_id,
                to_driver: to.driver_id,
                from_utilization_pct: from.utilization_pct,
                to_utilization_pct: to.utilization_pct,
                message: format!(
                    "Move one active order from {} ({:.0}% utilized) to {} ({:.0}% utilized)",
                    from.display_name, from.utilization_pct, to.display_name, to.utilization_pct
                ),
            });
            to.active_orders += 1;
            to.utilization_pct = utilization_pct(to.active_orders, to.max_capacity);
        }
        Ok(recommendations)
    }

    /// Estimate whether a driver will be free within `hours_ahead`.
    pub async fn predict_availability(
        &self,
        driver_id: DriverId,
        hours_ahead: f64,
        cancel: &CancellationToken,
    ) -> Result<AvailabilityPrediction, DispatchError> {
        if !(hours_ahead > 0.0) {
            return Err(DispatchError::Validation(
                "hours_ahead must be positive".to_string(),
            ));
        }
        let store = self.store.as_ref();
        port::require(store, Capability::DriverProfiles, "list_driver_profiles")?;
        port::require(store, Capability::Orders, "list_orders")?;

        let timeout = self.config.port_call_timeout;
        let profiles = port::call(
            "list_driver_profiles",
            timeout,
            cancel,
            store.list_driver_profiles(ProfileFilter {
                driver_ids: Some(vec![driver_id]),
                ..Default::default()
            }),
        )
        .await?;
        let Some(profile) = profiles.into_iter().next() else {
            return Err(DispatchError::NotFound {
                entity: "driver",
                id: driver_id.to_string(),
            });
        };

        let orders = port::call(
            "list_orders",
            timeout,
            cancel,
            store.list_orders(OrderFilter {
                statuses: Some(OUTSTANDING_STATUSES.to_vec()),
            }),
        )
        .await?;
        let active_orders = orders
            .iter()
            .filter(|o| o.assigned_driver == Some(driver_id))
            .count() as i32;

        let avg_minutes = profile
            .avg_delivery_minutes
            .filter(|m| *m > 0.0)
            .unwrap_or(self.config.default_avg_delivery_minutes);
        let busy_minutes = estimated_busy_minutes(active_orders, avg_minutes);
        let horizon_minutes = hours_ahead * 60.0;
        let available_within_horizon = busy_minutes <= horizon_minutes;
        let confidence = PredictionConfidence::from_active_orders(active_orders);

        let reason = if active_orders == 0 {
            format!("{} has no active orders and is free now", profile.display_name)
        } else {
            format!(
                "{} has {} active orders at ~{:.0} min each, free in about {:.0} minutes",
                profile.display_name, active_orders, avg_minutes, busy_minutes
            )
        };

        Ok(AvailabilityPrediction {
            driver_id,
            active_orders,
            estimated_busy_minutes: busy_minutes,
            available_within_horizon,
            confidence,
            reason,
        })
    }

    /// Fetch profiles and count outstanding orders per driver.
    async fn load_inputs(
        &self,
        cancel: &CancellationToken,
    ) -> Result<
        (
            Vec<fleetline_db::models::driver::DriverProfile>,
            HashMap<DriverId, i32>,
        ),
        DispatchError,
    > {
        let store = self.store.as_ref();
        port::require(store, Capability::DriverProfiles, "list_driver_profiles")?;
        port::require(store, Capability::Orders, "list_orders")?;

        let timeout = self.config.port_call_timeout;
        let profiles = port::call(
            "list_driver_profiles",
            timeout,
            cancel,
            store.list_driver_profiles(ProfileFilter::default()),
        )
        .await?;
        let orders = port::call(
            "list_orders",
            timeout,
            cancel,
            store.list_orders(OrderFilter {
                statuses: Some(OUTSTANDING_STATUSES.to_vec()),
            }),
        )
        .await?;

        let mut active_counts: HashMap<DriverId, i32> = HashMap::new();
        for order in &orders {
            if let Some(driver) = order.assigned_driver {
                *active_counts.entry(driver).or_insert(0) += 1;
            }
        }
        Ok((profiles, active_counts))
    }
}
