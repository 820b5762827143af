//! Assignment orchestration: pick the best candidate and commit.
//!
//! The commit is three sequential writes (order, driver status, movement
//! log) against a backend with no multi-table transaction on this path.
//! Two guards keep it sound:
//!
//! 1. A process-local per-driver lease held for the whole commit; a
//!    concurrent assignment that picks the same driver is rejected with
//!    a typed conflict.
//! 2. A re-read of the driver row under the lease, so a stale evaluation
//!    cannot commit against a driver that went offline or started
//!    delivering since.
//!
//! If a later step fails, earlier writes are compensated (order reverted,
//! driver status restored). The driver notification is fire-and-forget:
//! one attempt, failure logged and swallowed.

use std::sync::Arc;

use fleetline_core::driver::{DriverAvailability, MovementAction};
use fleetline_core::order::OrderStatus;
use fleetline_core::types::{DriverId, NotificationId, OrderId, ZoneId};
use fleetline_db::models::driver::{DriverStatusPatch, DriverStatusRecord};
use fleetline_db::models::movement::NewMovement;
use fleetline_db::models::notification::NewNotification;
use fleetline_db::models::order::{Order, OrderAssignmentPatch};
use fleetline_db::store::{Capability, DispatchStore, DriverStatusFilter, StoreError};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::evaluator::CandidateEvaluator;
use crate::leases::DriverLeaseRegistry;
use crate::port;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Why an assignment was rejected.
///
/// These are business outcomes, not errors; the caller renders them as
/// specific, actionable messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentFailureReason {
    /// No zone context was supplied and no driver qualified.
    NoZone,
    /// A zone was supplied but no driver in it satisfies the items.
    NoCandidates,
    /// The backend rejected one of the writes for authorization reasons.
    PermissionDenied,
    /// The chosen driver was claimed by a concurrent assignment or is no
    /// longer dispatchable.
    DriverAlreadyAssigned,
}

impl AssignmentFailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoZone => "no_zone",
            Self::NoCandidates => "no_candidates",
            Self::PermissionDenied => "permission_denied",
            Self::DriverAlreadyAssigned => "driver_already_assigned",
        }
    }

    /// Human-readable message for display in the UI.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoZone => "No online drivers are available",
            Self::NoCandidates => "No online driver in this zone can fulfil the order",
            Self::PermissionDenied => "The backend rejected the assignment",
            Self::DriverAlreadyAssigned => {
                "The selected driver was just assigned elsewhere; retry to pick another"
            }
        }
    }
}

/// A committed assignment.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchAssignment {
    pub order_id: OrderId,
    pub driver_id: DriverId,
    pub zone_id: Option<ZoneId>,
    /// The winning candidate's score.
    pub score: i64,
    /// Set when the driver notification was created.
    pub notification_id: Option<NotificationId>,
}

/// Outcome of an assignment attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssignmentOutcome {
    Assigned(DispatchAssignment),
    Rejected { reason: AssignmentFailureReason },
}

impl AssignmentOutcome {
    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned(_))
    }
}

/// Caller options for [`AssignmentOrchestrator::assign_order`].
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AssignmentOptions {
    /// Whether to notify the driver. Unset defers to
    /// [`DispatchConfig::notify_by_default`].
    pub notify: Option<bool>,
    /// Free-text note attached to the driver's status row.
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Selects the top-ranked eligible candidate for an order and commits
/// the assignment.
pub struct AssignmentOrchestrator {
    store: Arc<dyn DispatchStore>,
    evaluator: CandidateEvaluator,
    leases: DriverLeaseRegistry,
    config: DispatchConfig,
}

impl AssignmentOrchestrator {
    /// An orchestrator with its own lease registry.
    pub fn new(store: Arc<dyn DispatchStore>, config: DispatchConfig) -> Self {
        Self::with_leases(store, config, DriverLeaseRegistry::new())
    }

    /// An orchestrator sharing a lease registry with other orchestrators
    /// in the same process.
    pub fn with_leases(
        store: Arc<dyn DispatchStore>,
        config: DispatchConfig,
        leases: DriverLeaseRegistry,
    ) -> Self {
        Self {
            evaluator: CandidateEvaluator::new(Arc::clone(&store), config.clone()),
            store,
            leases,
            config,
        }
    }

    /// Assign `order` to the best eligible driver.
    ///
    /// Business rejections come back as [`AssignmentOutcome::Rejected`];
    /// infrastructure failures (missing capability, timeout, failed
    /// rollback) as `Err`.
    pub async fn assign_order(
        &self,
        order: &Order,
        zone_id: Option<ZoneId>,
        options: &AssignmentOptions,
        cancel: &CancellationToken,
    ) -> Result<AssignmentOutcome, DispatchError> {
        options
            .validate()
            .map_err(|e| DispatchError::Validation(e.to_string()))?;
        if order.assigned_driver.is_some() {
            return Err(DispatchError::Validation(format!(
                "Order {} already has an assigned driver",
                order.id
            )));
        }
        let store = self.store.as_ref();
        port::require(store, Capability::UpdateOrder, "update_order")?;
        port::require(store, Capability::UpdateDriverStatus, "update_driver_status")?;
        port::require(store, Capability::MovementLog, "log_movement")?;

        let candidates = self
            .evaluator
            .find_eligible_drivers(zone_id, order.items(), cancel)
            .await?;
        let Some(top) = candidates.first() else {
            let reason = if zone_id.is_some() {
                AssignmentFailureReason::NoCandidates
            } else {
                AssignmentFailureReason::NoZone
            };
            tracing::info!(
                order_id = %order.id,
                reason = reason.as_str(),
                "No eligible drivers for order"
            );
            return Ok(AssignmentOutcome::Rejected { reason });
        };
        let driver_id = top.driver_id();
        let score = top.score;

        // Held for the whole commit; released on every return path.
        let Some(_lease) = self.leases.try_acquire(driver_id) else {
            tracing::info!(
                order_id = %order.id,
                driver_id = %driver_id,
                "Driver lease held by a concurrent assignment"
            );
            return Ok(AssignmentOutcome::Rejected {
                reason: AssignmentFailureReason::DriverAlreadyAssigned,
            });
        };

        // Re-read under the lease; the evaluation may be stale.
        let Some(fresh) = self.fresh_driver_row(driver_id, cancel).await? else {
            return Ok(AssignmentOutcome::Rejected {
                reason: AssignmentFailureReason::DriverAlreadyAssigned,
            });
        };

        // Step 1: order -> confirmed, driver attached.
        let timeout = self.config.port_call_timeout;
        let step = port::call(
            "update_order",
            timeout,
            cancel,
            store.update_order(
                order.id,
                OrderAssignmentPatch {
                    status: OrderStatus::Confirmed,
                    assigned_driver: Some(driver_id),
                },
            ),
        )
        .await;
        if let Err(err) = step {
            return rejected_or_err(err);
        }

        // Step 2: driver -> delivering.
        let note = options
            .note
            .clone()
            .unwrap_or_else(|| format!("Delivering order {}", order.id));
        let step = port::call(
            "update_driver_status",
            timeout,
            cancel,
            store.update_driver_status(DriverStatusPatch {
                driver_id,
                status: DriverAvailability::Delivering,
                zone_id,
                is_online: None,
                note: Some(note),
            }),
        )
        .await;
        match step {
            Ok(true) => {}
            Ok(false) => {
                self.revert_order(order, "update_driver_status", missing_driver(driver_id))
                    .await?;
                return Err(DispatchError::NotFound {
                    entity: "driver",
                    id: driver_id.to_string(),
                });
            }
            Err(err) => {
                self.revert_order(order, "update_driver_status", err_ref(&err))
                    .await?;
                return rejected_or_err(err);
            }
        }

        // Step 3: movement log.
        let step = port::call(
            "log_movement",
            timeout,
            cancel,
            store.log_movement(NewMovement {
                driver_id,
                zone_id,
                product_id: None,
                quantity_change: None,
                action: MovementAction::OrderAssigned,
                details: Some(format!("Assigned to order {}", order.id)),
            }),
        )
        .await;
        if let Err(err) = step {
            self.revert_driver(&fresh, "log_movement").await?;
            self.revert_order(order, "log_movement", err_ref(&err)).await?;
            return rejected_or_err(err);
        }

        // Best-effort notification; never fails the assignment.
        let notify = options.notify.unwrap_or(self.config.notify_by_default);
        let notification_id = if notify {
            self.try_notify(order, driver_id, cancel).await
        } else {
            None
        };

        tracing::info!(
            order_id = %order.id,
            driver_id = %driver_id,
            zone_id = ?zone_id,
            score,
            "Order assigned"
        );
        Ok(AssignmentOutcome::Assigned(DispatchAssignment {
            order_id: order.id,
            driver_id,
            zone_id,
            score,
            notification_id,
        }))
    }

    /// Explicit unassignment flow: order back to `new` with the driver
    /// cleared, driver back to `available`, movement log appended.
    pub async fn unassign_order(
        &self,
        order: &Order,
        note: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError> {
        let Some(driver_id) = order.assigned_driver else {
            return Err(DispatchError::Validation(format!(
                "Order {} has no assigned driver",
                order.id
            )));
        };
        let store = self.store.as_ref();
        port::require(store, Capability::UpdateOrder, "update_order")?;
        port::require(store, Capability::UpdateDriverStatus, "update_driver_status")?;
        port::require(store, Capability::MovementLog, "log_movement")?;

        let timeout = self.config.port_call_timeout;
        port::call(
            "update_order",
            timeout,
            cancel,
            store.update_order(
                order.id,
                OrderAssignmentPatch {
                    status: OrderStatus::New,
                    assigned_driver: None,
                },
            ),
        )
        .await?;
        port::call(
            "update_driver_status",
            timeout,
            cancel,
            store.update_driver_status(DriverStatusPatch {
                driver_id,
                status: DriverAvailability::Available,
                zone_id: None,
                is_online: None,
                note: note.clone(),
            }),
        )
        .await?;
        port::call(
            "log_movement",
            timeout,
            cancel,
            store.log_movement(NewMovement {
                driver_id,
                zone_id: order.zone_id,
                product_id: None,
                quantity_change: None,
                action: MovementAction::OrderUnassigned,
                details: note.or_else(|| Some(format!("Unassigned from order {}", order.id))),
            }),
        )
        .await?;

        tracing::info!(order_id = %order.id, driver_id = %driver_id, "Order unassigned");
        Ok(())
    }

    /// Re-read the chosen driver's row. `None` means the driver is no
    /// longer dispatchable (offline, delivering, or gone).
    async fn fresh_driver_row(
        &self,
        driver_id: DriverId,
        cancel: &CancellationToken,
    ) -> Result<Option<DriverStatusRecord>, DispatchError> {
        let rows = port::call(
            "list_driver_statuses",
            self.config.port_call_timeout,
            cancel,
            self.store.list_driver_statuses(DriverStatusFilter {
                driver_id: Some(driver_id),
                only_online: true,
                ..Default::default()
            }),
        )
        .await?;
        let Some(row) = rows.into_iter().next() else {
            tracing::info!(driver_id = %driver_id, "Driver went offline before commit");
            return Ok(None);
        };
        let dispatchable = row
            .availability()
            .map(|a| a.is_dispatchable())
            .unwrap_or(false);
        if !dispatchable {
            tracing::info!(
                driver_id = %driver_id,
                status = %row.status,
                "Driver no longer dispatchable before commit"
            );
            return Ok(None);
        }
        Ok(Some(row))
    }

    /// Compensate step 1: put the order back to its pre-assignment state.
    ///
    /// Runs under a fresh cancellation token so a caller that has gone
    /// away cannot leave the order half-committed.
    async fn revert_order(
        &self,
        order: &Order,
        failed_operation: &'static str,
        original: DispatchError,
    ) -> Result<(), DispatchError> {
        let prior_status = order.current_status().unwrap_or(OrderStatus::New);
        let result = port::call(
            "update_order",
            self.config.port_call_timeout,
            &CancellationToken::new(),
            self.store.update_order(
                order.id,
                OrderAssignmentPatch {
                    status: prior_status,
                    assigned_driver: None,
                },
            ),
        )
        .await;
        match result {
            Ok(()) => {
                tracing::warn!(
                    order_id = %order.id,
                    failed_operation,
                    "Assignment step failed; order reverted"
                );
                Ok(())
            }
            Err(rollback_err) => {
                tracing::error!(
                    order_id = %order.id,
                    failed_operation,
                    error = %rollback_err,
                    "Order rollback failed; manual intervention required"
                );
                Err(DispatchError::RollbackFailed {
                    operation: failed_operation,
                    source: Box::new(original),
                    rollback_source: Box::new(rollback_err),
                })
            }
        }
    }

    /// Compensate step 2: restore the driver's pre-commit status row.
    async fn revert_driver(
        &self,
        prior: &DriverStatusRecord,
        failed_operation: &'static str,
    ) -> Result<(), DispatchError> {
        let status = prior
            .availability()
            .unwrap_or(DriverAvailability::Available);
        let result = port::call(
            "update_driver_status",
            self.config.port_call_timeout,
            &CancellationToken::new(),
            self.store.update_driver_status(DriverStatusPatch {
                driver_id: prior.driver_id,
                status,
                zone_id: prior.current_zone_id,
                is_online: None,
                note: prior.note.clone(),
            }),
        )
        .await;
        if let Err(err) = result {
            // The order revert that follows still runs; log loudly here.
            tracing::error!(
                driver_id = %prior.driver_id,
                failed_operation,
                error = %err,
                "Driver status rollback failed; manual intervention required"
            );
        }
        Ok(())
    }

    /// One notification attempt; failure is logged and swallowed.
    async fn try_notify(
        &self,
        order: &Order,
        driver_id: DriverId,
        cancel: &CancellationToken,
    ) -> Option<NotificationId> {
        let store = self.store.as_ref();
        if !store.supports(Capability::Notifications) {
            tracing::warn!(
                driver_id = %driver_id,
                "Notification capability not available, skipping driver notification"
            );
            return None;
        }
        let input = NewNotification {
            recipient_id: driver_id,
            title: "New delivery assignment".to_string(),
            message: format!("You have been assigned order {}.", order.id),
            kind: "order_assigned".to_string(),
            action_url: Some(format!("/orders/{}", order.id)),
        };
        match port::call(
            "create_notification",
            self.config.port_call_timeout,
            cancel,
            store.create_notification(input),
        )
        .await
        {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::warn!(
                    driver_id = %driver_id,
                    order_id = %order.id,
                    error = %err,
                    "Driver notification failed, continuing"
                );
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a write failure: permission problems are a business rejection,
/// everything else propagates.
fn rejected_or_err(err: DispatchError) -> Result<AssignmentOutcome, DispatchError> {
    match err {
        DispatchError::Store {
            source: StoreError::PermissionDenied(reason),
            operation,
        } => {
            tracing::warn!(operation, reason = %reason, "Assignment write rejected by backend");
            Ok(AssignmentOutcome::Rejected {
                reason: AssignmentFailureReason::PermissionDenied,
            })
        }
        other => Err(other),
    }
}

/// The original-failure placeholder used when step 2 matched no row.
fn missing_driver(driver_id: DriverId) -> DispatchError {
    DispatchError::NotFound {
        entity: "driver",
        id: driver_id.to_string(),
    }
}

/// Clone-ish view of an error for rollback bookkeeping.
///
/// `DispatchError` does not implement `Clone` (sqlx errors are not
/// clonable), so the rollback path re-wraps the message.
fn err_ref(err: &DispatchError) -> DispatchError {
    DispatchError::Validation(err.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
