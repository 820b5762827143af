//! Order entity model and assignment patch DTO.

use fleetline_core::error::CoreError;
use fleetline_core::order::{OrderItem, OrderStatus};
use fleetline_core::types::{DriverId, OrderId, Timestamp, ZoneId};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `orders` table.
///
/// Lifecycle timestamps are set by the store as the matching transition
/// happens; a status reached twice (after an unassignment) keeps the
/// latest time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: String,
    pub items: Json<Vec<OrderItem>>,
    pub assigned_driver: Option<DriverId>,
    pub zone_id: Option<ZoneId>,
    pub created_at: Timestamp,
    pub confirmed_at: Option<Timestamp>,
    pub preparing_at: Option<Timestamp>,
    pub ready_at: Option<Timestamp>,
    pub out_for_delivery_at: Option<Timestamp>,
    pub delivered_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
}

impl Order {
    /// Parse the stored status text into the lifecycle enum.
    pub fn current_status(&self) -> Result<OrderStatus, CoreError> {
        OrderStatus::from_str_value(&self.status)
    }

    /// The required line items.
    pub fn items(&self) -> &[OrderItem] {
        &self.items.0
    }

    /// Whether this order is in the outstanding window
    /// (`confirmed..=out_for_delivery`). Malformed statuses count as not
    /// outstanding.
    pub fn is_outstanding(&self) -> bool {
        self.current_status()
            .map(|s| s.is_outstanding())
            .unwrap_or(false)
    }
}

/// DTO for the order mutation the dispatch subsystem performs.
///
/// `assigned_driver: None` clears the column, which is what the
/// unassignment flow and the rollback path rely on.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderAssignmentPatch {
    pub status: OrderStatus,
    pub assigned_driver: Option<DriverId>,
}
