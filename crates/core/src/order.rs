//! Order lifecycle enum, required items, and the transition state machine.
//!
//! Orders move along an ordered lifecycle; `cancelled` is a terminal side
//! state reachable from every non-terminal status. Assignment is the only
//! flow that sets `assigned_driver`, and it does so together with the
//! `new -> confirmed` transition. Explicit unassignment reverses that and
//! is handled by the orchestrator outside of this state machine.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::ProductId;

// ---------------------------------------------------------------------------
// Status enum
// ---------------------------------------------------------------------------

/// Lifecycle status of an order, stored as text in the `orders` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

/// Statuses considered "outstanding": assigned but not yet delivered.
pub const OUTSTANDING_STATUSES: &[OrderStatus] = &[
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::OutForDelivery,
];

impl OrderStatus {
    /// Convert from the database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "new" => Ok(Self::New),
            "confirmed" => Ok(Self::Confirmed),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(CoreError::Validation(format!("Invalid order status '{s}'"))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// True for statuses between `confirmed` and `out_for_delivery` inclusive.
    pub fn is_outstanding(&self) -> bool {
        OUTSTANDING_STATUSES.contains(self)
    }

    /// Terminal statuses allow no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

// ---------------------------------------------------------------------------
// Order items
// ---------------------------------------------------------------------------

/// A required line item on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Returns the set of valid target statuses reachable from `from`.
///
/// Terminal states (`delivered`, `cancelled`) return an empty slice.
pub fn valid_transitions(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match from {
        New => &[Confirmed, Cancelled],
        Confirmed => &[Preparing, Cancelled],
        Preparing => &[Ready, Cancelled],
        Ready => &[OutForDelivery, Cancelled],
        OutForDelivery => &[Delivered, Cancelled],
        Delivered | Cancelled => &[],
    }
}

/// Check whether a transition from `from` to `to` is valid.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a state transition, returning a descriptive error for invalid ones.
pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Invalid order transition: {} -> {}",
            from.as_str(),
            to.as_str()
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
