//! Driver availability and movement-log action enums.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

/// A driver's self-reported availability, stored as text in the
/// `driver_statuses` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverAvailability {
    Available,
    OnBreak,
    Delivering,
    OffShift,
}

impl DriverAvailability {
    /// Convert from the database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "available" => Ok(Self::Available),
            "on_break" => Ok(Self::OnBreak),
            "delivering" => Ok(Self::Delivering),
            "off_shift" => Ok(Self::OffShift),
            _ => Err(CoreError::Validation(format!(
                "Invalid driver availability '{s}'"
            ))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::OnBreak => "on_break",
            Self::Delivering => "delivering",
            Self::OffShift => "off_shift",
        }
    }

    /// Whether a driver in this state may be handed a new order.
    ///
    /// `delivering` drivers are already committed; `off_shift` drivers are
    /// out entirely. `on_break` drivers are dispatchable at a score penalty.
    pub fn is_dispatchable(&self) -> bool {
        matches!(self, Self::Available | Self::OnBreak)
    }
}

// ---------------------------------------------------------------------------
// Movement log actions
// ---------------------------------------------------------------------------

/// Action tag for an entry in the append-only driver movement log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementAction {
    OrderAssigned,
    OrderUnassigned,
    StatusChanged,
    ZoneJoined,
    ZoneLeft,
    InventoryAdjusted,
}

impl MovementAction {
    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderAssigned => "order_assigned",
            Self::OrderUnassigned => "order_unassigned",
            Self::StatusChanged => "status_changed",
            Self::ZoneJoined => "zone_joined",
            Self::ZoneLeft => "zone_left",
            Self::InventoryAdjusted => "inventory_adjusted",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
