//! Driver utilization math and availability-prediction heuristics.
//!
//! Pure functions used by the workload analytics service. These are
//! reporting heuristics, not a statistical model: time-to-availability is
//! a straight multiplication of active orders by the driver's average
//! delivery time.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Utilization percentage above which a driver is flagged as overloaded.
pub const OVERLOAD_UTILIZATION_PCT: f64 = 80.0;

/// Utilization percentage a driver must be under to receive
/// rebalanced work.
pub const REBALANCE_RECEIVER_MAX_PCT: f64 = 50.0;

/// Average delivery time assumed for drivers with no calibration data.
pub const DEFAULT_AVG_DELIVERY_MINUTES: f64 = 30.0;

/// Active-order count at or below which a prediction is "High" confidence.
pub const HIGH_CONFIDENCE_MAX_ACTIVE: i32 = 0;

/// Active-order count at or below which a prediction is "Medium" confidence.
pub const MEDIUM_CONFIDENCE_MAX_ACTIVE: i32 = 2;

// ---------------------------------------------------------------------------
// Utilization
// ---------------------------------------------------------------------------

/// Utilization as a percentage of capacity. A zero capacity is treated as
/// one so an unconfigured driver with any active order shows as loaded
/// rather than dividing by zero.
pub fn utilization_pct(active_orders: i32, max_capacity: i32) -> f64 {
    let capacity = f64::from(max_capacity.max(1));
    f64::from(active_orders.max(0)) / capacity * 100.0
}

/// Whether a utilization percentage counts as overloaded.
pub fn is_overloaded(utilization_pct: f64) -> bool {
    utilization_pct > OVERLOAD_UTILIZATION_PCT
}

// ---------------------------------------------------------------------------
// Availability prediction
// ---------------------------------------------------------------------------

/// Confidence level of an availability prediction.
///
/// Derived from how much open work the estimate has to extrapolate over:
/// an idle driver is a certainty, a heavily loaded one is a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionConfidence {
    High,
    Medium,
    Low,
}

impl PredictionConfidence {
    /// Derive confidence from the number of active orders the estimate
    /// extrapolates over.
    pub fn from_active_orders(active_orders: i32) -> Self {
        if active_orders <= HIGH_CONFIDENCE_MAX_ACTIVE {
            Self::High
        } else if active_orders <= MEDIUM_CONFIDENCE_MAX_ACTIVE {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Human-readable label for display in the UI.
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// Estimated minutes until a driver finishes all active orders.
pub fn estimated_busy_minutes(active_orders: i32, avg_delivery_minutes: f64) -> f64 {
    f64::from(active_orders.max(0)) * avg_delivery_minutes.max(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
