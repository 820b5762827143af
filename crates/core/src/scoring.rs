//! Candidate eligibility and best-driver scoring math.
//!
//! Pure functions and weight constants used by the dispatch services.
//! Candidate scores are integer sums of four weighted components; the
//! geodistance search uses a separate floating-point composite score.

use std::collections::HashMap;

use serde::Serialize;

use crate::driver::DriverAvailability;
use crate::order::OrderItem;
use crate::types::ProductId;

// ---------------------------------------------------------------------------
// Candidate score weights
// ---------------------------------------------------------------------------

/// Weight for a driver with an active assignment to the requested zone
/// (or when no zone was requested at all).
pub const ZONE_MATCH_WEIGHT: i64 = 50;

/// Weight for a driver without an active assignment to the requested zone.
pub const ZONE_MISMATCH_WEIGHT: i64 = 10;

/// Cap on the carried-inventory component: one point per carried unit,
/// at most this many.
pub const INVENTORY_WEIGHT_CAP: i64 = 40;

/// Status component for `available` drivers.
pub const STATUS_AVAILABLE_WEIGHT: i64 = 25;

/// Status component for `on_break` drivers.
pub const STATUS_ON_BREAK_WEIGHT: i64 = 10;

/// Fulfillment component for a driver carrying every required item in full.
pub const FULL_MATCH_WEIGHT: i64 = 100;

/// Base of the fulfillment component for partial matches.
pub const PARTIAL_MATCH_BASE_WEIGHT: i64 = 80;

/// Penalty per missing unit, subtracted from the partial-match base.
pub const MISSING_UNIT_PENALTY: i64 = 20;

// ---------------------------------------------------------------------------
// Geodistance search weights
// ---------------------------------------------------------------------------

/// Base score every driver starts the geodistance search with.
pub const SEARCH_BASE_SCORE: f64 = 10.0;

/// Multiplier on a driver's rating (0..=5) when rating is enabled.
pub const RATING_WEIGHT: f64 = 15.0;

/// Multiplier on a driver's remaining capacity fraction when load is enabled.
pub const CAPACITY_HEADROOM_WEIGHT: f64 = 25.0;

/// Maximum proximity component, awarded at distance zero.
pub const PROXIMITY_WEIGHT_MAX: f64 = 50.0;

/// Proximity penalty per kilometre of distance.
pub const PROXIMITY_KM_PENALTY: f64 = 5.0;

// ---------------------------------------------------------------------------
// Shortfalls
// ---------------------------------------------------------------------------

/// The quantity of one required product a driver does not carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemShortfall {
    pub product_id: ProductId,
    pub missing: i64,
}

/// Compute the per-item shortfall of a driver's carried stock against the
/// required items. A product absent from `carried` counts as zero carried.
///
/// Returns one entry per required item, in the order the items were given.
pub fn compute_shortfalls(
    required: &[OrderItem],
    carried: &HashMap<ProductId, i64>,
) -> Vec<ItemShortfall> {
    required
        .iter()
        .map(|item| {
            let on_hand = carried.get(&item.product_id).copied().unwrap_or(0);
            ItemShortfall {
                product_id: item.product_id,
                missing: (i64::from(item.quantity) - on_hand).max(0),
            }
        })
        .collect()
}

/// Total missing units across all shortfalls.
pub fn total_missing(shortfalls: &[ItemShortfall]) -> i64 {
    shortfalls.iter().map(|s| s.missing).sum()
}

// ---------------------------------------------------------------------------
// Candidate score components
// ---------------------------------------------------------------------------

/// Zone component: a request without a zone treats every driver as
/// zone-preferred.
pub fn zone_weight(zone_requested: bool, has_zone_match: bool) -> i64 {
    if !zone_requested || has_zone_match {
        ZONE_MATCH_WEIGHT
    } else {
        ZONE_MISMATCH_WEIGHT
    }
}

/// Inventory component: one point per carried unit across all products,
/// capped at [`INVENTORY_WEIGHT_CAP`].
pub fn inventory_weight(total_carried_units: i64) -> i64 {
    total_carried_units.clamp(0, INVENTORY_WEIGHT_CAP)
}

/// Status component of the candidate score.
pub fn status_weight(status: DriverAvailability) -> i64 {
    match status {
        DriverAvailability::Available => STATUS_AVAILABLE_WEIGHT,
        DriverAvailability::OnBreak => STATUS_ON_BREAK_WEIGHT,
        DriverAvailability::Delivering | DriverAvailability::OffShift => 0,
    }
}

/// Fulfillment component: full carriers get [`FULL_MATCH_WEIGHT`]; partial
/// carriers start at [`PARTIAL_MATCH_BASE_WEIGHT`] and lose
/// [`MISSING_UNIT_PENALTY`] per missing unit, floored at zero.
pub fn fulfillment_weight(total_missing_units: i64) -> i64 {
    if total_missing_units == 0 {
        FULL_MATCH_WEIGHT
    } else {
        (PARTIAL_MATCH_BASE_WEIGHT - MISSING_UNIT_PENALTY * total_missing_units).max(0)
    }
}

/// Composite candidate score.
pub fn candidate_score(
    zone_requested: bool,
    has_zone_match: bool,
    total_carried_units: i64,
    status: DriverAvailability,
    total_missing_units: i64,
) -> i64 {
    zone_weight(zone_requested, has_zone_match)
        + inventory_weight(total_carried_units)
        + status_weight(status)
        + fulfillment_weight(total_missing_units)
}

// ---------------------------------------------------------------------------
// Geodistance search score components
// ---------------------------------------------------------------------------

/// Rating component: `rating * 15`. A driver without a rating contributes
/// nothing.
pub fn rating_score(rating: Option<f64>) -> f64 {
    rating.unwrap_or(0.0) * RATING_WEIGHT
}

/// Remaining-capacity component: `(1 - load/capacity) * 25`, clamped so a
/// driver at or over capacity contributes nothing. A zero capacity is
/// treated as one to avoid division by zero.
pub fn headroom_score(active_orders: i32, max_capacity: i32) -> f64 {
    let capacity = f64::from(max_capacity.max(1));
    let load = f64::from(active_orders.max(0));
    ((1.0 - load / capacity) * CAPACITY_HEADROOM_WEIGHT).max(0.0)
}

/// Proximity component: `max(0, 50 - 5 * distance_km)`.
pub fn proximity_score(distance_km: f64) -> f64 {
    (PROXIMITY_WEIGHT_MAX - PROXIMITY_KM_PENALTY * distance_km).max(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn item(product_id: Uuid, quantity: i32) -> OrderItem {
        OrderItem {
            product_id,
            quantity,
        }
    }

    // -- compute_shortfalls --------------------------------------------------

    #[test]
    fn shortfall_zero_when_fully_carried() {
        let p = Uuid::new_v4();
        let carried = HashMap::from([(p, 10)]);
        let shortfalls = compute_shortfalls(&[item(p, 5)], &carried);
        assert_eq!(shortfalls.len(), 1);
        assert_eq!(shortfalls[0].missing, 0);
    }

    #[test]
    fn shortfall_counts_missing_units() {
        let p = Uuid::new_v4();
        let carried = HashMap::from([(p, 2)]);
        let shortfalls = compute_shortfalls(&[item(p, 5)], &carried);
        assert_eq!(shortfalls[0].missing, 3);
    }

    #[test]
    fn absent_product_counts_as_zero_carried() {
        let p = Uuid::new_v4();
        let shortfalls = compute_shortfalls(&[item(p, 4)], &HashMap::new());
        assert_eq!(shortfalls[0].missing, 4);
    }

    #[test]
    fn surplus_does_not_go_negative() {
        let p = Uuid::new_v4();
        let carried = HashMap::from([(p, 100)]);
        let shortfalls = compute_shortfalls(&[item(p, 1)], &carried);
        assert_eq!(shortfalls[0].missing, 0);
    }

    #[test]
    fn one_entry_per_required_item() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let carried = HashMap::from([(a, 1)]);
        let shortfalls = compute_shortfalls(&[item(a, 2), item(b, 3)], &carried);
        assert_eq!(shortfalls.len(), 2);
        assert_eq!(total_missing(&shortfalls), 1 + 3);
    }

    // -- zone_weight ---------------------------------------------------------

    #[test]
    fn zone_match_scores_fifty() {
        assert_eq!(zone_weight(true, true), 50);
    }

    #[test]
    fn zone_mismatch_scores_ten() {
        assert_eq!(zone_weight(true, false), 10);
    }

    #[test]
    fn no_zone_requested_treated_as_preferred() {
        assert_eq!(zone_weight(false, false), 50);
    }

    // -- inventory_weight ----------------------------------------------------

    #[test]
    fn inventory_weight_is_unit_count_below_cap() {
        assert_eq!(inventory_weight(10), 10);
    }

    #[test]
    fn inventory_weight_caps_at_forty() {
        assert_eq!(inventory_weight(400), 40);
    }

    #[test]
    fn inventory_weight_floors_at_zero() {
        assert_eq!(inventory_weight(-5), 0);
    }

    // -- status_weight -------------------------------------------------------

    #[test]
    fn status_weights() {
        assert_eq!(status_weight(DriverAvailability::Available), 25);
        assert_eq!(status_weight(DriverAvailability::OnBreak), 10);
        assert_eq!(status_weight(DriverAvailability::Delivering), 0);
        assert_eq!(status_weight(DriverAvailability::OffShift), 0);
    }

    // -- fulfillment_weight --------------------------------------------------

    #[test]
    fn full_match_scores_one_hundred() {
        assert_eq!(fulfillment_weight(0), 100);
    }

    #[test]
    fn each_missing_unit_costs_twenty_from_eighty() {
        assert_eq!(fulfillment_weight(1), 60);
        assert_eq!(fulfillment_weight(2), 40);
        assert_eq!(fulfillment_weight(4), 0);
    }

    #[test]
    fn fulfillment_weight_floors_at_zero() {
        assert_eq!(fulfillment_weight(10), 0);
    }

    // -- candidate_score worked examples -------------------------------------

    #[test]
    fn available_zone_matched_full_carrier_scores_185() {
        // Online, available, active assignment to the requested zone,
        // carrying 10 units of the one required product (5 needed):
        // 50 (zone) + 10 (inventory) + 25 (available) + 100 (fulfillment).
        let score = candidate_score(true, true, 10, DriverAvailability::Available, 0);
        assert_eq!(score, 185);
    }

    #[test]
    fn on_break_zone_mismatched_full_carrier_scores_130() {
        // 10 (zone mismatch) + 10 (inventory) + 10 (on_break) + 100.
        let score = candidate_score(true, false, 10, DriverAvailability::OnBreak, 0);
        assert_eq!(score, 130);
    }

    // -- geodistance components ----------------------------------------------

    #[test]
    fn rating_score_scales_by_fifteen() {
        assert!((rating_score(Some(4.0)) - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_rating_contributes_nothing() {
        assert!((rating_score(None) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn idle_driver_gets_full_headroom() {
        assert!((headroom_score(0, 5) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn half_loaded_driver_gets_half_headroom() {
        assert!((headroom_score(2, 4) - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn overloaded_driver_gets_zero_headroom() {
        assert!((headroom_score(7, 4) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_capacity_treated_as_one() {
        // Guard against division by zero; an idle driver still gets headroom.
        assert!((headroom_score(0, 0) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn proximity_score_at_origin_is_fifty() {
        assert!((proximity_score(0.0) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn proximity_score_loses_five_per_km() {
        assert!((proximity_score(4.0) - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn proximity_score_floors_at_zero_beyond_ten_km() {
        assert!((proximity_score(12.0) - 0.0).abs() < f64::EPSILON);
    }
}
