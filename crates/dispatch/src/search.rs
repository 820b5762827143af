//! Geodistance-aware best-driver search.
//!
//! Used when the caller has customer coordinates rather than (or in
//! addition to) a zone. Filters run in stages (availability, distance,
//! then rating/zone preferences); an empty pool at any stage comes
//! back as a typed failure carrying the best survivors of the previous
//! stage, so the UI can still offer near-misses.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use fleetline_core::geo::haversine_km;
use fleetline_core::scoring::{
    headroom_score, proximity_score, rating_score, SEARCH_BASE_SCORE,
};
use fleetline_core::types::{DriverId, ZoneId};
use fleetline_db::models::driver::DriverProfile;
use fleetline_db::store::{Capability, DispatchStore, ProfileFilter, ZoneAssignmentFilter};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::port;

/// How many runner-up drivers an outcome carries.
const MAX_ALTERNATIVES: usize = 3;

// ---------------------------------------------------------------------------
// Preferences and outcome types
// ---------------------------------------------------------------------------

/// Caller preferences for the search.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct SearchPreferences {
    /// Drop drivers farther than this from the customer. Unset means no
    /// distance cut-off.
    #[validate(range(min = 0.1, max = 1000.0))]
    pub max_distance_km: Option<f64>,
    /// Drop drivers rated below this.
    #[validate(range(min = 0.0, max = 5.0))]
    pub min_rating: Option<f64>,
    /// Keep only drivers actively assigned to one of these zones.
    /// Empty means no zone constraint.
    pub preferred_zones: Vec<ZoneId>,
    /// Whether rating contributes to the score.
    pub use_rating: bool,
    /// Whether current load contributes to the score.
    pub use_load: bool,
    /// Whether proximity contributes to the score.
    pub use_proximity: bool,
}

impl Default for SearchPreferences {
    fn default() -> Self {
        Self {
            max_distance_km: None,
            min_rating: None,
            preferred_zones: Vec::new(),
            use_rating: true,
            use_load: true,
            use_proximity: true,
        }
    }
}

/// A driver scored by the search.
#[derive(Debug, Clone, Serialize)]
pub struct RankedDriver {
    pub profile: DriverProfile,
    /// Distance from the customer; `None` when the driver has never
    /// pushed a position.
    pub distance_km: Option<f64>,
    pub score: f64,
}

/// Why the search found no best driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFailureReason {
    /// No driver was available at all, or none within range.
    NoAvailableDrivers,
    /// Available drivers exist but none pass the rating/zone preferences.
    NoMatchingDrivers,
}

/// Result of a best-driver search: the winner (if any), up to three
/// runners-up, and the failure reason when there is no winner.
#[derive(Debug, Clone, Serialize)]
pub struct DriverSearchOutcome {
    pub best: Option<RankedDriver>,
    pub alternatives: Vec<RankedDriver>,
    pub failure: Option<SearchFailureReason>,
}

// ---------------------------------------------------------------------------
// Search service
// ---------------------------------------------------------------------------

/// Ranks available drivers by rating, load, and proximity to a customer.
pub struct BestDriverSearch {
    store: Arc<dyn DispatchStore>,
    config: DispatchConfig,
}

impl BestDriverSearch {
    pub fn new(store: Arc<dyn DispatchStore>, config: DispatchConfig) -> Self {
        Self { store, config }
    }

    /// Find the best available driver for a customer location.
    pub async fn find_best_driver(
        &self,
        customer_lat: f64,
        customer_lng: f64,
        preferences: &SearchPreferences,
        cancel: &CancellationToken,
    ) -> Result<DriverSearchOutcome, DispatchError> {
        preferences
            .validate()
            .map_err(|e| DispatchError::Validation(e.to_string()))?;
        let store = self.store.as_ref();
        port::require(store, Capability::DriverProfiles, "list_driver_profiles")?;
        if !preferences.preferred_zones.is_empty() {
            port::require(store, Capability::DriverZones, "list_driver_zones")?;
        }

        let timeout = self.config.port_call_timeout;
        let profiles = port::call(
            "list_driver_profiles",
            timeout,
            cancel,
            store.list_driver_profiles(ProfileFilter {
                only_available: true,
                ..Default::default()
            }),
        )
        .await?;
        if profiles.is_empty() {
            tracing::info!("Best-driver search found no available drivers");
            return Ok(DriverSearchOutcome {
                best: None,
                alternatives: Vec::new(),
                failure: Some(SearchFailureReason::NoAvailableDrivers),
            });
        }

        let all: Vec<RankedDriver> = profiles
            .into_iter()
            .map(|profile| rank(profile, customer_lat, customer_lng, preferences))
            .collect();

        // Stage 1: distance cut-off. Drivers without a known position
        // cannot prove they are in range.
        let in_range: Vec<RankedDriver> = match preferences.max_distance_km {
            Some(max) => all
                .iter()
                .filter(|r| r.distance_km.map(|d| d <= max).unwrap_or(false))
                .cloned()
                .collect(),
            None => all.clone(),
        };
        if in_range.is_empty() {
            return Ok(DriverSearchOutcome {
                best: None,
                alternatives: top(all, MAX_ALTERNATIVES),
                failure: Some(SearchFailureReason::NoAvailableDrivers),
            });
        }

        // Stage 2: rating and zone preferences.
        let mut matching: Vec<RankedDriver> = match preferences.min_rating {
            Some(min) => in_range
                .iter()
                .filter(|r| r.profile.rating.unwrap_or(0.0) >= min)
                .cloned()
                .collect(),
            None => in_range.clone(),
        };
        if !preferences.preferred_zones.is_empty() && !matching.is_empty() {
            let member_ids = self
                .zone_members(&matching, &preferences.preferred_zones, cancel)
                .await?;
            matching.retain(|r| member_ids.contains(&r.profile.driver_id));
        }
        if matching.is_empty() {
            return Ok(DriverSearchOutcome {
                best: None,
                alternatives: top(in_range, MAX_ALTERNATIVES),
                failure: Some(SearchFailureReason::NoMatchingDrivers),
            });
        }

        let mut ranked = top(matching, MAX_ALTERNATIVES + 1);
        let best = ranked.remove(0);
        tracing::debug!(
            driver_id = %best.profile.driver_id,
            score = best.score,
            distance_km = ?best.distance_km,
            "Best-driver search selected a winner"
        );
        Ok(DriverSearchOutcome {
            best: Some(best),
            alternatives: ranked,
            failure: None,
        })
    }

    /// Ids of the given drivers holding an active assignment to any of
    /// the preferred zones.
    async fn zone_members(
        &self,
        pool: &[RankedDriver],
        preferred_zones: &[ZoneId],
        cancel: &CancellationToken,
    ) -> Result<HashSet<DriverId>, DispatchError> {
        let driver_ids: Vec<DriverId> = pool.iter().map(|r| r.profile.driver_id).collect();
        let assignments = port::call(
            "list_driver_zones",
            self.config.port_call_timeout,
            cancel,
            self.store.list_driver_zones(ZoneAssignmentFilter {
                driver_ids: Some(driver_ids),
                active_only: true,
                ..Default::default()
            }),
        )
        .await?;
        let wanted: HashSet<ZoneId> = preferred_zones.iter().copied().collect();
        Ok(assignments
            .into_iter()
            .filter(|a| wanted.contains(&a.zone_id))
            .map(|a| a.driver_id)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Ranking helpers
// ---------------------------------------------------------------------------

/// Score one driver against the customer location and preferences.
fn rank(
    profile: DriverProfile,
    customer_lat: f64,
    customer_lng: f64,
    preferences: &SearchPreferences,
) -> RankedDriver {
    let distance_km = profile
        .position()
        .map(|(lat, lng)| haversine_km(lat, lng, customer_lat, customer_lng));

    let mut score = SEARCH_BASE_SCORE;
    if preferences.use_rating {
        score += rating_score(profile.rating);
    }
    if preferences.use_load {
        score += headroom_score(profile.active_orders, profile.max_capacity);
    }
    if preferences.use_proximity {
        if let Some(d) = distance_km {
            score += proximity_score(d);
        }
    }

    RankedDriver {
        profile,
        distance_km,
        score,
    }
}

/// Best `n` drivers by score descending, driver id breaking ties.
fn top(mut pool: Vec<RankedDriver>, n: usize) -> Vec<RankedDriver> {
    pool.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.profile.driver_id.cmp(&b.profile.driver_id))
    });
    pool.truncate(n);
    pool
}
