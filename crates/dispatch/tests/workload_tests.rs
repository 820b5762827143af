//! Integration tests for workload analytics and availability prediction.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use common::MemoryStore;
use fleetline_core::order::OrderStatus;
use fleetline_core::workload::PredictionConfidence;
use fleetline_db::store::{Capability, CapabilitySet};
use fleetline_dispatch::{DispatchConfig, DispatchError, WorkloadAnalyzer};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn analyzer(store: Arc<MemoryStore>) -> WorkloadAnalyzer {
    WorkloadAnalyzer::new(store, DispatchConfig::default())
}

// ---------------------------------------------------------------------------
// Test: utilization is computed from the live order data
// ---------------------------------------------------------------------------

#[tokio::test]
async fn distribution_counts_outstanding_orders_per_driver() {
    let store = Arc::new(MemoryStore::new());
    // The profile's own counter is stale on purpose; the analytics count
    // the outstanding orders instead.
    let busy = store.seed_profile("Busy", None, 0, 4, None);
    let idle = store.seed_profile("Idle", None, 0, 4, None);
    for _ in 0..3 {
        store.seed_assigned_order(busy, OrderStatus::Preparing);
    }
    store.seed_assigned_order(busy, OrderStatus::Delivered);

    let distribution = analyzer(Arc::clone(&store))
        .workload_distribution(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(distribution.len(), 2);
    // Most loaded first.
    assert_eq!(distribution[0].driver_id, busy);
    assert_eq!(distribution[0].active_orders, 3);
    assert!((distribution[0].utilization_pct - 75.0).abs() < f64::EPSILON);
    assert!(!distribution[0].is_overloaded);
    assert_eq!(distribution[1].driver_id, idle);
    assert_eq!(distribution[1].active_orders, 0);
}

// ---------------------------------------------------------------------------
// Test: drivers above 80% are flagged overloaded
// ---------------------------------------------------------------------------

#[tokio::test]
async fn over_eighty_pct_is_flagged() {
    let store = Arc::new(MemoryStore::new());
    let driver = store.seed_profile("Maxed", None, 0, 4, None);
    for _ in 0..4 {
        store.seed_assigned_order(driver, OrderStatus::Confirmed);
    }

    let distribution = analyzer(Arc::clone(&store))
        .workload_distribution(&CancellationToken::new())
        .await
        .unwrap();

    assert!((distribution[0].utilization_pct - 100.0).abs() < f64::EPSILON);
    assert!(distribution[0].is_overloaded);
}

// ---------------------------------------------------------------------------
// Test: rebalancing pairs overloaded drivers with the least-utilized
// ---------------------------------------------------------------------------

#[tokio::test]
async fn balance_pairs_overloaded_with_least_utilized() {
    let store = Arc::new(MemoryStore::new());
    let overloaded = store.seed_profile("Overloaded", None, 0, 4, None);
    for _ in 0..4 {
        store.seed_assigned_order(overloaded, OrderStatus::Confirmed);
    }
    let quiet = store.seed_profile("Quiet", None, 0, 4, None);
    let quieter = store.seed_profile("Quieter", None, 0, 10, None);
    store.seed_assigned_order(quiet, OrderStatus::Confirmed);

    let recommendations = analyzer(Arc::clone(&store))
        .balance_workload(None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(recommendations.len(), 1);
    let rec = &recommendations[0];
    assert_eq!(rec.from_driver, overloaded);
    // Quieter (0%) beats Quiet (25%).
    assert_eq!(rec.to_driver, quieter);
    assert!(rec.message.contains("Overloaded"));
    assert!(rec.message.contains("Quieter"));
}

// ---------------------------------------------------------------------------
// Test: successive pairings spread across receivers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pairings_spread_over_receivers() {
    let store = Arc::new(MemoryStore::new());
    // Two overloaded drivers with tiny capacity.
    let over_a = store.seed_profile("OverA", None, 0, 1, None);
    let over_b = store.seed_profile("OverB", None, 0, 1, None);
    store.seed_assigned_order(over_a, OrderStatus::Confirmed);
    store.seed_assigned_order(over_b, OrderStatus::Confirmed);
    // One tiny receiver that fills up after a single hypothetical move,
    // and a large one that stays open.
    let small = store.seed_profile("Small", None, 0, 2, None);
    let large = store.seed_profile("Large", None, 0, 10, None);

    let recommendations = analyzer(Arc::clone(&store))
        .balance_workload(None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(recommendations.len(), 2);
    let receivers: Vec<_> = recommendations.iter().map(|r| r.to_driver).collect();
    // The first pairing counts one hypothetical order against its
    // receiver, so the second pairing lands on the other one.
    assert_ne!(receivers[0], receivers[1]);
    assert!(receivers.contains(&small) && receivers.contains(&large));
}

// ---------------------------------------------------------------------------
// Test: nothing to recommend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_overload_means_no_recommendations() {
    let store = Arc::new(MemoryStore::new());
    let driver = store.seed_profile("Calm", None, 0, 5, None);
    store.seed_assigned_order(driver, OrderStatus::Confirmed);

    let recommendations = analyzer(Arc::clone(&store))
        .balance_workload(None, &CancellationToken::new())
        .await
        .unwrap();

    assert!(recommendations.is_empty());
}

#[tokio::test]
async fn no_receivers_means_no_recommendations() {
    let store = Arc::new(MemoryStore::new());
    let over = store.seed_profile("Over", None, 0, 2, None);
    let half = store.seed_profile("Half", None, 0, 2, None);
    for _ in 0..3 {
        store.seed_assigned_order(over, OrderStatus::Confirmed);
    }
    store.seed_assigned_order(half, OrderStatus::Confirmed);

    let recommendations = analyzer(Arc::clone(&store))
        .balance_workload(None, &CancellationToken::new())
        .await
        .unwrap();

    // 50% utilization is not under the receiver cut-off.
    assert!(recommendations.is_empty());
}

// ---------------------------------------------------------------------------
// Test: prediction for an idle driver
// ---------------------------------------------------------------------------

#[tokio::test]
async fn idle_driver_is_available_now_with_high_confidence() {
    let store = Arc::new(MemoryStore::new());
    let driver = store.seed_profile("Idle", None, 0, 5, None);

    let prediction = analyzer(Arc::clone(&store))
        .predict_availability(driver, 1.0, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(prediction.active_orders, 0);
    assert!(prediction.available_within_horizon);
    assert_eq!(prediction.confidence, PredictionConfidence::High);
    assert!((prediction.estimated_busy_minutes - 0.0).abs() < f64::EPSILON);
    assert!(prediction.reason.contains("free now"));
}

// ---------------------------------------------------------------------------
// Test: prediction horizon comparison with the default average
// ---------------------------------------------------------------------------

#[tokio::test]
async fn busy_driver_misses_a_short_horizon_and_makes_a_long_one() {
    let store = Arc::new(MemoryStore::new());
    let driver = store.seed_profile("Busy", None, 0, 5, None);
    for _ in 0..3 {
        store.seed_assigned_order(driver, OrderStatus::OutForDelivery);
    }

    let analyzer = analyzer(Arc::clone(&store));
    let cancel = CancellationToken::new();

    // 3 orders * 30 min = 90 busy minutes.
    let short = analyzer
        .predict_availability(driver, 1.0, &cancel)
        .await
        .unwrap();
    assert!((short.estimated_busy_minutes - 90.0).abs() < f64::EPSILON);
    assert!(!short.available_within_horizon);
    assert_eq!(short.confidence, PredictionConfidence::Low);

    let long = analyzer
        .predict_availability(driver, 2.0, &cancel)
        .await
        .unwrap();
    assert!(long.available_within_horizon);
}

// ---------------------------------------------------------------------------
// Test: a calibrated per-driver average overrides the default
// ---------------------------------------------------------------------------

#[tokio::test]
async fn calibrated_average_delivery_time_is_used() {
    let store = Arc::new(MemoryStore::new());
    let driver = store.seed_profile("Calibrated", None, 0, 5, None);
    store
        .state()
        .profiles
        .iter_mut()
        .find(|p| p.driver_id == driver)
        .unwrap()
        .avg_delivery_minutes = Some(10.0);
    for _ in 0..2 {
        store.seed_assigned_order(driver, OrderStatus::Ready);
    }

    let prediction = analyzer(Arc::clone(&store))
        .predict_availability(driver, 1.0, &CancellationToken::new())
        .await
        .unwrap();

    assert!((prediction.estimated_busy_minutes - 20.0).abs() < f64::EPSILON);
    assert!(prediction.available_within_horizon);
    assert_eq!(prediction.confidence, PredictionConfidence::Medium);
}

// ---------------------------------------------------------------------------
// Test: unknown driver and invalid horizon
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_driver_is_not_found() {
    let store = Arc::new(MemoryStore::new());

    let result = analyzer(store)
        .predict_availability(Uuid::new_v4(), 1.0, &CancellationToken::new())
        .await;

    assert_matches!(result, Err(DispatchError::NotFound { entity: "driver", .. }));
}

#[tokio::test]
async fn non_positive_horizon_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let driver = store.seed_profile("Any", None, 0, 5, None);

    let result = analyzer(store)
        .predict_availability(driver, 0.0, &CancellationToken::new())
        .await;

    assert_matches!(result, Err(DispatchError::Validation(_)));
}

// ---------------------------------------------------------------------------
// Test: analytics need the orders capability
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_orders_capability_is_a_loud_error() {
    let store = Arc::new(MemoryStore::with_capabilities(
        CapabilitySet::full().without(Capability::Orders),
    ));
    store.seed_profile("Any", None, 0, 5, None);

    let result = analyzer(store)
        .workload_distribution(&CancellationToken::new())
        .await;

    assert_matches!(
        result,
        Err(DispatchError::Unsupported {
            operation: "list_orders"
        })
    );
}
