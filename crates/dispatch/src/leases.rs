//! In-process per-driver leases.
//!
//! The three-step assignment commit is not atomic on the persistence
//! side, so two concurrent assignments could both pass candidate
//! evaluation and double-book the same driver. The orchestrator holds a
//! lease on the chosen driver for the duration of the commit; a second
//! attempt on the same driver fails fast with a typed conflict instead
//! of silently overwriting.
//!
//! Leases are process-local. Deployments running several dispatching
//! processes against one database need the store-side guard instead.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use fleetline_core::types::DriverId;

/// Registry of drivers currently being committed to an order.
///
/// Cheap to clone; all clones share the same lease table.
#[derive(Debug, Clone, Default)]
pub struct DriverLeaseRegistry {
    held: Arc<Mutex<HashSet<DriverId>>>,
}

impl DriverLeaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to take the lease for a driver.
    ///
    /// Returns `None` if another assignment currently holds it. The
    /// lease is released when the returned guard drops.
    pub fn try_acquire(&self, driver_id: DriverId) -> Option<DriverLease> {
        let mut held = self.held.lock().expect("lease registry poisoned");
        if held.insert(driver_id) {
            Some(DriverLease {
                held: Arc::clone(&self.held),
                driver_id,
            })
        } else {
            None
        }
    }
}

/// Holds one driver's lease; releases it on drop.
#[derive(Debug)]
pub struct DriverLease {
    held: Arc<Mutex<HashSet<DriverId>>>,
    driver_id: DriverId,
}

impl Drop for DriverLease {
    fn drop(&mut self) {
        if let Ok(mut held) = self.held.lock() {
            held.remove(&self.driver_id);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
