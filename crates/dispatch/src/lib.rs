//! Dispatch services: matching orders to drivers and reporting zone
//! coverage.
//!
//! Every service takes the persistence port
//! ([`fleetline_db::store::DispatchStore`]) by explicit injection and a
//! caller-supplied [`CancellationToken`]; each port call runs under the
//! per-call timeout from [`DispatchConfig`].
//!
//! - [`evaluator`] — ranks online drivers against an order's item list.
//! - [`coverage`] — per-zone coverage reports, via the store's aggregate
//!   query or a fallback reconstruction.
//! - [`assignment`] — commits an assignment (order, driver status,
//!   movement log) under a per-driver lease, with rollback on partial
//!   failure and a best-effort driver notification.
//! - [`search`] — geodistance-aware best-driver search.
//! - [`workload`] — read-only utilization analytics and availability
//!   prediction.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken
//! [`DispatchConfig`]: config::DispatchConfig

pub mod assignment;
pub mod config;
pub mod coverage;
pub mod error;
pub mod evaluator;
pub mod leases;
mod port;
pub mod search;
pub mod workload;

pub use assignment::{
    AssignmentOptions, AssignmentOrchestrator, AssignmentOutcome, DispatchAssignment,
};
pub use config::DispatchConfig;
pub use coverage::{CoverageReport, CoverageService};
pub use error::DispatchError;
pub use evaluator::{CandidateEvaluator, DriverCandidate};
pub use search::{BestDriverSearch, DriverSearchOutcome, SearchPreferences};
pub use workload::WorkloadAnalyzer;
