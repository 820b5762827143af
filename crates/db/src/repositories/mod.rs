//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod coverage_repo;
pub mod driver_profile_repo;
pub mod driver_status_repo;
pub mod driver_zone_repo;
pub mod inventory_repo;
pub mod movement_log_repo;
pub mod notification_repo;
pub mod order_repo;
pub mod zone_repo;

pub use coverage_repo::CoverageRepo;
pub use driver_profile_repo::DriverProfileRepo;
pub use driver_status_repo::DriverStatusRepo;
pub use driver_zone_repo::DriverZoneRepo;
pub use inventory_repo::InventoryRepo;
pub use movement_log_repo::MovementLogRepo;
pub use notification_repo::NotificationRepo;
pub use order_repo::OrderRepo;
pub use zone_repo::ZoneRepo;
