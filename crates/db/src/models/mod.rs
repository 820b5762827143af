//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the writes the dispatch subsystem performs
//!
//! Status columns are stored as text; rows keep them as `String` and
//! expose accessors that parse into the `fleetline-core` enums, so a
//! malformed row surfaces at the domain boundary instead of failing the
//! whole fetch.

pub mod coverage;
pub mod driver;
pub mod inventory;
pub mod movement;
pub mod notification;
pub mod order;
pub mod zone;

pub use coverage::ZoneCoverageSnapshot;
pub use driver::{DriverProfile, DriverStatusPatch, DriverStatusRecord};
pub use inventory::DriverInventoryRecord;
pub use movement::{MovementLogEntry, NewMovement};
pub use notification::{NewNotification, Notification};
pub use order::{Order, OrderAssignmentPatch};
pub use zone::{DriverZoneAssignment, Zone};
