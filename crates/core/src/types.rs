//! Shared id and timestamp aliases.

/// Drivers are keyed by the UUID the managed backend assigns them.
pub type DriverId = uuid::Uuid;

/// Dispatch zones are keyed by UUID.
pub type ZoneId = uuid::Uuid;

/// Orders are keyed by UUID.
pub type OrderId = uuid::Uuid;

/// Catalog products are keyed by UUID.
pub type ProductId = uuid::Uuid;

/// Notifications are keyed by UUID.
pub type NotificationId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
