//! Notification entity model and create DTO.

use fleetline_core::types::{DriverId, NotificationId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: DriverId,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub action_url: Option<String>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for creating a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct NewNotification {
    pub recipient_id: DriverId,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub action_url: Option<String>,
}
