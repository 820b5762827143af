//! Repository for the `notifications` table.

use fleetline_core::types::NotificationId;
use sqlx::PgPool;

use crate::models::notification::NewNotification;

/// Provides the create operation the dispatch subsystem needs.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Create a notification, returning the generated id.
    pub async fn create(
        pool: &PgPool,
        input: &NewNotification,
    ) -> Result<NotificationId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notifications (recipient_id, title, message, kind, action_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(input.recipient_id)
        .bind(&input.title)
        .bind(&input.message)
        .bind(&input.kind)
        .bind(input.action_url.as_deref())
        .fetch_one(pool)
        .await
    }
}
