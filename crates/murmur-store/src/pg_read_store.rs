//! `PostgreSQL` implementation of the [`NotificationReadStore`] trait.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use murmur_core::error::NotifyError;

use crate::read_state::NotificationReadStore;

/// PostgreSQL-backed read-state store over the `notifications` table.
#[derive(Debug, Clone)]
pub struct PgNotificationReadStore {
    pool: PgPool,
}

impl PgNotificationReadStore {
    /// Creates a new `PgNotificationReadStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationReadStore for PgNotificationReadStore {
    async fn unread_count(&self, user_id: Uuid) -> Result<i64, NotifyError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| NotifyError::Infrastructure(format!("unread count query failed: {e}")))?;
        Ok(count)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, NotifyError> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = NOW() \
             WHERE recipient_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| NotifyError::Infrastructure(format!("mark-all-read failed: {e}")))?;
        tracing::debug!(%user_id, rows = result.rows_affected(), "notifications marked read");
        Ok(result.rows_affected())
    }
}
