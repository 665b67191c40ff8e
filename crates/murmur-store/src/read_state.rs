//! Read-state store abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use murmur_core::error::NotifyError;

/// Persisted read/unread accounting for one user's notifications.
#[async_trait]
pub trait NotificationReadStore: Send + Sync {
    /// Number of unread notifications for `user_id`.
    async fn unread_count(&self, user_id: Uuid) -> Result<i64, NotifyError>;

    /// Marks every unread notification for `user_id` as read. Returns the
    /// number of rows affected.
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, NotifyError>;
}
