//! Presence and unread accounting.
//!
//! Both signals are derived: "online" comes from the relay's presence
//! set, "unread" from the store's persisted read-state. Neither is the
//! system of record for delivery, and neither is fed by the live bus —
//! unread counts stay correct for users who were never connected.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use murmur_core::error::NotifyError;
use murmur_relay::{RelayClient, notification_channel};
use murmur_store::NotificationReadStore;

/// Default bound on a relay presence query.
pub const DEFAULT_PRESENCE_TIMEOUT: Duration = Duration::from_secs(2);

/// Derives online/unread signals for the RPC layer.
pub struct AccountingService {
    relay: Arc<dyn RelayClient>,
    store: Arc<dyn NotificationReadStore>,
    presence_timeout: Duration,
}

impl AccountingService {
    /// Creates an accounting service with the default presence timeout.
    #[must_use]
    pub fn new(relay: Arc<dyn RelayClient>, store: Arc<dyn NotificationReadStore>) -> Self {
        Self::with_presence_timeout(relay, store, DEFAULT_PRESENCE_TIMEOUT)
    }

    /// Creates an accounting service with an explicit presence timeout.
    #[must_use]
    pub fn with_presence_timeout(
        relay: Arc<dyn RelayClient>,
        store: Arc<dyn NotificationReadStore>,
        presence_timeout: Duration,
    ) -> Self {
        Self {
            relay,
            store,
            presence_timeout,
        }
    }

    /// Whether `user_id` is attached to their notification channel.
    ///
    /// Absent presence data, a relay error, and a timed-out query all mean
    /// offline — never an error to the caller.
    pub async fn is_online(&self, user_id: Uuid) -> bool {
        let channel = notification_channel(user_id);
        match tokio::time::timeout(self.presence_timeout, self.relay.channel_members(&channel))
            .await
        {
            Ok(Ok(members)) => members.contains(&user_id),
            Ok(Err(err)) => {
                tracing::debug!(%user_id, error = %err, "presence query failed, treating as offline");
                false
            }
            Err(_) => {
                tracing::debug!(%user_id, "presence query timed out, treating as offline");
                false
            }
        }
    }

    /// Number of unread notifications for `user_id`, from persisted
    /// read-state only.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Infrastructure`] if the store query fails.
    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, NotifyError> {
        self.store.unread_count(user_id).await
    }

    /// Marks all of `user_id`'s notifications read. Returns rows affected.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Infrastructure`] if the store update fails.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, NotifyError> {
        self.store.mark_all_read(user_id).await
    }
}

impl std::fmt::Debug for AccountingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountingService")
            .field("presence_timeout", &self.presence_timeout)
            .finish_non_exhaustive()
    }
}
