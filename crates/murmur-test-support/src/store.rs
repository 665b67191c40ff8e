//! Test store — in-memory `NotificationReadStore` implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use murmur_core::error::NotifyError;
use murmur_store::NotificationReadStore;
use uuid::Uuid;

/// An in-memory read-state store holding a per-user unread counter.
#[derive(Debug, Default)]
pub struct InMemoryReadStore {
    unread: Mutex<HashMap<Uuid, i64>>,
}

impl InMemoryReadStore {
    /// Creates an empty store (every user has zero unread).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `user_id`'s unread counter.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_unread(&self, user_id: Uuid, count: i64) {
        self.unread.lock().unwrap().insert(user_id, count);
    }
}

#[async_trait]
impl NotificationReadStore for InMemoryReadStore {
    async fn unread_count(&self, user_id: Uuid) -> Result<i64, NotifyError> {
        Ok(self
            .unread
            .lock()
            .unwrap()
            .get(&user_id)
            .copied()
            .unwrap_or(0))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, NotifyError> {
        let mut unread = self.unread.lock().unwrap();
        let cleared = unread.insert(user_id, 0).unwrap_or(0);
        Ok(u64::try_from(cleared.max(0)).unwrap_or(0))
    }
}
