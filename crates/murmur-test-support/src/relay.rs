//! Test relays — mock `RelayClient` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use murmur_core::error::NotifyError;
use murmur_relay::RelayClient;
use uuid::Uuid;

/// A relay client that records every publish and serves a configurable
/// presence set. All publishes succeed.
#[derive(Debug, Default)]
pub struct RecordingRelayClient {
    published: Mutex<Vec<(String, serde_json::Value)>>,
    members: Mutex<Vec<(String, Vec<Uuid>)>>,
}

impl RecordingRelayClient {
    /// Creates a recording relay with nobody present on any channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `user_id` as present on `channel` for subsequent
    /// `channel_members` calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_present(&self, channel: &str, user_id: Uuid) {
        let mut members = self.members.lock().unwrap();
        if let Some((_, users)) = members.iter_mut().find(|(c, _)| c == channel) {
            users.push(user_id);
        } else {
            members.push((channel.to_string(), vec![user_id]));
        }
    }

    /// Returns a snapshot of every `(channel, payload)` published so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn published(&self) -> Vec<(String, serde_json::Value)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayClient for RecordingRelayClient {
    async fn publish(
        &self,
        channel: &str,
        payload: &serde_json::Value,
    ) -> Result<(), NotifyError> {
        self.published
            .lock()
            .unwrap()
            .push((channel.to_string(), payload.clone()));
        Ok(())
    }

    async fn channel_members(&self, channel: &str) -> Result<Vec<Uuid>, NotifyError> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .find(|(c, _)| c == channel)
            .map(|(_, users)| users.clone())
            .unwrap_or_default())
    }
}

/// A relay client whose every operation fails. Useful for outage and
/// drop-after-retries scenarios.
#[derive(Debug, Default)]
pub struct FailingRelayClient;

#[async_trait]
impl RelayClient for FailingRelayClient {
    async fn publish(
        &self,
        _channel: &str,
        _payload: &serde_json::Value,
    ) -> Result<(), NotifyError> {
        Err(NotifyError::RelayPublishFailed("relay unavailable".into()))
    }

    async fn channel_members(&self, _channel: &str) -> Result<Vec<Uuid>, NotifyError> {
        Err(NotifyError::Infrastructure("relay unavailable".into()))
    }
}

/// A relay client that fails a configured number of publishes before
/// succeeding, for retry-path tests.
#[derive(Debug)]
pub struct FlakyRelayClient {
    inner: RecordingRelayClient,
    failures_remaining: Mutex<u32>,
}

impl FlakyRelayClient {
    /// Creates a relay that fails the first `failures` publishes.
    #[must_use]
    pub fn new(failures: u32) -> Self {
        Self {
            inner: RecordingRelayClient::new(),
            failures_remaining: Mutex::new(failures),
        }
    }

    /// Returns a snapshot of every successful publish.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn published(&self) -> Vec<(String, serde_json::Value)> {
        self.inner.published()
    }
}

#[async_trait]
impl RelayClient for FlakyRelayClient {
    async fn publish(
        &self,
        channel: &str,
        payload: &serde_json::Value,
    ) -> Result<(), NotifyError> {
        {
            let mut remaining = self.failures_remaining.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(NotifyError::RelayPublishFailed("transient failure".into()));
            }
        }
        self.inner.publish(channel, payload).await
    }

    async fn channel_members(&self, channel: &str) -> Result<Vec<Uuid>, NotifyError> {
        self.inner.channel_members(channel).await
    }
}
