//! Best-effort relay publishing with bounded retries.
//!
//! Invoked once per committed event, after the write transaction, whether
//! or not any local subscriber is attached. A hung or failing relay never
//! blocks the write path: each attempt carries a timeout, retries back
//! off exponentially, and an event that exhausts its attempts is logged
//! and dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use murmur_core::error::NotifyError;
use murmur_core::event::NotificationEvent;

use crate::client::RelayClient;
use crate::token::notification_channel;

/// Retry and timeout policy for relay publishes.
#[derive(Debug, Clone, Copy)]
pub struct PublisherConfig {
    /// Attempts per event before dropping it.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per attempt.
    pub initial_backoff: Duration,
    /// Upper bound on a single publish attempt.
    pub publish_timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            publish_timeout: Duration::from_secs(5),
        }
    }
}

/// Counter snapshot for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublisherMetrics {
    /// Events successfully handed to the relay.
    pub events_published: u64,
    /// Events dropped after exhausting retries.
    pub events_dropped: u64,
}

/// Publishes serialized notification events to recipients' relay channels.
pub struct RelayPublisher {
    client: Arc<dyn RelayClient>,
    config: PublisherConfig,
    events_published: AtomicU64,
    events_dropped: AtomicU64,
}

impl RelayPublisher {
    /// Creates a publisher with the default retry policy.
    #[must_use]
    pub fn new(client: Arc<dyn RelayClient>) -> Self {
        Self::with_config(client, PublisherConfig::default())
    }

    /// Creates a publisher with an explicit retry policy.
    #[must_use]
    pub fn with_config(client: Arc<dyn RelayClient>, config: PublisherConfig) -> Self {
        Self {
            client,
            config,
            events_published: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
        }
    }

    /// Publishes `event` to its recipient's channel.
    ///
    /// Best-effort: callers on the write path spawn this and ignore the
    /// result. The returned error exists for observability and tests; it
    /// must never be allowed to fail or roll back the originating write.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::RelayPublishFailed`] after `max_attempts`
    /// failed or timed-out attempts; the event has been dropped and logged.
    pub async fn publish_event(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let channel = notification_channel(event.recipient_id);
        let payload = event.to_wire();

        let mut backoff = self.config.initial_backoff;
        let mut last_error = String::new();
        for attempt in 1..=self.config.max_attempts {
            match tokio::time::timeout(
                self.config.publish_timeout,
                self.client.publish(&channel, &payload),
            )
            .await
            {
                Ok(Ok(())) => {
                    self.events_published.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(%channel, event_type = event.event_type(), "event published to relay");
                    return Ok(());
                }
                Ok(Err(err)) => {
                    last_error = err.to_string();
                    tracing::warn!(%channel, attempt, error = %last_error, "relay publish attempt failed");
                }
                Err(_) => {
                    last_error = format!(
                        "publish timed out after {:?}",
                        self.config.publish_timeout
                    );
                    tracing::warn!(%channel, attempt, "relay publish attempt timed out");
                }
            }
            if attempt < self.config.max_attempts {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }

        self.events_dropped.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            %channel,
            event_type = event.event_type(),
            attempts = self.config.max_attempts,
            "event dropped after exhausting relay retries"
        );
        Err(NotifyError::RelayPublishFailed(last_error))
    }

    /// Snapshot of the publish counters.
    #[must_use]
    pub fn metrics(&self) -> PublisherMetrics {
        PublisherMetrics {
            events_published: self.events_published.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for RelayPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayPublisher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
