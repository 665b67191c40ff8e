//! Relay client abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use murmur_core::error::NotifyError;

/// Boundary to the external pub/sub relay.
///
/// Implementations wrap whatever vendor transport is deployed; the
/// subsystem only depends on this trait. Channel authorization itself is
/// verified relay-side against the tokens minted by
/// [`ChannelAuthorizer`](crate::token::ChannelAuthorizer).
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Publishes `payload` to `channel`. Delivered to the channel buffer
    /// whether or not any client is currently attached, subject to the
    /// relay's own retention window.
    async fn publish(&self, channel: &str, payload: &serde_json::Value)
    -> Result<(), NotifyError>;

    /// Returns the user IDs currently present on `channel`. An empty set
    /// means nobody is attached; absence of presence data is not an error.
    async fn channel_members(&self, channel: &str) -> Result<Vec<Uuid>, NotifyError>;
}

/// Stand-in relay used until a vendor client is wired in: publishes are
/// logged and discarded, presence is always empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRelayClient;

#[async_trait]
impl RelayClient for NoopRelayClient {
    async fn publish(
        &self,
        channel: &str,
        payload: &serde_json::Value,
    ) -> Result<(), NotifyError> {
        tracing::info!(%channel, kind = %payload["kind"], "relay publish (noop)");
        Ok(())
    }

    async fn channel_members(&self, _channel: &str) -> Result<Vec<Uuid>, NotifyError> {
        Ok(Vec::new())
    }
}
