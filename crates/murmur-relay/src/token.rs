//! Capability tokens for relay channel authorization.
//!
//! A token authorizes read-only subscription to exactly one channel, and
//! the channel name is always derived from the requesting user's own
//! identity. Tokens are stateless: nothing is cached server-side, so
//! revocation equals "stop issuing".

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use murmur_core::clock::Clock;
use murmur_core::error::NotifyError;

use crate::DEFAULT_TOKEN_TTL_SECS;

type HmacSha256 = Hmac<Sha256>;

/// The relay channel carrying one user's notifications.
#[must_use]
pub fn notification_channel(recipient_id: Uuid) -> String {
    format!("notifications:{recipient_id}")
}

/// Short-lived credential authorizing subscription to one relay channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityToken {
    /// The single channel this token grants read access to.
    pub channel: String,
    /// Expiry; the relay rejects the token afterwards even if replayed.
    pub expires_at: DateTime<Utc>,
    /// Hex-encoded HMAC-SHA256 over `<channel>:<expires_at unix>`.
    pub signature: String,
}

/// Issues capability tokens for users' own notification channels.
///
/// Identity verification happens at the RPC entry point before this
/// service is reached; by construction there is no way to request a token
/// for another user's channel.
pub struct ChannelAuthorizer {
    secret: Vec<u8>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ChannelAuthorizer {
    /// Creates an authorizer with the default token lifetime.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(secret, Duration::seconds(DEFAULT_TOKEN_TTL_SECS), clock)
    }

    /// Creates an authorizer with an explicit token lifetime.
    #[must_use]
    pub fn with_ttl(secret: impl Into<Vec<u8>>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret: secret.into(),
            ttl,
            clock,
        }
    }

    /// Mints a fresh token for `requesting_user_id`'s own notification
    /// channel. Every call produces a new token; none are cached.
    #[must_use]
    pub fn issue_token(&self, requesting_user_id: Uuid) -> CapabilityToken {
        let channel = notification_channel(requesting_user_id);
        let expires_at = self.clock.now() + self.ttl;
        let signature = self.sign(&channel, expires_at.timestamp());
        tracing::debug!(user_id = %requesting_user_id, %channel, "capability token issued");
        CapabilityToken {
            channel,
            expires_at,
            signature,
        }
    }

    /// Checks a token the way the relay does: signature first, then expiry.
    ///
    /// In production this check runs relay-side; it lives here so token
    /// scoping and expiry invariants are testable in-repo.
    ///
    /// # Errors
    ///
    /// [`NotifyError::TokenInvalid`] for a bad signature,
    /// [`NotifyError::TokenExpired`] for a stale token, replayed or not.
    pub fn verify(&self, token: &CapabilityToken) -> Result<(), NotifyError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(signing_input(&token.channel, token.expires_at.timestamp()).as_bytes());
        let provided = hex::decode(&token.signature).map_err(|_| NotifyError::TokenInvalid)?;
        mac.verify_slice(&provided)
            .map_err(|_| NotifyError::TokenInvalid)?;
        if token.expires_at <= self.clock.now() {
            return Err(NotifyError::TokenExpired);
        }
        Ok(())
    }

    fn sign(&self, channel: &str, expires_at_unix: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(signing_input(channel, expires_at_unix).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

fn signing_input(channel: &str, expires_at_unix: i64) -> String {
    format!("{channel}:{expires_at_unix}")
}

impl std::fmt::Debug for ChannelAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelAuthorizer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
