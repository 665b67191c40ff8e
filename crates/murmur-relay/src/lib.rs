//! Murmur Relay — the boundary to the external pub/sub transport.
//!
//! The relay delivers events to clients that are not served by this
//! process. This crate owns the three pieces of that boundary: the
//! [`RelayClient`] trait the rest of the system talks through, the
//! [`ChannelAuthorizer`] that mints per-user capability tokens, and the
//! [`RelayPublisher`] that pushes each committed event to the recipient's
//! channel with bounded retries.

pub mod client;
pub mod publisher;
pub mod token;

pub use client::{NoopRelayClient, RelayClient};
pub use publisher::{PublisherConfig, PublisherMetrics, RelayPublisher};
pub use token::{CapabilityToken, ChannelAuthorizer, notification_channel};

/// Default lifetime of an issued capability token, in seconds. Kept short
/// so a leaked token stops working within minutes.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 300;
