//! Shared test mocks and utilities for the Murmur notification subsystem.

mod clock;
mod identity;
mod relay;
mod store;

pub use clock::FixedClock;
pub use identity::StaticIdentityVerifier;
pub use relay::{FailingRelayClient, FlakyRelayClient, RecordingRelayClient};
pub use store::InMemoryReadStore;
