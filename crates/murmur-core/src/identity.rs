//! Caller identity verification.
//!
//! Every delivery-subsystem entry point requires a verified identity;
//! requests with none are rejected with
//! [`NotifyError::Unauthenticated`](crate::error::NotifyError::Unauthenticated)
//! before the bus, relay, or store is touched.

use async_trait::async_trait;
use uuid::Uuid;

/// Verifies a bearer credential and resolves it to a user identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Returns the verified user for `bearer_token`, or `None` if the
    /// credential is missing, malformed, or forged.
    async fn verify(&self, bearer_token: &str) -> Option<Uuid>;
}
