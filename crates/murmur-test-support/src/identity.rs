//! Test identity — static `IdentityVerifier` for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use murmur_core::identity::IdentityVerifier;
use uuid::Uuid;

/// An identity verifier backed by a fixed token-to-user map.
#[derive(Debug, Default)]
pub struct StaticIdentityVerifier {
    tokens: HashMap<String, Uuid>,
}

impl StaticIdentityVerifier {
    /// Creates a verifier that rejects every credential.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` as a valid credential for `user_id`.
    #[must_use]
    pub fn with_token(mut self, token: &str, user_id: Uuid) -> Self {
        self.tokens.insert(token.to_string(), user_id);
        self
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, bearer_token: &str) -> Option<Uuid> {
        self.tokens.get(bearer_token).copied()
    }
}
