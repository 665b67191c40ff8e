//! Caller authentication.
//!
//! Identity is checked before any handler touches the bus, relay, or
//! store: the [`AuthenticatedUser`] extractor rejects requests without a
//! verifiable bearer credential.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use hmac::{Hmac, Mac};
use murmur_core::error::NotifyError;
use murmur_core::identity::IdentityVerifier;
use sha2::Sha256;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// The verified identity of the calling user.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Uuid);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError(NotifyError::Unauthenticated))?;

        match state.identity.verify(bearer).await {
            Some(user_id) => Ok(Self(user_id)),
            None => Err(ApiError(NotifyError::Unauthenticated)),
        }
    }
}

/// Session verifier for tokens of the form `<user_uuid>.<hex signature>`,
/// where the signature is HMAC-SHA256 over the UUID text.
pub struct HmacSessionVerifier {
    secret: Vec<u8>,
}

impl HmacSessionVerifier {
    /// Creates a verifier with the given session secret.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Mints a session token for `user_id`. Used by the session layer at
    /// login and by tests.
    #[must_use]
    pub fn mint(&self, user_id: Uuid) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(user_id.to_string().as_bytes());
        format!("{user_id}.{}", hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait::async_trait]
impl IdentityVerifier for HmacSessionVerifier {
    async fn verify(&self, bearer_token: &str) -> Option<Uuid> {
        let (user, signature) = bearer_token.split_once('.')?;
        let user_id = Uuid::parse_str(user).ok()?;
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(user.as_bytes());
        let provided = hex::decode(signature).ok()?;
        mac.verify_slice(&provided).ok()?;
        Some(user_id)
    }
}

impl std::fmt::Debug for HmacSessionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSessionVerifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_minted_token_verifies_to_user() {
        let verifier = HmacSessionVerifier::new("session-secret");
        let user = Uuid::new_v4();
        let token = verifier.mint(user);

        assert_eq!(verifier.verify(&token).await, Some(user));
    }

    #[tokio::test]
    async fn test_forged_token_rejected() {
        let verifier = HmacSessionVerifier::new("session-secret");
        let forger = HmacSessionVerifier::new("other-secret");
        let token = forger.mint(Uuid::new_v4());

        assert_eq!(verifier.verify(&token).await, None);
    }

    #[tokio::test]
    async fn test_malformed_token_rejected() {
        let verifier = HmacSessionVerifier::new("session-secret");
        assert_eq!(verifier.verify("not-a-token").await, None);
        assert_eq!(verifier.verify("").await, None);
    }
}
