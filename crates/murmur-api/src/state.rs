//! Shared application state.

use std::sync::Arc;

use murmur_core::identity::IdentityVerifier;
use murmur_notify::{AccountingService, Notifier};
use murmur_relay::ChannelAuthorizer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Post-commit dispatch and stream registration.
    pub notifier: Arc<Notifier>,
    /// Capability token issuance for relay channels.
    pub authorizer: Arc<ChannelAuthorizer>,
    /// Presence and unread accounting.
    pub accounting: Arc<AccountingService>,
    /// Bearer credential verification.
    pub identity: Arc<dyn IdentityVerifier>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        notifier: Arc<Notifier>,
        authorizer: Arc<ChannelAuthorizer>,
        accounting: Arc<AccountingService>,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            notifier,
            authorizer,
            accounting,
            identity,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
