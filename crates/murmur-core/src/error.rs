//! Delivery-subsystem error taxonomy.
//!
//! Only `Unauthenticated` and `TooManySubscriptions` are ever surfaced to
//! an immediate caller as failures; everything else resolves to graceful
//! stream termination or drop-and-log inside the subsystem.

use thiserror::Error;

/// Top-level error type for the notification delivery subsystem.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// No verified caller identity was attached to the request.
    #[error("no authenticated identity")]
    Unauthenticated,

    /// The event bus has been shut down; emits are rejected.
    #[error("event bus closed")]
    BusClosed,

    /// The bus-wide subscription ceiling was reached.
    #[error("subscription limit of {limit} reached")]
    TooManySubscriptions {
        /// The configured ceiling.
        limit: usize,
    },

    /// A relay publish attempt failed; retried, then dropped and logged.
    #[error("relay publish failed: {0}")]
    RelayPublishFailed(String),

    /// A capability token is past its expiry.
    #[error("capability token expired")]
    TokenExpired,

    /// A capability token's signature does not verify.
    #[error("capability token signature invalid")]
    TokenInvalid,

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
