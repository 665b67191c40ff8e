//! Murmur API — HTTP surface of the notification delivery subsystem.
//!
//! Exposes the live SSE event stream, capability token issuance, and the
//! unread/presence accounting endpoints. Every notification route
//! requires a verified caller identity; the stream and the token are
//! always scoped to that identity.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;
