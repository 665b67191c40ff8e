//! Murmur Store — persisted notification read-state.
//!
//! Unread counts are derived from persisted read/unread flags, never from
//! the live bus, so they stay correct for users who were never connected.
//! The store is the single authority for read-state; the delivery
//! subsystem only queries and flips flags through the
//! [`NotificationReadStore`] seam.

pub mod pg_read_store;
pub mod read_state;

pub use pg_read_store::PgNotificationReadStore;
pub use read_state::NotificationReadStore;
