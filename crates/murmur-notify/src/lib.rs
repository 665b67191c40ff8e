//! Murmur Notify — the service layer over bus, relay, and store.
//!
//! [`Notifier`] is what the write path calls after a like/comment commits:
//! it fans the event out locally and hands it to the relay, and it never
//! fails the caller — notification delivery is best-effort after the fact.
//! [`AccountingService`] derives the "online" and "unread count" signals;
//! neither is authoritative for delivery correctness.

pub mod accounting;
pub mod notifier;

pub use accounting::AccountingService;
pub use notifier::Notifier;
