//! Murmur Bus — in-process broadcast of notification events.
//!
//! The bus fans each committed [`NotificationEvent`] out to every live
//! subscription registered for the event's recipient. Delivery is
//! deliberately lossy: each subscription owns a bounded FIFO queue, and a
//! full queue drops its oldest entry rather than ever stalling the write
//! path that emits events. Consumers pull events through
//! [`NotificationStream`], a cancellable adapter that suspends until the
//! next event, cancellation, or bus shutdown.
//!
//! The bus is per-process; fan-out to other instances is the external
//! relay's job.
//!
//! [`NotificationEvent`]: murmur_core::event::NotificationEvent

pub mod bus;
pub mod stream;

pub use bus::{BusConfig, BusMetrics, EventBus, Subscription};
pub use stream::{NotificationStream, StreamEnd};

/// Default per-subscription delivery queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default bus-wide ceiling on concurrently registered subscriptions.
pub const DEFAULT_MAX_SUBSCRIPTIONS: usize = 8192;
