//! The event bus: a recipient-keyed registry of bounded delivery queues.
//!
//! All shared mutable state lives behind a single registry mutex; `emit`,
//! `subscribe`, and `unsubscribe` are safe to call from independent tasks.
//! The lock is only ever held for queue bookkeeping, never across an await.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, watch};
use uuid::Uuid;

use murmur_core::error::NotifyError;
use murmur_core::event::NotificationEvent;

use crate::{DEFAULT_MAX_SUBSCRIPTIONS, DEFAULT_QUEUE_CAPACITY};

/// Tuning knobs for the bus.
#[derive(Debug, Clone, Copy)]
pub struct BusConfig {
    /// Per-subscription delivery queue capacity. On overflow the oldest
    /// undelivered event is dropped.
    pub queue_capacity: usize,
    /// Bus-wide ceiling on concurrently registered subscriptions.
    pub max_subscriptions: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_subscriptions: DEFAULT_MAX_SUBSCRIPTIONS,
        }
    }
}

/// Counter snapshot for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusMetrics {
    /// Events accepted by `emit` since the bus was created.
    pub events_emitted: u64,
    /// Events discarded by the drop-oldest overflow policy.
    pub events_dropped: u64,
    /// Currently registered subscriptions.
    pub active_subscriptions: usize,
}

/// State shared between the bus and one subscription's consumer.
pub(crate) struct SubscriptionShared {
    pub(crate) queue: Mutex<VecDeque<NotificationEvent>>,
    pub(crate) wakeup: Notify,
    pub(crate) dropped: AtomicU64,
}

/// A registered listener bound to one recipient and one delivery queue.
///
/// Obtained from [`EventBus::subscribe`]; removed via
/// [`EventBus::unsubscribe`] or by the owning [`NotificationStream`]
/// when it ends.
///
/// [`NotificationStream`]: crate::stream::NotificationStream
pub struct Subscription {
    pub(crate) id: u64,
    pub(crate) recipient_id: Uuid,
    pub(crate) shared: Arc<SubscriptionShared>,
}

impl Subscription {
    /// The recipient this subscription observes events for.
    #[must_use]
    pub fn recipient_id(&self) -> Uuid {
        self.recipient_id
    }

    /// Events discarded from this subscription's queue by the overflow
    /// policy.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Removes and returns the oldest queued event, if any.
    pub(crate) fn pop(&self) -> Option<NotificationEvent> {
        self.shared
            .queue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("recipient_id", &self.recipient_id)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Registry {
    by_recipient: HashMap<Uuid, HashMap<u64, Arc<SubscriptionShared>>>,
    total: usize,
}

/// In-process broadcast bus routing notification events to live
/// subscriptions.
pub struct EventBus {
    config: BusConfig,
    registry: Mutex<Registry>,
    next_subscription_id: AtomicU64,
    closed_tx: watch::Sender<bool>,
    events_emitted: AtomicU64,
    events_dropped: AtomicU64,
}

impl EventBus {
    /// Creates a bus with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Creates a bus with an explicit configuration.
    #[must_use]
    pub fn with_config(config: BusConfig) -> Self {
        let (closed_tx, _) = watch::channel(false);
        Self {
            config,
            registry: Mutex::new(Registry::default()),
            next_subscription_id: AtomicU64::new(0),
            closed_tx,
            events_emitted: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
        }
    }

    /// Fans `event` out to every subscription registered for its recipient.
    ///
    /// Each subscription gets an independent copy enqueued before this call
    /// returns; consumption happens on the consumer's own schedule. A full
    /// queue drops its oldest entry — the producer is never blocked by a
    /// slow consumer. Returns the number of subscriptions reached.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::BusClosed`] once [`EventBus::close`] has been
    /// called.
    pub fn emit(&self, event: NotificationEvent) -> Result<usize, NotifyError> {
        if *self.closed_tx.borrow() {
            return Err(NotifyError::BusClosed);
        }
        self.events_emitted.fetch_add(1, Ordering::Relaxed);

        let registry = self.lock_registry();
        let Some(subscribers) = registry.by_recipient.get(&event.recipient_id) else {
            return Ok(0);
        };

        let mut delivered = 0;
        for shared in subscribers.values() {
            let mut queue = shared
                .queue
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if queue.len() >= self.config.queue_capacity {
                queue.pop_front();
                shared.dropped.fetch_add(1, Ordering::Relaxed);
                self.events_dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    recipient_id = %event.recipient_id,
                    "subscription queue full, dropped oldest event"
                );
            }
            queue.push_back(event.clone());
            drop(queue);
            shared.wakeup.notify_one();
            delivered += 1;
        }
        Ok(delivered)
    }

    /// Registers a new listener for `recipient_id`.
    ///
    /// Many subscriptions may share a recipient; each gets its own queue.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::TooManySubscriptions`] when the bus-wide
    /// ceiling is reached. Existing subscriptions are unaffected.
    pub fn subscribe(&self, recipient_id: Uuid) -> Result<Subscription, NotifyError> {
        let mut registry = self.lock_registry();
        if registry.total >= self.config.max_subscriptions {
            return Err(NotifyError::TooManySubscriptions {
                limit: self.config.max_subscriptions,
            });
        }

        let id = self.next_subscription_id.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::new(SubscriptionShared {
            queue: Mutex::new(VecDeque::with_capacity(self.config.queue_capacity)),
            wakeup: Notify::new(),
            dropped: AtomicU64::new(0),
        });
        registry
            .by_recipient
            .entry(recipient_id)
            .or_default()
            .insert(id, Arc::clone(&shared));
        registry.total += 1;
        drop(registry);

        tracing::debug!(%recipient_id, subscription_id = id, "subscription registered");
        Ok(Subscription {
            id,
            recipient_id,
            shared,
        })
    }

    /// Unregisters `subscription`. Idempotent: removing a subscription that
    /// is already gone is a no-op, not an error.
    pub fn unsubscribe(&self, subscription: &Subscription) {
        let mut registry = self.lock_registry();
        let Some(subscribers) = registry.by_recipient.get_mut(&subscription.recipient_id) else {
            return;
        };
        let removed = subscribers.remove(&subscription.id).is_some();
        let now_empty = subscribers.is_empty();
        if removed {
            registry.total -= 1;
            tracing::debug!(
                recipient_id = %subscription.recipient_id,
                subscription_id = subscription.id,
                "subscription removed"
            );
        }
        if now_empty {
            registry.by_recipient.remove(&subscription.recipient_id);
        }
    }

    /// Shuts the bus down: subsequent emits fail with
    /// [`NotifyError::BusClosed`] and every waiting stream wakes up to
    /// terminate gracefully once its queue drains.
    pub fn close(&self) {
        self.closed_tx.send_replace(true);
        let registry = self.lock_registry();
        for subscribers in registry.by_recipient.values() {
            for shared in subscribers.values() {
                shared.wakeup.notify_one();
            }
        }
        tracing::info!("event bus closed");
    }

    /// Whether [`EventBus::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.closed_tx.borrow()
    }

    /// A receiver that observes the close signal.
    pub(crate) fn closed_signal(&self) -> watch::Receiver<bool> {
        self.closed_tx.subscribe()
    }

    /// Total registered subscriptions across all recipients.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock_registry().total
    }

    /// Registered subscriptions for one recipient.
    #[must_use]
    pub fn recipient_subscriber_count(&self, recipient_id: Uuid) -> usize {
        self.lock_registry()
            .by_recipient
            .get(&recipient_id)
            .map_or(0, HashMap::len)
    }

    /// Snapshot of the bus counters.
    #[must_use]
    pub fn metrics(&self) -> BusMetrics {
        BusMetrics {
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            active_subscriptions: self.subscriber_count(),
        }
    }

    fn lock_registry(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::clock::SystemClock;
    use murmur_core::event::EventPayload;

    fn event_for(recipient: Uuid, title: &str) -> NotificationEvent {
        NotificationEvent::like_added(
            recipient,
            Uuid::new_v4(),
            Uuid::new_v4(),
            EventPayload {
                actor_display_name: "Ada".to_string(),
                actor_avatar_url: None,
                resource_title: title.to_string(),
                comment_text: None,
            },
            &SystemClock,
        )
    }

    #[test]
    fn test_emit_preserves_per_recipient_order() {
        let bus = EventBus::new();
        let recipient = Uuid::new_v4();
        let sub = bus.subscribe(recipient).unwrap();

        for i in 0..5 {
            bus.emit(event_for(recipient, &format!("post-{i}"))).unwrap();
        }

        for i in 0..5 {
            let event = sub.pop().unwrap();
            assert_eq!(event.payload.resource_title, format!("post-{i}"));
        }
        assert!(sub.pop().is_none());
    }

    #[test]
    fn test_subscription_never_observes_other_recipients() {
        let bus = EventBus::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let sub = bus.subscribe(alice).unwrap();

        bus.emit(event_for(bob, "bobs-post")).unwrap();
        bus.emit(event_for(alice, "alices-post")).unwrap();

        let event = sub.pop().unwrap();
        assert_eq!(event.recipient_id, alice);
        assert!(sub.pop().is_none());
    }

    #[test]
    fn test_emit_returns_number_of_subscriptions_reached() {
        let bus = EventBus::new();
        let recipient = Uuid::new_v4();
        let _a = bus.subscribe(recipient).unwrap();
        let _b = bus.subscribe(recipient).unwrap();

        assert_eq!(bus.emit(event_for(recipient, "p")).unwrap(), 2);
        assert_eq!(bus.emit(event_for(Uuid::new_v4(), "q")).unwrap(), 0);
    }

    #[test]
    fn test_overflow_drops_oldest_and_counts() {
        let bus = EventBus::with_config(BusConfig {
            queue_capacity: 3,
            max_subscriptions: 16,
        });
        let recipient = Uuid::new_v4();
        let sub = bus.subscribe(recipient).unwrap();

        for i in 0..7 {
            bus.emit(event_for(recipient, &format!("post-{i}"))).unwrap();
        }

        // Exactly the most recent 3 retained, the first 4 dropped.
        assert_eq!(sub.dropped_events(), 4);
        assert_eq!(bus.metrics().events_dropped, 4);
        for i in 4..7 {
            let event = sub.pop().unwrap();
            assert_eq!(event.payload.resource_title, format!("post-{i}"));
        }
        assert!(sub.pop().is_none());
    }

    #[test]
    fn test_subscribe_fails_at_ceiling_without_affecting_existing() {
        let bus = EventBus::with_config(BusConfig {
            queue_capacity: 4,
            max_subscriptions: 2,
        });
        let recipient = Uuid::new_v4();
        let a = bus.subscribe(recipient).unwrap();
        let _b = bus.subscribe(Uuid::new_v4()).unwrap();

        let err = bus.subscribe(recipient).unwrap_err();
        assert!(matches!(
            err,
            NotifyError::TooManySubscriptions { limit: 2 }
        ));

        // Existing subscriptions still receive events.
        bus.emit(event_for(recipient, "still-works")).unwrap();
        assert!(a.pop().is_some());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let recipient = Uuid::new_v4();
        let sub = bus.subscribe(recipient).unwrap();
        assert_eq!(bus.subscriber_count(), 1);

        bus.unsubscribe(&sub);
        assert_eq!(bus.subscriber_count(), 0);
        bus.unsubscribe(&sub);
        assert_eq!(bus.subscriber_count(), 0);

        // Emitting for the recipient neither errors nor reaches the
        // removed subscription.
        assert_eq!(bus.emit(event_for(recipient, "late")).unwrap(), 0);
        assert!(sub.pop().is_none());
    }

    #[test]
    fn test_emit_after_close_fails() {
        let bus = EventBus::new();
        bus.close();
        let err = bus.emit(event_for(Uuid::new_v4(), "p")).unwrap_err();
        assert!(matches!(err, NotifyError::BusClosed));
    }

    #[test]
    fn test_metrics_track_emissions() {
        let bus = EventBus::new();
        let recipient = Uuid::new_v4();
        let _sub = bus.subscribe(recipient).unwrap();
        bus.emit(event_for(recipient, "a")).unwrap();
        bus.emit(event_for(recipient, "b")).unwrap();

        let metrics = bus.metrics();
        assert_eq!(metrics.events_emitted, 2);
        assert_eq!(metrics.events_dropped, 0);
        assert_eq!(metrics.active_subscriptions, 1);
    }

    #[test]
    fn test_concurrent_emit_and_subscribe() {
        let bus = Arc::new(EventBus::new());
        let recipient = Uuid::new_v4();
        let sub = bus.subscribe(recipient).unwrap();

        let emitter = {
            let bus = Arc::clone(&bus);
            std::thread::spawn(move || {
                for i in 0..100 {
                    bus.emit(event_for(recipient, &format!("post-{i}"))).unwrap();
                }
            })
        };
        let churner = {
            let bus = Arc::clone(&bus);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let s = bus.subscribe(Uuid::new_v4()).unwrap();
                    bus.unsubscribe(&s);
                }
            })
        };
        emitter.join().unwrap();
        churner.join().unwrap();

        // All 100 events arrive in emission order.
        for i in 0..100 {
            let event = sub.pop().unwrap();
            assert_eq!(event.payload.resource_title, format!("post-{i}"));
        }
        assert_eq!(bus.subscriber_count(), 1);
    }
}
