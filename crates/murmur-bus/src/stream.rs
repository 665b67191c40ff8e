//! Subscription stream adapter.
//!
//! Turns a [`Subscription`] into a lazy, infinite, non-restartable sequence
//! of events for one recipient. Pulling the next event is the only
//! suspension point in the subsystem: a three-way race between a queue
//! wakeup, the consumer's cancellation token, and bus shutdown.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use murmur_core::event::NotificationEvent;

use crate::bus::{EventBus, Subscription};

/// Why a stream stopped yielding events. Not a failure: both ends are
/// graceful for the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The consumer's cancellation token fired.
    Cancelled,
    /// The bus was shut down and the queue has drained.
    BusClosed,
}

/// A cancellable, ordered stream of one recipient's notification events.
///
/// Events arrive in per-recipient emission order. When the stream ends —
/// by cancellation, bus shutdown, or drop — its subscription is
/// unregistered from the bus; the unregistration happens before the end is
/// observable to the caller, so no live subscription ever outlasts its
/// consumer.
pub struct NotificationStream {
    bus: Arc<EventBus>,
    subscription: Option<Subscription>,
    cancel: CancellationToken,
    closed: watch::Receiver<bool>,
    ended: Option<StreamEnd>,
}

impl NotificationStream {
    /// Builds a stream over `subscription`, tying its lifetime to `cancel`.
    #[must_use]
    pub fn new(bus: Arc<EventBus>, subscription: Subscription, cancel: CancellationToken) -> Self {
        let closed = bus.closed_signal();
        Self {
            bus,
            subscription: Some(subscription),
            cancel,
            closed,
            ended: None,
        }
    }

    /// Waits for the next event.
    ///
    /// Suspends until an event is queued, the cancellation token fires, or
    /// the bus closes — whichever happens first. Queued events are drained
    /// before a bus closure is reported; cancellation takes effect within
    /// one scheduling step regardless of queue contents.
    ///
    /// # Errors
    ///
    /// Returns [`StreamEnd::Cancelled`] or [`StreamEnd::BusClosed`] once
    /// the stream has terminated. The stream is non-restartable: every
    /// subsequent call returns the same end.
    pub async fn next(&mut self) -> Result<NotificationEvent, StreamEnd> {
        loop {
            if let Some(end) = self.ended {
                return Err(end);
            }
            if self.cancel.is_cancelled() {
                return Err(self.finish(StreamEnd::Cancelled));
            }
            let Some(subscription) = &self.subscription else {
                return Err(StreamEnd::BusClosed);
            };
            if let Some(event) = subscription.pop() {
                return Ok(event);
            }
            if *self.closed.borrow() {
                return Err(self.finish(StreamEnd::BusClosed));
            }

            tokio::select! {
                () = subscription.shared.wakeup.notified() => {}
                () = self.cancel.cancelled() => {}
                _ = self.closed.changed() => {}
            }
        }
    }

    /// Events dropped from this stream's queue by the overflow policy.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.subscription
            .as_ref()
            .map_or(0, Subscription::dropped_events)
    }

    /// The recipient this stream observes events for.
    #[must_use]
    pub fn recipient_id(&self) -> Option<uuid::Uuid> {
        self.subscription.as_ref().map(Subscription::recipient_id)
    }

    /// Unregisters the subscription, then records the end so the caller
    /// only observes termination after cleanup has completed.
    fn finish(&mut self, end: StreamEnd) -> StreamEnd {
        if let Some(subscription) = self.subscription.take() {
            self.bus.unsubscribe(&subscription);
        }
        self.ended = Some(end);
        end
    }
}

impl Drop for NotificationStream {
    fn drop(&mut self) {
        // Covers consumers that disappear without cancelling, e.g. a
        // disconnected HTTP client dropping its response stream.
        if let Some(subscription) = self.subscription.take() {
            self.bus.unsubscribe(&subscription);
        }
    }
}

impl std::fmt::Debug for NotificationStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationStream")
            .field("recipient_id", &self.recipient_id())
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Registers a subscription for `recipient_id` and wraps it in a
    /// [`NotificationStream`] tied to `cancel`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::TooManySubscriptions`] when the bus-wide
    /// ceiling is reached.
    ///
    /// [`NotifyError::TooManySubscriptions`]: murmur_core::error::NotifyError::TooManySubscriptions
    pub fn open_stream(
        self: &Arc<Self>,
        recipient_id: uuid::Uuid,
        cancel: CancellationToken,
    ) -> Result<NotificationStream, murmur_core::error::NotifyError> {
        let subscription = self.subscribe(recipient_id)?;
        Ok(NotificationStream::new(
            Arc::clone(self),
            subscription,
            cancel,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use murmur_core::clock::SystemClock;
    use murmur_core::event::{EventPayload, NotificationEvent};
    use uuid::Uuid;

    use crate::bus::BusConfig;

    fn event_for(recipient: Uuid, title: &str) -> NotificationEvent {
        NotificationEvent::comment_added(
            recipient,
            Uuid::new_v4(),
            Uuid::new_v4(),
            EventPayload {
                actor_display_name: "Bea".to_string(),
                actor_avatar_url: None,
                resource_title: title.to_string(),
                comment_text: Some("hello".to_string()),
            },
            &SystemClock,
        )
    }

    #[tokio::test]
    async fn test_stream_yields_events_in_emission_order() {
        let bus = Arc::new(EventBus::new());
        let recipient = Uuid::new_v4();
        let mut stream = bus
            .open_stream(recipient, CancellationToken::new())
            .unwrap();

        for i in 0..3 {
            bus.emit(event_for(recipient, &format!("post-{i}"))).unwrap();
        }
        for i in 0..3 {
            let event = stream.next().await.unwrap();
            assert_eq!(event.payload.resource_title, format!("post-{i}"));
            assert_eq!(event.recipient_id, recipient);
        }
    }

    #[tokio::test]
    async fn test_stream_wakes_when_event_arrives_mid_wait() {
        let bus = Arc::new(EventBus::new());
        let recipient = Uuid::new_v4();
        let mut stream = bus
            .open_stream(recipient, CancellationToken::new())
            .unwrap();

        let emitter = {
            let bus = Arc::clone(&bus);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                bus.emit(event_for(recipient, "late-arrival")).unwrap();
            })
        };

        let event = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("stream should wake")
            .unwrap();
        assert_eq!(event.payload.resource_title, "late-arrival");
        emitter.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancellation_mid_wait_cleans_up_before_returning() {
        let bus = Arc::new(EventBus::new());
        let recipient = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let mut stream = bus.open_stream(recipient, cancel.clone()).unwrap();
        assert_eq!(bus.recipient_subscriber_count(recipient), 1);

        let waiter = tokio::spawn(async move {
            let end = stream.next().await.unwrap_err();
            (end, stream)
        });
        tokio::task::yield_now().await;
        cancel.cancel();

        let (end, stream) = tokio::time::timeout(Duration::from_millis(100), waiter)
            .await
            .expect("cancellation should terminate the stream promptly")
            .unwrap();
        assert_eq!(end, StreamEnd::Cancelled);

        // The bus no longer holds the subscription, and a later emit
        // neither errors nor reaches the cancelled stream.
        assert_eq!(bus.recipient_subscriber_count(recipient), 0);
        assert_eq!(bus.emit(event_for(recipient, "after")).unwrap(), 0);
        drop(stream);
    }

    #[tokio::test]
    async fn test_cancellation_preempts_queued_events() {
        let bus = Arc::new(EventBus::new());
        let recipient = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let mut stream = bus.open_stream(recipient, cancel.clone()).unwrap();

        bus.emit(event_for(recipient, "queued")).unwrap();
        cancel.cancel();

        assert_eq!(stream.next().await.unwrap_err(), StreamEnd::Cancelled);
        // Non-restartable: the end is sticky.
        assert_eq!(stream.next().await.unwrap_err(), StreamEnd::Cancelled);
    }

    #[tokio::test]
    async fn test_bus_close_drains_queue_then_ends() {
        let bus = Arc::new(EventBus::new());
        let recipient = Uuid::new_v4();
        let mut stream = bus
            .open_stream(recipient, CancellationToken::new())
            .unwrap();

        bus.emit(event_for(recipient, "a")).unwrap();
        bus.emit(event_for(recipient, "b")).unwrap();
        bus.close();

        assert_eq!(stream.next().await.unwrap().payload.resource_title, "a");
        assert_eq!(stream.next().await.unwrap().payload.resource_title, "b");
        assert_eq!(stream.next().await.unwrap_err(), StreamEnd::BusClosed);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_bus_close_wakes_waiting_stream() {
        let bus = Arc::new(EventBus::new());
        let mut stream = bus
            .open_stream(Uuid::new_v4(), CancellationToken::new())
            .unwrap();

        let closer = {
            let bus = Arc::clone(&bus);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                bus.close();
            })
        };

        let end = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("close should wake the stream")
            .unwrap_err();
        assert_eq!(end, StreamEnd::BusClosed);
        closer.await.unwrap();
    }

    #[tokio::test]
    async fn test_dropping_stream_unregisters_subscription() {
        let bus = Arc::new(EventBus::new());
        let recipient = Uuid::new_v4();
        let stream = bus
            .open_stream(recipient, CancellationToken::new())
            .unwrap();
        assert_eq!(bus.recipient_subscriber_count(recipient), 1);

        drop(stream);
        assert_eq!(bus.recipient_subscriber_count(recipient), 0);
    }

    #[tokio::test]
    async fn test_overflowed_stream_reports_drops_and_keeps_newest() {
        let bus = Arc::new(EventBus::with_config(BusConfig {
            queue_capacity: 2,
            max_subscriptions: 8,
        }));
        let recipient = Uuid::new_v4();
        let mut stream = bus
            .open_stream(recipient, CancellationToken::new())
            .unwrap();

        for i in 0..5 {
            bus.emit(event_for(recipient, &format!("post-{i}"))).unwrap();
        }

        assert_eq!(stream.dropped_events(), 3);
        assert_eq!(stream.next().await.unwrap().payload.resource_title, "post-3");
        assert_eq!(stream.next().await.unwrap().payload.resource_title, "post-4");
    }
}
