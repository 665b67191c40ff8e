//! Post-commit notification dispatch.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use murmur_bus::{EventBus, NotificationStream};
use murmur_core::error::NotifyError;
use murmur_core::event::NotificationEvent;
use murmur_relay::RelayPublisher;

/// Dispatches committed domain events to local subscribers and the relay.
///
/// The single producer-facing entry point of the subsystem. Must be used
/// inside a tokio runtime: relay publishing runs on a detached task so the
/// write path never waits on the relay.
pub struct Notifier {
    bus: Arc<EventBus>,
    publisher: Arc<RelayPublisher>,
}

impl Notifier {
    /// Creates a notifier over `bus` and `publisher`.
    #[must_use]
    pub fn new(bus: Arc<EventBus>, publisher: Arc<RelayPublisher>) -> Self {
        Self { bus, publisher }
    }

    /// Delivers `event` best-effort: enqueue to every matching local
    /// subscription, then publish to the recipient's relay channel on a
    /// detached task.
    ///
    /// Called after the originating write has committed, never inside its
    /// transaction. Infallible by design — a closed bus or a failing relay
    /// is logged, and the write that produced the event stays committed.
    pub fn notify(&self, event: NotificationEvent) {
        match self.bus.emit(event.clone()) {
            Ok(delivered) => {
                tracing::debug!(
                    recipient_id = %event.recipient_id,
                    event_type = event.event_type(),
                    delivered,
                    "event emitted to local subscriptions"
                );
            }
            Err(err) => {
                tracing::debug!(
                    recipient_id = %event.recipient_id,
                    error = %err,
                    "local fan-out skipped"
                );
            }
        }

        let publisher = Arc::clone(&self.publisher);
        tokio::spawn(async move {
            // Failures are already logged and counted by the publisher.
            let _ = publisher.publish_event(&event).await;
        });
    }

    /// Opens a live, cancellable stream of `recipient_id`'s events.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::TooManySubscriptions`] at the bus ceiling.
    pub fn open_stream(
        &self,
        recipient_id: Uuid,
        cancel: CancellationToken,
    ) -> Result<NotificationStream, NotifyError> {
        self.bus.open_stream(recipient_id, cancel)
    }

    /// The underlying bus, for shutdown wiring and metrics.
    #[must_use]
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// The underlying relay publisher, for metrics.
    #[must_use]
    pub fn publisher(&self) -> &Arc<RelayPublisher> {
        &self.publisher
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}
