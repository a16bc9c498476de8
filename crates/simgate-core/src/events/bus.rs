//! In-process broadcast bus for [`AuthEvent`]s.

use tokio::sync::broadcast;
use tracing::debug;

use super::{AuthEvent, DomainEvent};

/// Default number of buffered events per subscriber.
const DEFAULT_CAPACITY: usize = 64;

/// Fan-out of lifecycle events to any number of receivers.
///
/// Publishing never blocks and never fails: with no subscribers the event
/// is dropped, and slow subscribers observe `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per receiver.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, payload: AuthEvent) {
        debug!(event = payload.name(), "Publishing auth event");
        let _ = self.tx.send(DomainEvent::new(payload));
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
