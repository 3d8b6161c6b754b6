//! Event bus for broadcasting events to subscribers.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::event::HarborEvent;

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Event bus for broadcasting events to all subscribers.
///
/// Events are delivered asynchronously and in publish order to every
/// receiver currently subscribed; there is one bus per process, shared by
/// `harbor-mcp`, `harbor-runtime`, and `harbor-host`'s outbound dispatch.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<HarborEvent>>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    pub fn publish(&self, event: HarborEvent) -> usize {
        let event = Arc::new(event);

        trace!(event_type = %event.event_type(), "publishing event");

        if let Ok(count) = self.sender.send(Arc::clone(&event)) {
            debug!(
                event_type = %event.event_type(),
                receiver_count = count,
                "event published"
            );
            count
        } else {
            trace!(event_type = %event.event_type(), "no receivers for event");
            0
        }
    }

    /// Subscribe to events.
    ///
    /// Returns a receiver that will receive all events published from this
    /// point forward.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Get the current number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            capacity: self.capacity,
        }
    }
}

/// Receiver for events from the event bus.
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<HarborEvent>>,
}

impl EventReceiver {
    /// Receive the next event.
    ///
    /// Returns `None` if the channel is closed. A slow receiver that falls
    /// behind skips the dropped events (logging a warning) rather than
    /// returning a lag error to the caller.
    pub async fn recv(&mut self) -> Option<Arc<HarborEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive the next event without blocking.
    pub fn try_recv(&mut self) -> Option<Arc<HarborEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "event receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventMetadata;
    use harbor_core::SessionId;

    fn sample_event() -> HarborEvent {
        HarborEvent::ServerStarted {
            metadata: EventMetadata::new("test"),
            server_id: "gmail".to_string(),
        }
    }

    #[tokio::test]
    async fn bus_creation_defaults() {
        let bus = EventBus::new();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        let count = bus.publish(sample_event());
        assert_eq!(count, 1);

        let msg = receiver.recv().await.unwrap();
        assert_eq!(msg.event_type(), "server_started");
    }

    #[tokio::test]
    async fn multiple_subscribers_all_receive() {
        let bus = EventBus::new();
        let mut r1 = bus.subscribe();
        let mut r2 = bus.subscribe();

        let count = bus.publish(sample_event());
        assert_eq!(count, 2);

        assert_eq!(r1.recv().await.unwrap().event_type(), "server_started");
        assert_eq!(r2.recv().await.unwrap().event_type(), "server_started");
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_returns_zero() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(sample_event()), 0);
    }

    #[tokio::test]
    async fn try_recv_empty_then_after_publish() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        assert!(receiver.try_recv().is_none());

        bus.publish(sample_event());
        assert!(receiver.try_recv().is_some());
    }

    #[tokio::test]
    async fn clone_shares_sender_not_subscribers() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        let clone = bus.clone();

        clone.publish(HarborEvent::Usage {
            metadata: EventMetadata::new("llm"),
            session_id: SessionId::new(),
            prompt_tokens: 1,
            completion_tokens: 1,
        });

        assert_eq!(receiver.recv().await.unwrap().event_type(), "usage");
    }
}
