//! Event Bus
//!
//! Broadcast-based fan-out for orchestrator events. Uses
//! `tokio::broadcast` so multiple subscribers can watch the same run;
//! slow subscribers lag (miss events) rather than blocking the
//! publisher, which keeps `emit` safe to call from the hot loop.

use tokio::sync::broadcast;

use super::{EventSink, OrchestratorEvent};

/// Default channel capacity before slow subscribers start lagging.
const DEFAULT_CAPACITY: usize = 256;

/// Fan-out bus for `OrchestratorEvent`s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<OrchestratorEvent>,
}

impl EventBus {
    /// Create a bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all future events.
    ///
    /// Each subscriber gets an independent copy of every published
    /// event. Falling behind by more than the capacity yields
    /// `RecvError::Lagged` on the next recv.
    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all active subscribers.
    ///
    /// Returns the number of subscribers that received it; with no
    /// subscribers the event is silently dropped.
    pub fn publish(&self, event: OrchestratorEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: OrchestratorEvent) {
        self.publish(event);
    }
}
