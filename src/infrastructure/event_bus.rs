use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::domain::publisher::EventPublisher;

/// An event as relayed to transport-layer subscribers
#[derive(Debug, Clone, Serialize)]
pub struct PublishedEvent {
    pub name: String,
    pub payload: Value,
    pub published_at: DateTime<Utc>,
}

/// In-process broadcast of core events
///
/// Publishing with nobody subscribed is not an error.
pub struct EventBus {
    sender: broadcast::Sender<PublishedEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, event: &str, payload: Value) -> Result<(), String> {
        let event = PublishedEvent {
            name: event.to_string(),
            payload,
            published_at: Utc::now(),
        };

        if self.sender.receiver_count() == 0 {
            tracing::trace!(event = %event.name, "No subscribers for event");
            return Ok(());
        }

        self.sender
            .send(event)
            .map(|_| ())
            .map_err(|e| format!("Failed to publish event: {}", e))
    }
}
