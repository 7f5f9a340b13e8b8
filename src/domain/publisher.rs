use serde_json::Value;

/// Fire-and-forget event publication toward the transport layer
///
/// Callers treat an `Err` as a warning only; publishing never fails the
/// operation that produced the event.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &str, payload: Value) -> Result<(), String>;
}
