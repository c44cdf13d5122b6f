use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::TenantId;

/// Broadcast publisher for compliance lifecycle events.
///
/// Subscribers (notification delivery, audit, UI refresh) live outside the
/// engine; publishing with nobody listening is not an error.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub id: Uuid,
    pub name: String,
    pub tenant_id: TenantId,
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub async fn publish(
        &self,
        event_name: impl Into<String>,
        tenant_id: TenantId,
        context: Value,
    ) -> Result<(), PublishError> {
        let event = PublishedEvent {
            id: Uuid::new_v4(),
            name: event_name.into(),
            tenant_id,
            context,
            published_at: chrono::Utc::now(),
        };

        // send() only fails when there are no receivers
        let _ = self.sender.send(event);
        Ok(())
    }

    /// Serialize `payload` as the event context and publish it.
    pub async fn publish_serialized<T: serde::Serialize>(
        &self,
        event_name: &str,
        tenant_id: TenantId,
        payload: &T,
    ) -> Result<(), PublishError> {
        let context = serde_json::to_value(payload)?;
        self.publish(event_name, tenant_id, context).await
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Error types for event publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_EVENT_CHANNEL_CAPACITY)
    }
}
