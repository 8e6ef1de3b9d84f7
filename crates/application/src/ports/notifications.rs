//! Notification port: the sink that order status changes are published to.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{DomainEvent, OrderEvent, OrderStatus};
use serde_json::json;
use tracing::info;

use crate::error::{ApplicationError, Result};

/// Publishes order events to external consumers.
///
/// Events can be delivered more than once, so implementations must accept
/// repeats of the same event id.
#[async_trait]
pub trait NotificationProducer: Send + Sync {
    async fn publish(&self, event: &OrderEvent) -> Result<()>;
}

/// Builds the integration message sent for an order event, keyed by order id.
pub fn order_status_message(event: &OrderEvent) -> (String, serde_json::Value) {
    let status = match event {
        OrderEvent::OrderCreated(_) => OrderStatus::Created,
        OrderEvent::OrderCompleted(_) => OrderStatus::Completed,
    };
    let key = event.order_id().to_string();
    let message = json!({
        "event_id": event.event_id(),
        "order_id": event.order_id(),
        "order_status": status.as_str(),
        "occurred_at": event.occurred_at(),
    });
    (key, message)
}

/// Writes each notification as a structured log line.
#[derive(Debug, Clone)]
pub struct LoggingNotificationProducer {
    topic: String,
}

impl LoggingNotificationProducer {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl Default for LoggingNotificationProducer {
    fn default() -> Self {
        Self::new("order.status.changed")
    }
}

#[async_trait]
impl NotificationProducer for LoggingNotificationProducer {
    async fn publish(&self, event: &OrderEvent) -> Result<()> {
        let (key, message) = order_status_message(event);
        info!(
            topic = %self.topic,
            key = %key,
            event_type = event.event_type(),
            message = %message,
            "Order notification published"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    published: Vec<OrderEvent>,
    fail_on_publish: bool,
}

/// Records published events in memory, for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationProducer {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationProducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the producer to reject every event.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().unwrap().fail_on_publish = fail;
    }

    /// Returns the events published so far, in publish order.
    pub fn published(&self) -> Vec<OrderEvent> {
        self.state.read().unwrap().published.clone()
    }
}

#[async_trait]
impl NotificationProducer for InMemoryNotificationProducer {
    async fn publish(&self, event: &OrderEvent) -> Result<()> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_publish {
            return Err(ApplicationError::Notification(
                "broker unavailable".to_string(),
            ));
        }

        state.published.push(event.clone());
        Ok(())
    }
}
