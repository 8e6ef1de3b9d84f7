//! Outbox handlers for order events.

use std::sync::Arc;

use async_trait::async_trait;
use domain::OrderEvent;
use outbox::{EventHandler, OutboxError};

use crate::ports::NotificationProducer;

/// Forwards every order event to the notification producer.
pub struct OrderEventsHandler {
    producer: Arc<dyn NotificationProducer>,
}

impl OrderEventsHandler {
    pub fn new(producer: Arc<dyn NotificationProducer>) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl EventHandler<OrderEvent> for OrderEventsHandler {
    fn name(&self) -> &'static str {
        "order_events"
    }

    async fn handle(&self, event: &OrderEvent) -> outbox::Result<()> {
        self.producer
            .publish(event)
            .await
            .map_err(|e| OutboxError::Handler {
                handler: self.name(),
                message: e.to_string(),
            })
    }
}
