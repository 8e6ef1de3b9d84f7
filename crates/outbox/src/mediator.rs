//! Dispatches decoded events to the handlers subscribed to them.

use std::collections::HashMap;
use std::sync::Arc;

use domain::DomainEvent;
use tracing::debug;

use crate::{EventHandler, Result};

/// Publishes events to zero or more handlers.
///
/// Handlers subscribe to one event type name or to every event. They run in
/// subscription order; the first failure stops the publish and is returned.
pub struct Mediator<E> {
    by_type: HashMap<String, Vec<Arc<dyn EventHandler<E>>>>,
    all: Vec<Arc<dyn EventHandler<E>>>,
}

impl<E> Default for Mediator<E> {
    fn default() -> Self {
        Self {
            by_type: HashMap::new(),
            all: Vec::new(),
        }
    }
}

impl<E: DomainEvent> Mediator<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `handler` to events of one type.
    pub fn subscribe(
        &mut self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler<E>>,
    ) -> &mut Self {
        self.by_type
            .entry(event_type.into())
            .or_default()
            .push(handler);
        self
    }

    /// Subscribes `handler` to every event.
    pub fn subscribe_all(&mut self, handler: Arc<dyn EventHandler<E>>) -> &mut Self {
        self.all.push(handler);
        self
    }

    /// Returns the number of handlers that would receive `event_type`.
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.all.len() + self.by_type.get(event_type).map_or(0, Vec::len)
    }

    /// Delivers the event to every matching handler and returns how many ran.
    pub async fn publish(&self, event: &E) -> Result<usize> {
        let typed = self
            .by_type
            .get(event.event_type())
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut delivered = 0;
        for handler in typed.iter().chain(self.all.iter()) {
            handler.handle(event).await?;
            delivered += 1;
        }

        debug!(
            event_id = %event.event_id(),
            event_type = event.event_type(),
            handlers = delivered,
            "Event published"
        );
        Ok(delivered)
    }
}
