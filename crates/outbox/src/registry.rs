//! Maps event type names to payload decoders.

use std::collections::HashMap;

use domain::{OrderCompletedData, OrderCreatedData, OrderEvent};
use serde::de::DeserializeOwned;
use store::OutboxMessage;

use crate::{OutboxError, Result};

type Decoder<E> = Box<dyn Fn(serde_json::Value) -> serde_json::Result<E> + Send + Sync>;

/// Registry of decoders keyed by event type name.
///
/// Decoding fails for any type name that was not registered.
pub struct EventRegistry<E> {
    decoders: HashMap<String, Decoder<E>>,
}

impl<E> Default for EventRegistry<E> {
    fn default() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }
}

impl<E: 'static> EventRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` as the payload of `event_type`. Decoded payloads are
    /// converted into `E`.
    pub fn register<T>(&mut self, event_type: impl Into<String>) -> &mut Self
    where
        T: DeserializeOwned + Into<E> + 'static,
    {
        self.decoders.insert(
            event_type.into(),
            Box::new(|payload| serde_json::from_value::<T>(payload).map(Into::into)),
        );
        self
    }

    pub fn is_registered(&self, event_type: &str) -> bool {
        self.decoders.contains_key(event_type)
    }

    /// Decodes a stored message back into its event.
    pub fn decode(&self, message: &OutboxMessage) -> Result<E> {
        let decoder = self
            .decoders
            .get(&message.event_type)
            .ok_or_else(|| OutboxError::UnknownEventType(message.event_type.clone()))?;

        decoder(message.payload.clone()).map_err(|source| OutboxError::Decode {
            event_type: message.event_type.clone(),
            source,
        })
    }
}

impl EventRegistry<OrderEvent> {
    /// Registry covering every order event.
    pub fn order_events() -> Self {
        let mut registry = Self::new();
        registry
            .register::<OrderCreatedData>(OrderEvent::ORDER_CREATED)
            .register::<OrderCompletedData>(OrderEvent::ORDER_COMPLETED);
        registry
    }
}
