use chrono::{DateTime, Utc};
use common::EventId;
use domain::DomainEvent;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A domain event persisted for later delivery.
///
/// Written in the same transaction as the aggregate that raised the event.
/// After that only `processed_at` ever changes; rows are kept as a record of
/// what was delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxMessage {
    /// Same as the id of the event it carries.
    pub id: EventId,

    /// Event type name used to pick a decoder.
    pub event_type: String,

    /// Event-specific payload.
    pub payload: serde_json::Value,

    /// When the event was raised (UTC).
    pub occurred_at: DateTime<Utc>,

    /// When the event was published, `None` while pending.
    pub processed_at: Option<DateTime<Utc>>,
}

impl OutboxMessage {
    /// Builds a pending message from a domain event.
    pub fn from_event<E: DomainEvent>(event: &E) -> Result<Self> {
        Ok(Self {
            id: event.event_id(),
            event_type: event.event_type().to_string(),
            payload: event.payload()?,
            occurred_at: event.occurred_at(),
            processed_at: None,
        })
    }

    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }

    /// Stamps the message as published at `at`.
    pub fn mark_processed(&mut self, at: DateTime<Utc>) {
        self.processed_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{CourierId, OrderId};
    use domain::OrderEvent;

    #[test]
    fn test_from_event_copies_identity_and_type() {
        let event = OrderEvent::order_completed(OrderId::new(), CourierId::new());
        let message = OutboxMessage::from_event(&event).unwrap();

        assert_eq!(message.id, event.event_id());
        assert_eq!(message.event_type, "OrderCompleted");
        assert_eq!(message.occurred_at, event.occurred_at());
        assert_eq!(message.payload, event.payload().unwrap());
        assert!(!message.is_processed());
    }

    #[test]
    fn test_mark_processed() {
        let event = OrderEvent::order_created(OrderId::new());
        let mut message = OutboxMessage::from_event(&event).unwrap();
        let now = Utc::now();

        message.mark_processed(now);

        assert!(message.is_processed());
        assert_eq!(message.processed_at, Some(now));
    }
}
