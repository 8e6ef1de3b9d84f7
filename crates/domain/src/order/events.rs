//! Order domain events.

use chrono::{DateTime, Utc};
use common::{CourierId, EventId, OrderId};
use serde::{Deserialize, Serialize};

use crate::event::DomainEvent;

/// Events raised by the order aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was accepted into the system.
    OrderCreated(OrderCreatedData),

    /// Order was delivered by its courier.
    OrderCompleted(OrderCompletedData),
}

impl OrderEvent {
    /// Type name of [`OrderEvent::OrderCreated`].
    pub const ORDER_CREATED: &'static str = "OrderCreated";

    /// Type name of [`OrderEvent::OrderCompleted`].
    pub const ORDER_COMPLETED: &'static str = "OrderCompleted";

    /// Creates an OrderCreated event.
    pub fn order_created(order_id: OrderId) -> Self {
        OrderEvent::OrderCreated(OrderCreatedData {
            event_id: EventId::new(),
            occurred_at: Utc::now(),
            order_id,
        })
    }

    /// Creates an OrderCompleted event.
    pub fn order_completed(order_id: OrderId, courier_id: CourierId) -> Self {
        OrderEvent::OrderCompleted(OrderCompletedData {
            event_id: EventId::new(),
            occurred_at: Utc::now(),
            order_id,
            courier_id,
        })
    }

    /// Returns the order this event is about.
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::OrderCreated(data) => data.order_id,
            OrderEvent::OrderCompleted(data) => data.order_id,
        }
    }
}

impl DomainEvent for OrderEvent {
    fn event_id(&self) -> EventId {
        match self {
            OrderEvent::OrderCreated(data) => data.event_id,
            OrderEvent::OrderCompleted(data) => data.event_id,
        }
    }

    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => Self::ORDER_CREATED,
            OrderEvent::OrderCompleted(_) => Self::ORDER_COMPLETED,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderCreated(data) => data.occurred_at,
            OrderEvent::OrderCompleted(data) => data.occurred_at,
        }
    }

    fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            OrderEvent::OrderCreated(data) => serde_json::to_value(data),
            OrderEvent::OrderCompleted(data) => serde_json::to_value(data),
        }
    }
}

/// Data for OrderCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedData {
    /// Identity of this event occurrence.
    pub event_id: EventId,

    /// When the order was created (UTC).
    pub occurred_at: DateTime<Utc>,

    /// The created order.
    pub order_id: OrderId,
}

impl From<OrderCreatedData> for OrderEvent {
    fn from(data: OrderCreatedData) -> Self {
        OrderEvent::OrderCreated(data)
    }
}

/// Data for OrderCompleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCompletedData {
    /// Identity of this event occurrence.
    pub event_id: EventId,

    /// When the order was completed (UTC).
    pub occurred_at: DateTime<Utc>,

    /// The completed order.
    pub order_id: OrderId,

    /// The courier who delivered it.
    pub courier_id: CourierId,
}

impl From<OrderCompletedData> for OrderEvent {
    fn from(data: OrderCompletedData) -> Self {
        OrderEvent::OrderCompleted(data)
    }
}
