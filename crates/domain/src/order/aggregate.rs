//! Order aggregate implementation.

use common::{CourierId, OrderId};

use crate::kernel::Location;

use super::{OrderError, OrderEvent, OrderStatus};

/// Order aggregate root.
///
/// Represents a delivery order from creation through assignment to a courier
/// and final completion. Every state change that other systems care about is
/// recorded as a pending [`OrderEvent`]; the repository drains those events
/// into the outbox in the same transaction that saves the order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    courier_id: Option<CourierId>,
    location: Location,
    volume: i32,
    status: OrderStatus,
    events: Vec<OrderEvent>,
}

impl Order {
    /// Creates a new order and raises `OrderCreated`.
    pub fn new(id: OrderId, location: Location, volume: i32) -> Result<Self, OrderError> {
        if id.is_nil() {
            return Err(OrderError::EmptyId);
        }

        if volume <= 0 {
            return Err(OrderError::InvalidVolume { volume });
        }

        Ok(Self {
            id,
            courier_id: None,
            location,
            volume,
            status: OrderStatus::Created,
            events: vec![OrderEvent::order_created(id)],
        })
    }

    /// Rebuilds an order from persisted state. No events are raised.
    pub fn restore(
        id: OrderId,
        courier_id: Option<CourierId>,
        location: Location,
        volume: i32,
        status: OrderStatus,
    ) -> Self {
        Self {
            id,
            courier_id,
            location,
            volume,
            status,
            events: Vec::new(),
        }
    }
}

// Query methods
impl Order {
    /// Returns the order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the assigned courier, if any.
    pub fn courier_id(&self) -> Option<CourierId> {
        self.courier_id
    }

    /// Returns the delivery location.
    pub fn location(&self) -> Location {
        self.location
    }

    /// Returns the order volume.
    pub fn volume(&self) -> i32 {
        self.volume
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the events raised since the order was last saved.
    pub fn events(&self) -> &[OrderEvent] {
        &self.events
    }
}

// Command methods
impl Order {
    /// Assigns a courier. Only valid while the order is `Created`.
    pub fn assign_courier(&mut self, courier_id: CourierId) -> Result<(), OrderError> {
        if !self.status.can_assign() {
            return Err(OrderError::InvalidStateTransition {
                current: self.status,
                action: "assign courier",
            });
        }

        if courier_id.is_nil() {
            return Err(OrderError::EmptyCourierId);
        }

        self.courier_id = Some(courier_id);
        self.status = OrderStatus::Assigned;
        Ok(())
    }

    /// Marks the order delivered and raises `OrderCompleted`.
    pub fn complete(&mut self) -> Result<(), OrderError> {
        if !self.status.can_complete() {
            return Err(OrderError::InvalidStateTransition {
                current: self.status,
                action: "complete",
            });
        }

        let courier_id = self.courier_id.ok_or(OrderError::EmptyCourierId)?;

        self.status = OrderStatus::Completed;
        self.events
            .push(OrderEvent::order_completed(self.id, courier_id));
        Ok(())
    }

    /// Drains pending events, leaving the queue empty.
    pub fn take_events(&mut self) -> Vec<OrderEvent> {
        std::mem::take(&mut self.events)
    }
}
