//! Validated use-case inputs.
//!
//! Constructors reject malformed input, so a command that exists is always
//! safe to hand to [`DeliveryService`](crate::DeliveryService).

use common::{CourierId, OrderId};

use crate::error::{ApplicationError, Result};

/// Command to register a new courier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCourier {
    name: String,
    speed: i32,
}

impl CreateCourier {
    pub fn new(name: impl Into<String>, speed: i32) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ApplicationError::validation("name", "value is required"));
        }
        if speed <= 0 {
            return Err(ApplicationError::validation(
                "speed",
                format!("{speed} must be greater than 0"),
            ));
        }

        Ok(Self { name, speed })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }
}

/// Command to add a storage place to an existing courier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddStoragePlace {
    courier_id: CourierId,
    name: String,
    volume: i32,
}

impl AddStoragePlace {
    pub fn new(courier_id: CourierId, name: impl Into<String>, volume: i32) -> Result<Self> {
        if courier_id.is_nil() {
            return Err(ApplicationError::validation("courier_id", "value is required"));
        }
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ApplicationError::validation("name", "value is required"));
        }
        if volume <= 0 {
            return Err(ApplicationError::validation(
                "volume",
                format!("{volume} must be greater than 0"),
            ));
        }

        Ok(Self {
            courier_id,
            name,
            volume,
        })
    }

    pub fn courier_id(&self) -> CourierId {
        self.courier_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn volume(&self) -> i32 {
        self.volume
    }
}

/// Command to accept a new order for delivery to a street address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrder {
    order_id: OrderId,
    street: String,
    volume: i32,
}

impl CreateOrder {
    pub fn new(order_id: OrderId, street: impl Into<String>, volume: i32) -> Result<Self> {
        if order_id.is_nil() {
            return Err(ApplicationError::validation("order_id", "value is required"));
        }
        let street = street.into();
        if street.trim().is_empty() {
            return Err(ApplicationError::validation("street", "value is required"));
        }
        if volume <= 0 {
            return Err(ApplicationError::validation(
                "volume",
                format!("{volume} must be greater than 0"),
            ));
        }

        Ok(Self {
            order_id,
            street,
            volume,
        })
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn volume(&self) -> i32 {
        self.volume
    }
}
