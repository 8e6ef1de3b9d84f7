//! Domain layer for the delivery system.
//!
//! This crate provides the core delivery model:
//! - `Location` value object on the bounded grid
//! - `Courier` aggregate owning its storage places
//! - `Order` aggregate with its status state machine and domain events
//! - `OrderDispatcher` for matching orders to couriers

pub mod courier;
pub mod error;
pub mod event;
pub mod kernel;
pub mod order;
pub mod services;

pub use courier::{Courier, CourierError, StoragePlace, StoragePlaceError};
pub use error::DomainError;
pub use event::DomainEvent;
pub use kernel::{Location, LocationError};
pub use order::{
    Order, OrderCompletedData, OrderCreatedData, OrderError, OrderEvent, OrderStatus,
};
pub use services::{DispatchError, OrderDispatcher};
