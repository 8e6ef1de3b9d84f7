//! Courier aggregate and its storage places.

mod aggregate;
mod storage_place;

pub use aggregate::Courier;
pub use storage_place::{StoragePlace, StoragePlaceError};

use thiserror::Error;

use crate::kernel::LocationError;
use crate::order::{OrderError, OrderStatus};

/// Errors that can occur during courier operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CourierError {
    /// Name is required.
    #[error("Courier name is required")]
    EmptyName,

    /// Speed must be positive.
    #[error("Invalid speed: {speed} (must be greater than 0)")]
    InvalidSpeed { speed: i32 },

    /// The order cannot be taken in its current status.
    #[error("Order is already {status}")]
    OrderNotAvailable { status: OrderStatus },

    /// No free storage place can hold the order.
    #[error("No free storage place can hold an order of volume {volume}")]
    NoSuitableStoragePlace { volume: i32 },

    /// The courier does not carry the order.
    #[error("Order {order_id} is not carried by this courier")]
    NonOwnedOrder { order_id: common::OrderId },

    /// Move requested to the courier's current location.
    #[error("Courier is already at the target location")]
    AlreadyAtTarget,

    #[error(transparent)]
    StoragePlace(#[from] StoragePlaceError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Location(#[from] LocationError),
}
