//! Order aggregate and related types.

mod aggregate;
mod events;
mod status;

pub use aggregate::Order;
pub use events::{OrderCompletedData, OrderCreatedData, OrderEvent};
pub use status::OrderStatus;

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Order ID is required.
    #[error("Order ID is required")]
    EmptyId,

    /// Invalid volume.
    #[error("Invalid volume: {volume} (must be greater than 0)")]
    InvalidVolume { volume: i32 },

    /// Courier ID is required for assignment.
    #[error("Courier ID is required")]
    EmptyCourierId,

    /// Order is not in the expected status.
    #[error("Invalid state transition: cannot {action} from {current} status")]
    InvalidStateTransition {
        current: OrderStatus,
        action: &'static str,
    },

    /// Stored status string is not recognized.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}
