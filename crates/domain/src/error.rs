//! Domain error types.

use thiserror::Error;

use crate::courier::{CourierError, StoragePlaceError};
use crate::kernel::LocationError;
use crate::order::OrderError;
use crate::services::DispatchError;

/// Errors that can occur during domain operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Storage place error: {0}")]
    StoragePlace(#[from] StoragePlaceError),

    #[error("Courier error: {0}")]
    Courier(#[from] CourierError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
