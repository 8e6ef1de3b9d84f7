//! Application error types.

use common::{CourierId, OrderId};
use domain::{CourierError, DispatchError, DomainError, LocationError, OrderError};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while running a use-case.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Command input was rejected before touching any state.
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// An aggregate rejected the operation.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// The store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A courier referenced by the workflow does not exist.
    #[error("Courier not found: {0}")]
    CourierNotFound(CourierId),

    /// An order with the same id was already created.
    #[error("Order already exists: {0}")]
    OrderAlreadyExists(OrderId),

    /// The street could not be resolved to a location.
    #[error("Geolocation failed for '{street}': {reason}")]
    Geo { street: String, reason: String },

    /// The notification sink rejected an event.
    #[error("Notification failed: {0}")]
    Notification(String),
}

impl ApplicationError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

impl From<CourierError> for ApplicationError {
    fn from(e: CourierError) -> Self {
        Self::Domain(e.into())
    }
}

impl From<OrderError> for ApplicationError {
    fn from(e: OrderError) -> Self {
        Self::Domain(e.into())
    }
}

impl From<DispatchError> for ApplicationError {
    fn from(e: DispatchError) -> Self {
        Self::Domain(e.into())
    }
}

impl From<LocationError> for ApplicationError {
    fn from(e: LocationError) -> Self {
        Self::Domain(e.into())
    }
}

/// Convenience type alias for application results.
pub type Result<T> = std::result::Result<T, ApplicationError>;
