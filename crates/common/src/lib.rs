//! Shared types for the delivery workspace.

mod types;

pub use types::{CourierId, EventId, OrderId, StoragePlaceId};
