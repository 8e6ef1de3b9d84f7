//! Storage place entity owned by a courier.

use common::{OrderId, StoragePlaceId};
use thiserror::Error;

/// Errors raised by storage place invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoragePlaceError {
    /// Name is required.
    #[error("Storage place name is required")]
    EmptyName,

    /// Invalid total volume.
    #[error("Invalid storage place volume: {volume} (must be greater than 0)")]
    InvalidVolume { volume: i32 },

    /// The place already holds an order.
    #[error("Storage place is already occupied by order {order_id}")]
    Occupied { order_id: OrderId },

    /// The order does not fit.
    #[error("Order volume {volume} exceeds storage place capacity {capacity}")]
    VolumeExceeded { volume: i32, capacity: i32 },
}

/// A named capacity slot that holds at most one order at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePlace {
    id: StoragePlaceId,
    name: String,
    total_volume: i32,
    order_id: Option<OrderId>,
}

impl StoragePlace {
    /// Creates an empty storage place.
    pub fn new(name: impl Into<String>, total_volume: i32) -> Result<Self, StoragePlaceError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StoragePlaceError::EmptyName);
        }

        if total_volume <= 0 {
            return Err(StoragePlaceError::InvalidVolume {
                volume: total_volume,
            });
        }

        Ok(Self {
            id: StoragePlaceId::new(),
            name,
            total_volume,
            order_id: None,
        })
    }

    /// Rebuilds a storage place from persisted state.
    pub fn restore(
        id: StoragePlaceId,
        name: String,
        total_volume: i32,
        order_id: Option<OrderId>,
    ) -> Self {
        Self {
            id,
            name,
            total_volume,
            order_id,
        }
    }

    pub fn id(&self) -> StoragePlaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_volume(&self) -> i32 {
        self.total_volume
    }

    /// Returns the order currently held here.
    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn is_occupied(&self) -> bool {
        self.order_id.is_some()
    }

    /// Returns true if the place is free and large enough for `volume`.
    pub fn can_store(&self, volume: i32) -> bool {
        !self.is_occupied() && volume <= self.total_volume
    }

    pub(crate) fn store(
        &mut self,
        order_id: OrderId,
        volume: i32,
    ) -> Result<(), StoragePlaceError> {
        if let Some(current) = self.order_id {
            return Err(StoragePlaceError::Occupied { order_id: current });
        }

        if volume > self.total_volume {
            return Err(StoragePlaceError::VolumeExceeded {
                volume,
                capacity: self.total_volume,
            });
        }

        self.order_id = Some(order_id);
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.order_id = None;
    }
}
