//! Courier aggregate implementation.

use common::CourierId;

use crate::kernel::Location;
use crate::order::{Order, OrderStatus};

use super::{CourierError, StoragePlace};

/// Courier aggregate root.
///
/// A courier owns its storage places exclusively. They are only reachable by
/// shared reference from outside; every mutation goes through the methods
/// below so the "one order per place" and capacity rules always hold.
#[derive(Debug, Clone, PartialEq)]
pub struct Courier {
    id: CourierId,
    name: String,
    speed: i32,
    location: Location,
    storage_places: Vec<StoragePlace>,
}

impl Courier {
    /// Name of the storage place every courier starts with.
    pub const DEFAULT_STORAGE_NAME: &'static str = "Bag";

    /// Capacity of the default storage place.
    pub const DEFAULT_STORAGE_VOLUME: i32 = 10;

    /// Creates a courier with a single default "Bag" storage place.
    pub fn new(
        name: impl Into<String>,
        speed: i32,
        location: Location,
    ) -> Result<Self, CourierError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CourierError::EmptyName);
        }

        if speed <= 0 {
            return Err(CourierError::InvalidSpeed { speed });
        }

        let bag = StoragePlace::new(Self::DEFAULT_STORAGE_NAME, Self::DEFAULT_STORAGE_VOLUME)?;

        Ok(Self {
            id: CourierId::new(),
            name,
            speed,
            location,
            storage_places: vec![bag],
        })
    }

    /// Rebuilds a courier from persisted state.
    pub fn restore(
        id: CourierId,
        name: String,
        speed: i32,
        location: Location,
        storage_places: Vec<StoragePlace>,
    ) -> Self {
        Self {
            id,
            name,
            speed,
            location,
            storage_places,
        }
    }
}

// Query methods
impl Courier {
    pub fn id(&self) -> CourierId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Returns storage places in declaration order.
    pub fn storage_places(&self) -> &[StoragePlace] {
        &self.storage_places
    }

    /// Returns true if no storage place holds an order.
    pub fn is_free(&self) -> bool {
        self.storage_places.iter().all(|place| !place.is_occupied())
    }

    /// Checks whether this courier could take the order right now.
    ///
    /// Fails if the order is no longer waiting for a courier. Otherwise
    /// returns whether some free storage place is large enough.
    pub fn can_take_order(&self, order: &Order) -> Result<bool, CourierError> {
        match order.status() {
            OrderStatus::Created => {}
            status => return Err(CourierError::OrderNotAvailable { status }),
        }

        Ok(self
            .storage_places
            .iter()
            .any(|place| place.can_store(order.volume())))
    }

    /// Estimated time to reach `target`: distance over speed, rounded to
    /// three decimals.
    pub fn calculate_time_to_location(&self, target: Location) -> f64 {
        let distance = f64::from(self.location.distance_to(target));
        let time = distance / f64::from(self.speed);
        (time * 1000.0).round() / 1000.0
    }
}

// Command methods
impl Courier {
    /// Appends a new empty storage place.
    pub fn add_storage_place(
        &mut self,
        name: impl Into<String>,
        volume: i32,
    ) -> Result<(), CourierError> {
        let place = StoragePlace::new(name, volume)?;
        self.storage_places.push(place);
        Ok(())
    }

    /// Takes the order into the first free storage place that fits.
    ///
    /// Assigns this courier to the order as part of the same step.
    pub fn take_order(&mut self, order: &mut Order) -> Result<(), CourierError> {
        if !self.can_take_order(order)? {
            return Err(CourierError::NoSuitableStoragePlace {
                volume: order.volume(),
            });
        }

        let index = self
            .storage_places
            .iter()
            .position(|place| place.can_store(order.volume()))
            .ok_or(CourierError::NoSuitableStoragePlace {
                volume: order.volume(),
            })?;

        order.assign_courier(self.id)?;
        self.storage_places[index].store(order.id(), order.volume())?;
        Ok(())
    }

    /// Completes a carried order and frees its storage place.
    pub fn complete_order(&mut self, order: &mut Order) -> Result<(), CourierError> {
        let place = self
            .storage_places
            .iter_mut()
            .find(|place| place.order_id() == Some(order.id()))
            .ok_or(CourierError::NonOwnedOrder {
                order_id: order.id(),
            })?;

        order.complete()?;
        place.clear();
        Ok(())
    }

    /// Moves one step towards `target`.
    ///
    /// The step covers at most `speed` cells, spent on the X axis first and
    /// whatever remains on the Y axis.
    pub fn move_towards(&mut self, target: Location) -> Result<(), CourierError> {
        if self.location == target {
            return Err(CourierError::AlreadyAtTarget);
        }

        let mut budget = self.speed;

        let dx = clamp_step(target.x() - self.location.x(), budget);
        budget -= dx.abs();
        let dy = clamp_step(target.y() - self.location.y(), budget);

        self.location = Location::new(self.location.x() + dx, self.location.y() + dy)?;
        Ok(())
    }
}

/// Limits `delta` to `budget` cells, keeping its sign.
fn clamp_step(delta: i32, budget: i32) -> i32 {
    delta.clamp(-budget, budget)
}
