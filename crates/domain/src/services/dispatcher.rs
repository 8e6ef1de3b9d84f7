//! Matches a waiting order to the fastest eligible courier.

use thiserror::Error;
use tracing::debug;

use crate::courier::{Courier, CourierError};
use crate::order::{Order, OrderStatus};

/// Errors returned by [`OrderDispatcher::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Only orders waiting for a courier can be dispatched.
    #[error("Order cannot be dispatched in {status} status")]
    OrderNotCreated { status: OrderStatus },

    /// No courier has room for the order.
    #[error("No matching courier for order")]
    NoMatchingCourier,

    #[error(transparent)]
    Courier(#[from] CourierError),
}

/// Stateless domain service that picks a courier for an order.
///
/// Every call handles exactly one order: couriers that cannot take it are
/// skipped, and the one with the smallest travel time wins. Ties go to the
/// courier that comes first, so callers pass couriers in a stable order
/// (repositories return them sorted by id).
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderDispatcher;

impl OrderDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Assigns `order` to the fastest eligible courier and returns that courier.
    pub fn dispatch<'a>(
        &self,
        order: &mut Order,
        couriers: &'a mut [Courier],
    ) -> Result<&'a Courier, DispatchError> {
        if order.status() != OrderStatus::Created {
            return Err(DispatchError::OrderNotCreated {
                status: order.status(),
            });
        }

        let mut fastest: Option<(usize, f64)> = None;
        for (index, courier) in couriers.iter().enumerate() {
            if !matches!(courier.can_take_order(order), Ok(true)) {
                continue;
            }

            let time = courier.calculate_time_to_location(order.location());
            if fastest.is_none_or(|(_, best)| time < best) {
                fastest = Some((index, time));
            }
        }

        let (index, time) = fastest.ok_or(DispatchError::NoMatchingCourier)?;
        let courier = &mut couriers[index];
        courier.take_order(order)?;

        debug!(
            order_id = %order.id(),
            courier_id = %courier.id(),
            time,
            "Order dispatched"
        );

        Ok(courier)
    }
}
