//! Delivery service: the use-cases of the delivery system.

use std::sync::Arc;

use common::{CourierId, OrderId};
use domain::{Courier, Location, Order, OrderDispatcher, OrderError};
use store::{UnitOfWork, UnitOfWorkExt};
use tracing::{debug, info};

use crate::commands::{AddStoragePlace, CreateCourier, CreateOrder};
use crate::error::{ApplicationError, Result};
use crate::ports::GeoResolver;

/// Outcome of a successful assignment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub order_id: OrderId,
    pub courier_id: CourierId,
}

/// Counts from one movement run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveReport {
    /// Couriers that took a step.
    pub moved: usize,

    /// Orders delivered during the run.
    pub completed: usize,
}

/// Runs delivery use-cases against a unit of work.
///
/// Every call runs in its own top-level scope: it either commits all of its
/// changes (outbox rows included) or none of them.
#[derive(Clone)]
pub struct DeliveryService {
    uow: Arc<dyn UnitOfWork>,
    geo: Arc<dyn GeoResolver>,
    dispatcher: OrderDispatcher,
}

impl DeliveryService {
    pub fn new(uow: Arc<dyn UnitOfWork>, geo: Arc<dyn GeoResolver>) -> Self {
        Self {
            uow,
            geo,
            dispatcher: OrderDispatcher::new(),
        }
    }

    /// Registers a courier at a random location.
    #[tracing::instrument(skip(self))]
    pub async fn create_courier(&self, cmd: CreateCourier) -> Result<CourierId> {
        let courier = Courier::new(cmd.name(), cmd.speed(), Location::random())?;
        let courier_id = courier.id();

        self.uow
            .run(move |scope| {
                Box::pin(async move {
                    scope.couriers().save(&[&courier]).await?;
                    Ok::<_, ApplicationError>(())
                })
            })
            .await?;

        info!(%courier_id, "Courier created");
        Ok(courier_id)
    }

    /// Adds a storage place to an existing courier.
    #[tracing::instrument(skip(self))]
    pub async fn add_storage_place(&self, cmd: AddStoragePlace) -> Result<()> {
        self.uow
            .run(move |scope| {
                Box::pin(async move {
                    let courier_id = cmd.courier_id();
                    let mut courier = scope
                        .couriers()
                        .get(courier_id)
                        .await?
                        .ok_or(ApplicationError::CourierNotFound(courier_id))?;

                    courier.add_storage_place(cmd.name(), cmd.volume())?;
                    scope.couriers().save(&[&courier]).await?;
                    Ok::<_, ApplicationError>(())
                })
            })
            .await
    }

    /// Accepts a new order at the location its street resolves to.
    ///
    /// The street is resolved before the transaction opens.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<()> {
        let location = self.geo.resolve(cmd.street()).await?;
        let order_id = cmd.order_id();
        let volume = cmd.volume();

        self.uow
            .run(move |scope| {
                Box::pin(async move {
                    if scope.orders().get(order_id).await?.is_some() {
                        return Err(ApplicationError::OrderAlreadyExists(order_id));
                    }

                    let mut order = Order::new(order_id, location, volume)?;
                    scope.orders().save(&mut [&mut order]).await?;
                    Ok::<_, ApplicationError>(())
                })
            })
            .await?;

        info!(%order_id, %location, "Order created");
        Ok(())
    }

    /// Assigns the next waiting order to the fastest free courier.
    ///
    /// Returns `Ok(None)` when there is no free courier or no waiting order.
    #[tracing::instrument(skip(self))]
    pub async fn assign_order(&self) -> Result<Option<Assignment>> {
        let dispatcher = self.dispatcher;

        let assignment = self
            .uow
            .run(move |scope| {
                Box::pin(async move {
                    let mut couriers = scope.couriers().get_all_free().await?;
                    if couriers.is_empty() {
                        debug!("No free couriers");
                        return Ok(None);
                    }

                    let Some(mut order) = scope.orders().get_first_in_created_status().await?
                    else {
                        debug!("No orders waiting for a courier");
                        return Ok(None);
                    };

                    let courier = dispatcher.dispatch(&mut order, &mut couriers)?;
                    let assignment = Assignment {
                        order_id: order.id(),
                        courier_id: courier.id(),
                    };

                    scope.couriers().save(&[courier]).await?;
                    scope.orders().save(&mut [&mut order]).await?;
                    Ok::<_, ApplicationError>(Some(assignment))
                })
            })
            .await?;

        if let Some(assignment) = assignment {
            metrics::counter!("orders_assigned_total").increment(1);
            info!(
                order_id = %assignment.order_id,
                courier_id = %assignment.courier_id,
                "Order assigned"
            );
        }

        Ok(assignment)
    }

    /// Moves every busy courier one step towards its order and completes
    /// the orders whose courier has arrived.
    #[tracing::instrument(skip(self))]
    pub async fn move_couriers(&self) -> Result<MoveReport> {
        let report = self
            .uow
            .run(move |scope| {
                Box::pin(async move {
                    let mut report = MoveReport::default();
                    let mut orders = scope.orders().get_all_in_assigned_status().await?;

                    for order in orders.iter_mut() {
                        let courier_id = order.courier_id().ok_or(OrderError::EmptyCourierId)?;
                        let mut courier = scope
                            .couriers()
                            .get(courier_id)
                            .await?
                            .ok_or(ApplicationError::CourierNotFound(courier_id))?;

                        if courier.location() != order.location() {
                            courier.move_towards(order.location())?;
                            report.moved += 1;
                        }

                        if courier.location() == order.location() {
                            courier.complete_order(order)?;
                            report.completed += 1;
                            debug!(order_id = %order.id(), %courier_id, "Order delivered");
                        }

                        scope.couriers().save(&[&courier]).await?;
                        scope.orders().save(&mut [&mut *order]).await?;
                    }

                    Ok::<_, ApplicationError>(report)
                })
            })
            .await?;

        metrics::counter!("couriers_moved_total").increment(report.moved as u64);
        metrics::counter!("orders_completed_total").increment(report.completed as u64);
        if report.completed > 0 {
            info!(completed = report.completed, "Orders completed");
        }

        Ok(report)
    }

    /// Returns every courier, ordered by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_couriers(&self) -> Result<Vec<Courier>> {
        self.uow
            .run(|scope| {
                Box::pin(async move {
                    let couriers = scope.couriers().get_all().await?;
                    Ok::<_, ApplicationError>(couriers)
                })
            })
            .await
    }

    /// Returns the orders that are not delivered yet, ordered by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_incomplete_orders(&self) -> Result<Vec<Order>> {
        self.uow
            .run(|scope| {
                Box::pin(async move {
                    let orders = scope.orders().get_all_incomplete().await?;
                    Ok::<_, ApplicationError>(orders)
                })
            })
            .await
    }
}
