//! Delivery process wiring.
//!
//! Builds the use-cases and the outbox flusher on top of a unit of work,
//! drives them with periodic jobs, and serves `/health` and `/metrics`.

pub mod config;
pub mod error;
pub mod jobs;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;

use application::{DeliveryService, GeoResolver, NotificationProducer, OrderEventsHandler};
use axum::Router;
use axum::routing::get;
use domain::OrderEvent;
use metrics_exporter_prometheus::PrometheusHandle;
use outbox::{EventRegistry, Mediator, OutboxFlusher};
use store::UnitOfWork;
use tower_http::trace::TraceLayer;

use config::Config;
use jobs::{ASSIGN_ORDERS_JOB, MOVE_COURIERS_JOB, OUTBOX_JOB, Scheduler};

/// Everything the periodic jobs need, built once at start-up.
#[derive(Clone)]
pub struct Components {
    pub delivery: DeliveryService,
    pub flusher: OutboxFlusher<OrderEvent>,
}

/// Wires use-cases and outbox delivery to the given collaborators.
pub fn wire(
    uow: Arc<dyn UnitOfWork>,
    geo: Arc<dyn GeoResolver>,
    producer: Arc<dyn NotificationProducer>,
) -> Components {
    let mut mediator = Mediator::<OrderEvent>::new();
    mediator.subscribe_all(Arc::new(OrderEventsHandler::new(producer)));

    let flusher = OutboxFlusher::new(
        uow.clone(),
        Arc::new(EventRegistry::order_events()),
        Arc::new(mediator),
    );

    Components {
        delivery: DeliveryService::new(uow, geo),
        flusher,
    }
}

/// Starts the assign, move and outbox jobs on their configured intervals.
pub fn start_jobs(config: &Config, components: &Components) -> Scheduler {
    let mut scheduler = Scheduler::new();

    let delivery = components.delivery.clone();
    scheduler.spawn(ASSIGN_ORDERS_JOB, config.assign_interval, move || {
        let delivery = delivery.clone();
        async move { delivery.assign_order().await }
    });

    let delivery = components.delivery.clone();
    scheduler.spawn(MOVE_COURIERS_JOB, config.move_interval, move || {
        let delivery = delivery.clone();
        async move { delivery.move_couriers().await }
    });

    let flusher = components.flusher.clone();
    scheduler.spawn(OUTBOX_JOB, config.outbox_interval, move || {
        let flusher = flusher.clone();
        async move { flusher.flush().await }
    });

    scheduler
}

/// Creates the Axum router serving health and metrics.
pub fn create_app(metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .merge(metrics_router)
        .layer(TraceLayer::new_for_http())
}
