//! Application layer for the delivery system.
//!
//! Use-cases run on top of the store's unit of work:
//! - creating couriers, storage places and orders from validated commands
//! - assigning the next waiting order to the fastest free courier
//! - moving couriers and completing delivered orders
//!
//! The geolocation resolver and the notification sink are ports with
//! in-process implementations; [`OrderEventsHandler`] connects the outbox
//! to the notification sink.

pub mod commands;
pub mod error;
pub mod event_handlers;
pub mod ports;
pub mod service;

pub use commands::{AddStoragePlace, CreateCourier, CreateOrder};
pub use error::{ApplicationError, Result};
pub use event_handlers::OrderEventsHandler;
pub use ports::{
    GeoResolver, InMemoryGeoResolver, InMemoryNotificationProducer, LoggingNotificationProducer,
    NotificationProducer, RandomGeoResolver,
};
pub use service::{Assignment, DeliveryService, MoveReport};
