//! Outbound ports to collaborators outside the delivery core.

pub mod geo;
pub mod notifications;

pub use geo::{GeoResolver, InMemoryGeoResolver, RandomGeoResolver};
pub use notifications::{
    InMemoryNotificationProducer, LoggingNotificationProducer, NotificationProducer,
    order_status_message,
};
