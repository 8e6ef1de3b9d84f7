//! Outbox delivery for domain events.
//!
//! Events are written to the outbox by the store in the same transaction as
//! the aggregate that raised them. This crate reads them back:
//! - [`EventRegistry`] decodes stored payloads by event type name
//! - [`Mediator`] hands decoded events to subscribed [`EventHandler`]s
//! - [`OutboxFlusher`] runs one delivery pass and marks what was published

pub mod error;
pub mod flush;
pub mod handler;
pub mod mediator;
pub mod registry;

pub use error::{OutboxError, Result};
pub use flush::{FlushReport, OutboxFlusher};
pub use handler::EventHandler;
pub use mediator::Mediator;
pub use registry::EventRegistry;
