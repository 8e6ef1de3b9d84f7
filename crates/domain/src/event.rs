//! Core domain event trait.

use chrono::{DateTime, Utc};
use common::EventId;

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable once raised and are named in past tense.
pub trait DomainEvent: Send + Sync + Clone + std::fmt::Debug {
    /// Returns the unique identifier of this event occurrence.
    fn event_id(&self) -> EventId;

    /// Returns the event type name.
    ///
    /// This is the discriminator stored alongside the payload in the outbox
    /// and used to pick a decoder when the event is read back.
    fn event_type(&self) -> &'static str;

    /// Returns when the event was raised.
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Serializes the event-specific payload.
    fn payload(&self) -> Result<serde_json::Value, serde_json::Error>;
}
