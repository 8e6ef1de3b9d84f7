//! Outbox error types.

use thiserror::Error;

/// Errors that can occur while decoding or delivering outbox messages.
#[derive(Debug, Error)]
pub enum OutboxError {
    /// No decoder is registered for the message's type name.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    /// The payload did not match the registered event type.
    #[error("Failed to decode {event_type} payload: {source}")]
    Decode {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// A handler failed to process an event.
    #[error("Handler {handler} failed: {message}")]
    Handler {
        handler: &'static str,
        message: String,
    },

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),
}

/// Result type for outbox operations.
pub type Result<T> = std::result::Result<T, OutboxError>;
