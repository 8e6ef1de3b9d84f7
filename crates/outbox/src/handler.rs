//! Event handler trait.

use async_trait::async_trait;

use crate::Result;

/// Receives decoded events from the [`Mediator`](crate::Mediator).
///
/// Delivery is at-least-once: the same event can arrive again after a crash
/// between publishing and marking the message processed, so handlers must
/// tolerate duplicates.
#[async_trait]
pub trait EventHandler<E>: Send + Sync {
    /// Returns the name of this handler, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Handles a single event.
    async fn handle(&self, event: &E) -> Result<()>;
}
