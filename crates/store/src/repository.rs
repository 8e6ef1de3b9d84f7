//! Repository contracts bound to a unit-of-work scope.
//!
//! Lookups return `Ok(None)` or an empty list when nothing matches; callers
//! decide whether that is a no-op or a failure.

use async_trait::async_trait;
use common::{CourierId, OrderId};
use domain::{Courier, Order};

use crate::{OutboxMessage, Result};

/// Maximum number of outbox messages returned by one
/// [`OutboxRepository::get_not_published_messages`] call.
pub const OUTBOX_PAGE_SIZE: usize = 100;

/// Persistence for courier aggregates, storage places included.
#[async_trait]
pub trait CourierRepository: Send + Sync {
    async fn get(&self, id: CourierId) -> Result<Option<Courier>>;

    /// Couriers with no occupied storage place, ordered by id.
    async fn get_all_free(&self) -> Result<Vec<Courier>>;

    /// All couriers, ordered by id.
    async fn get_all(&self) -> Result<Vec<Courier>>;

    /// Inserts or replaces each courier and its storage places.
    async fn save(&self, couriers: &[&Courier]) -> Result<()>;
}

/// Persistence for order aggregates.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Any one order still waiting for a courier.
    async fn get_first_in_created_status(&self) -> Result<Option<Order>>;

    /// Orders on their way, ordered by id.
    async fn get_all_in_assigned_status(&self) -> Result<Vec<Order>>;

    /// Orders that are not completed yet, ordered by id.
    async fn get_all_incomplete(&self) -> Result<Vec<Order>>;

    /// Inserts or replaces each order.
    ///
    /// Pending domain events are written to the outbox in the same scope and
    /// drained from the aggregates once everything is stored.
    async fn save(&self, orders: &mut [&mut Order]) -> Result<()>;
}

/// Persistence for outbox messages.
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Inserts new messages; for existing ids only `processed_at` is updated.
    async fn save(&self, messages: &[OutboxMessage]) -> Result<()>;

    /// Up to [`OUTBOX_PAGE_SIZE`] unpublished messages, oldest first.
    async fn get_not_published_messages(&self) -> Result<Vec<OutboxMessage>>;
}
