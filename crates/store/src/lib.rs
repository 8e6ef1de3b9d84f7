//! Persistence for the delivery system.
//!
//! Aggregates are loaded and saved through repositories obtained from a
//! [`UnitOfWorkScope`]; everything done through one scope commits or rolls
//! back together. Domain events raised by saved orders are written to the
//! transactional outbox in the same scope.

pub mod error;
pub mod memory;
pub mod outbox;
pub mod postgres;
pub mod repository;
pub mod uow;

pub use error::{Result, StoreError};
pub use memory::InMemoryUnitOfWork;
pub use outbox::OutboxMessage;
pub use postgres::PostgresUnitOfWork;
pub use repository::{CourierRepository, OUTBOX_PAGE_SIZE, OrderRepository, OutboxRepository};
pub use uow::{UnitOfWork, UnitOfWorkExt, UnitOfWorkScope, UnitOfWorkScopeExt};
