use std::sync::OnceLock;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::{
    PostgresCourierRepository, PostgresOrderRepository, PostgresOutboxRepository, SharedTx,
    savepoint_name,
};
use crate::{
    CourierRepository, OrderRepository, OutboxRepository, Result, StoreError,
    uow::{UnitOfWork, UnitOfWorkScope},
};

/// PostgreSQL unit of work.
///
/// Every top-level scope holds one pooled connection inside a transaction.
/// Nested scopes are savepoints on that same transaction.
#[derive(Clone)]
pub struct PostgresUnitOfWork {
    pool: PgPool,
}

impl PostgresUnitOfWork {
    /// Creates a new PostgreSQL unit of work.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn begin(&self) -> Result<Box<dyn UnitOfWorkScope>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresScope::new(SharedTx::new(tx), 0)))
    }
}

/// A transaction scope of [`PostgresUnitOfWork`].
///
/// A top-level scope dropped unfinished rolls back with its transaction; a
/// nested one has its savepoint rolled back before the next statement.
pub struct PostgresScope {
    tx: SharedTx,
    depth: u32,
    finished: bool,
    couriers: OnceLock<PostgresCourierRepository>,
    orders: OnceLock<PostgresOrderRepository>,
    outbox: OnceLock<PostgresOutboxRepository>,
}

impl PostgresScope {
    fn new(tx: SharedTx, depth: u32) -> Self {
        Self {
            tx,
            depth,
            finished: false,
            couriers: OnceLock::new(),
            orders: OnceLock::new(),
            outbox: OnceLock::new(),
        }
    }

    fn savepoint(&self) -> String {
        savepoint_name(self.depth)
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        let mut guard = self.tx.lock().await?;
        let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
        sqlx::query(sql).execute(&mut **tx).await?;
        Ok(())
    }
}

#[async_trait]
impl UnitOfWorkScope for PostgresScope {
    fn couriers(&self) -> &dyn CourierRepository {
        self.couriers
            .get_or_init(|| PostgresCourierRepository::new(self.tx.clone()))
    }

    fn orders(&self) -> &dyn OrderRepository {
        self.orders
            .get_or_init(|| PostgresOrderRepository::new(self.tx.clone()))
    }

    fn outbox(&self) -> &dyn OutboxRepository {
        self.outbox
            .get_or_init(|| PostgresOutboxRepository::new(self.tx.clone()))
    }

    fn depth(&self) -> u32 {
        self.depth
    }

    async fn begin_nested(&self) -> Result<Box<dyn UnitOfWorkScope>> {
        let depth = self.depth + 1;
        self.execute(&format!("SAVEPOINT {}", savepoint_name(depth)))
            .await?;
        debug!(depth, "Savepoint created");
        Ok(Box::new(PostgresScope::new(self.tx.clone(), depth)))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut scope = self;
        if scope.depth > 0 {
            scope
                .execute(&format!("RELEASE SAVEPOINT {}", scope.savepoint()))
                .await?;
            scope.finished = true;
            return Ok(());
        }

        scope.finished = true;
        let tx = scope
            .tx
            .lock()
            .await?
            .take()
            .ok_or(StoreError::TransactionClosed)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let mut scope = self;
        if scope.depth > 0 {
            let savepoint = scope.savepoint();
            scope
                .execute(&format!("ROLLBACK TO SAVEPOINT {savepoint}"))
                .await?;
            scope
                .execute(&format!("RELEASE SAVEPOINT {savepoint}"))
                .await?;
            scope.finished = true;
            return Ok(());
        }

        scope.finished = true;
        scope.tx.take().await?.rollback().await?;
        Ok(())
    }
}

impl Drop for PostgresScope {
    fn drop(&mut self) {
        if self.depth > 0 && !self.finished {
            debug!(depth = self.depth, "Nested scope dropped unfinished");
            self.tx.abandon(self.depth);
        }
    }
}
