//! Unit of work: atomic, nestable transactional scopes over the repositories.

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use tracing::warn;

use crate::{CourierRepository, OrderRepository, OutboxRepository, Result, StoreError};

/// Opens top-level transactional scopes.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Begins a new top-level transaction.
    async fn begin(&self) -> Result<Box<dyn UnitOfWorkScope>>;
}

/// An open transaction, either top-level or nested inside another scope.
///
/// Repositories handed out by a scope are built on first use and then
/// reused for the rest of the scope; all of them operate on the scope's
/// transaction. Dropping a scope without committing discards its work.
#[async_trait]
pub trait UnitOfWorkScope: Send + Sync {
    fn couriers(&self) -> &dyn CourierRepository;

    fn orders(&self) -> &dyn OrderRepository;

    fn outbox(&self) -> &dyn OutboxRepository;

    /// Nesting depth, 0 for a top-level scope.
    fn depth(&self) -> u32;

    /// Begins a nested scope on the same transaction.
    ///
    /// Rolling the nested scope back undoes only the work done through it.
    async fn begin_nested(&self) -> Result<Box<dyn UnitOfWorkScope>>;

    /// Commits the scope. For a nested scope this only folds its work into
    /// the enclosing one.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discards all work done through this scope.
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Runs `work` in a top-level scope, committing on `Ok` and rolling back on `Err`.
#[async_trait]
pub trait UnitOfWorkExt: UnitOfWork {
    async fn run<T, E, F>(&self, work: F) -> std::result::Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: for<'s> FnOnce(&'s dyn UnitOfWorkScope) -> BoxFuture<'s, std::result::Result<T, E>>
            + Send
            + 'static,
    {
        let scope = self.begin().await?;
        finish(scope, work).await
    }
}

impl<U: UnitOfWork + ?Sized> UnitOfWorkExt for U {}

/// Runs `work` in a scope nested inside this one.
#[async_trait]
pub trait UnitOfWorkScopeExt: UnitOfWorkScope {
    async fn run_nested<T, E, F>(&self, work: F) -> std::result::Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: for<'s> FnOnce(&'s dyn UnitOfWorkScope) -> BoxFuture<'s, std::result::Result<T, E>>
            + Send
            + 'static,
    {
        let scope = self.begin_nested().await?;
        finish(scope, work).await
    }
}

impl<S: UnitOfWorkScope + ?Sized> UnitOfWorkScopeExt for S {}

async fn finish<T, E, F>(scope: Box<dyn UnitOfWorkScope>, work: F) -> std::result::Result<T, E>
where
    E: From<StoreError>,
    F: for<'s> FnOnce(&'s dyn UnitOfWorkScope) -> BoxFuture<'s, std::result::Result<T, E>>,
{
    let outcome = work(scope.as_ref()).await;
    match outcome {
        Ok(value) => {
            scope.commit().await?;
            Ok(value)
        }
        Err(err) => {
            let depth = scope.depth();
            if let Err(rollback_err) = scope.rollback().await {
                warn!(depth, error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}
