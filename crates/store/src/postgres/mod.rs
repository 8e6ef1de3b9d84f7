//! PostgreSQL-backed unit of work and repositories.

mod couriers;
mod orders;
mod outbox;
mod uow;

use std::sync::Arc;

use sqlx::{Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::{Result, StoreError};

pub use couriers::PostgresCourierRepository;
pub use orders::PostgresOrderRepository;
pub use outbox::PostgresOutboxRepository;
pub use uow::{PostgresScope, PostgresUnitOfWork};

type Tx = Transaction<'static, Postgres>;

fn savepoint_name(depth: u32) -> String {
    format!("uow_sp_{depth}")
}

/// Transaction shared by a top-level scope, its nested scopes and their
/// repositories.
///
/// Nested scopes dropped without commit or rollback register their depth as
/// abandoned; the next statement on the transaction first rolls those
/// savepoints back.
#[derive(Clone)]
pub(crate) struct SharedTx {
    inner: Arc<TxState>,
}

struct TxState {
    /// `None` once the top-level scope has finished.
    tx: Mutex<Option<Tx>>,
    abandoned: std::sync::Mutex<Vec<u32>>,
}

impl SharedTx {
    fn new(tx: Tx) -> Self {
        Self {
            inner: Arc::new(TxState {
                tx: Mutex::new(Some(tx)),
                abandoned: std::sync::Mutex::new(Vec::new()),
            }),
        }
    }

    /// Locks the transaction after undoing the work of abandoned nested
    /// scopes.
    pub(crate) async fn lock(&self) -> Result<MutexGuard<'_, Option<Tx>>> {
        let mut guard = self.inner.tx.lock().await;

        let abandoned = self
            .inner
            .abandoned
            .lock()
            .map(|mut depths| std::mem::take(&mut *depths))
            .unwrap_or_default();

        // Rolling back to the outermost abandoned savepoint also discards
        // every savepoint opened after it.
        if let Some(depth) = abandoned.into_iter().min() {
            let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
            let savepoint = savepoint_name(depth);
            sqlx::query(&format!("ROLLBACK TO SAVEPOINT {savepoint}"))
                .execute(&mut **tx)
                .await?;
            sqlx::query(&format!("RELEASE SAVEPOINT {savepoint}"))
                .execute(&mut **tx)
                .await?;
            debug!(depth, "Abandoned savepoint rolled back");
        }

        Ok(guard)
    }

    /// Takes the transaction out without settling abandoned savepoints.
    async fn take(&self) -> Result<Tx> {
        self.inner
            .tx
            .lock()
            .await
            .take()
            .ok_or(StoreError::TransactionClosed)
    }

    fn abandon(&self, depth: u32) {
        if let Ok(mut depths) = self.inner.abandoned.lock() {
            depths.push(depth);
        }
    }
}
