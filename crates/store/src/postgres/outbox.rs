use async_trait::async_trait;
use common::EventId;
use sqlx::{PgConnection, Row, postgres::PgRow};
use uuid::Uuid;

use super::SharedTx;
use crate::{OutboxMessage, OutboxRepository, Result, StoreError, repository::OUTBOX_PAGE_SIZE};

/// PostgreSQL outbox repository bound to a scope's transaction.
pub struct PostgresOutboxRepository {
    tx: SharedTx,
}

impl PostgresOutboxRepository {
    pub(crate) fn new(tx: SharedTx) -> Self {
        Self { tx }
    }

    fn row_to_message(row: PgRow) -> Result<OutboxMessage> {
        Ok(OutboxMessage {
            id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_type: row.try_get("type")?,
            payload: row.try_get("content")?,
            occurred_at: row.try_get("occurred")?,
            processed_at: row.try_get("processed")?,
        })
    }
}

/// Upserts messages on an open connection. Existing rows only take the new
/// processed timestamp.
pub(crate) async fn upsert_messages(
    conn: &mut PgConnection,
    messages: &[OutboxMessage],
) -> Result<()> {
    for message in messages {
        sqlx::query(
            r#"
            INSERT INTO outbox (id, type, content, occurred, processed)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET processed = EXCLUDED.processed
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(&message.event_type)
        .bind(&message.payload)
        .bind(message.occurred_at)
        .bind(message.processed_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

#[async_trait]
impl OutboxRepository for PostgresOutboxRepository {
    async fn save(&self, messages: &[OutboxMessage]) -> Result<()> {
        let mut guard = self.tx.lock().await?;
        let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
        upsert_messages(tx, messages).await
    }

    async fn get_not_published_messages(&self) -> Result<Vec<OutboxMessage>> {
        let mut guard = self.tx.lock().await?;
        let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;

        let rows = sqlx::query(
            r#"
            SELECT id, type, content, occurred, processed
            FROM outbox
            WHERE processed IS NULL
            ORDER BY occurred ASC
            LIMIT $1
            "#,
        )
        .bind(OUTBOX_PAGE_SIZE as i64)
        .fetch_all(&mut **tx)
        .await?;

        rows.into_iter().map(Self::row_to_message).collect()
    }
}
