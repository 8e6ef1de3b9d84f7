use async_trait::async_trait;
use common::{CourierId, OrderId};
use domain::{Location, Order, OrderStatus};
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use super::{SharedTx, outbox::upsert_messages};
use crate::{OrderRepository, OutboxMessage, Result, StoreError};

/// PostgreSQL order repository bound to a scope's transaction.
pub struct PostgresOrderRepository {
    tx: SharedTx,
}

impl PostgresOrderRepository {
    pub(crate) fn new(tx: SharedTx) -> Self {
        Self { tx }
    }

    async fn fetch(&self, filter: &str, status: Option<OrderStatus>) -> Result<Vec<Order>> {
        let mut guard = self.tx.lock().await?;
        let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;

        let sql = format!(
            "SELECT id, courier_id, location_x, location_y, volume, status FROM orders {filter}"
        );
        let mut query = sqlx::query(&sql);
        if let Some(status) = status {
            query = query.bind(status.as_str());
        }
        let rows = query.fetch_all(&mut **tx).await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;

        Ok(Order::restore(
            OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            row.try_get::<Option<Uuid>, _>("courier_id")?
                .map(CourierId::from_uuid),
            Location::restore(row.try_get("location_x")?, row.try_get("location_y")?),
            row.try_get("volume")?,
            status,
        ))
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let mut guard = self.tx.lock().await?;
        let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;

        let row = sqlx::query(
            r#"
            SELECT id, courier_id, location_x, location_y, volume, status
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn get_first_in_created_status(&self) -> Result<Option<Order>> {
        let orders = self
            .fetch(
                "WHERE status = $1 ORDER BY id LIMIT 1",
                Some(OrderStatus::Created),
            )
            .await?;
        Ok(orders.into_iter().next())
    }

    async fn get_all_in_assigned_status(&self) -> Result<Vec<Order>> {
        self.fetch("WHERE status = $1 ORDER BY id", Some(OrderStatus::Assigned))
            .await
    }

    async fn get_all_incomplete(&self) -> Result<Vec<Order>> {
        self.fetch(
            "WHERE status <> $1 ORDER BY id",
            Some(OrderStatus::Completed),
        )
        .await
    }

    async fn save(&self, orders: &mut [&mut Order]) -> Result<()> {
        let messages = orders
            .iter()
            .flat_map(|order| order.events())
            .map(OutboxMessage::from_event)
            .collect::<Result<Vec<_>>>()?;

        let mut guard = self.tx.lock().await?;
        let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;

        for order in orders.iter() {
            sqlx::query(
                r#"
                INSERT INTO orders (id, courier_id, location_x, location_y, volume, status)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (id) DO UPDATE SET
                    courier_id = EXCLUDED.courier_id,
                    location_x = EXCLUDED.location_x,
                    location_y = EXCLUDED.location_y,
                    volume = EXCLUDED.volume,
                    status = EXCLUDED.status
                "#,
            )
            .bind(order.id().as_uuid())
            .bind(order.courier_id().map(|id| id.as_uuid()))
            .bind(order.location().x())
            .bind(order.location().y())
            .bind(order.volume())
            .bind(order.status().as_str())
            .execute(&mut **tx)
            .await?;
        }

        upsert_messages(tx, &messages).await?;

        for order in orders.iter_mut() {
            order.take_events();
        }
        Ok(())
    }
}
