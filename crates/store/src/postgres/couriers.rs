use async_trait::async_trait;
use common::{CourierId, OrderId, StoragePlaceId};
use domain::{Courier, Location, StoragePlace};
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use super::SharedTx;
use crate::{CourierRepository, Result, StoreError};

const SELECT_COURIERS: &str = r#"
    SELECT c.id, c.name, c.speed, c.location_x, c.location_y,
           sp.id AS sp_id, sp.name AS sp_name, sp.volume AS sp_volume, sp.order_id AS sp_order_id
    FROM couriers c
    INNER JOIN storage_places sp ON sp.courier_id = c.id
"#;

/// PostgreSQL courier repository bound to a scope's transaction.
pub struct PostgresCourierRepository {
    tx: SharedTx,
}

impl PostgresCourierRepository {
    pub(crate) fn new(tx: SharedTx) -> Self {
        Self { tx }
    }

    async fn fetch(&self, sql: &str, id: Option<CourierId>) -> Result<Vec<Courier>> {
        let mut guard = self.tx.lock().await?;
        let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;

        let mut query = sqlx::query(sql);
        if let Some(id) = id {
            query = query.bind(id.as_uuid());
        }
        let rows = query.fetch_all(&mut **tx).await?;

        Self::rows_to_couriers(rows)
    }

    /// Groups joined rows (ordered by courier) into aggregates.
    fn rows_to_couriers(rows: Vec<PgRow>) -> Result<Vec<Courier>> {
        let mut couriers: Vec<(CourierId, String, i32, Location, Vec<StoragePlace>)> = Vec::new();

        for row in rows {
            let id = CourierId::from_uuid(row.try_get::<Uuid, _>("id")?);
            let place = StoragePlace::restore(
                StoragePlaceId::from_uuid(row.try_get::<Uuid, _>("sp_id")?),
                row.try_get("sp_name")?,
                row.try_get("sp_volume")?,
                row.try_get::<Option<Uuid>, _>("sp_order_id")?
                    .map(OrderId::from_uuid),
            );

            if let Some(current) = couriers.last_mut().filter(|c| c.0 == id) {
                current.4.push(place);
                continue;
            }

            couriers.push((
                id,
                row.try_get("name")?,
                row.try_get("speed")?,
                Location::restore(row.try_get("location_x")?, row.try_get("location_y")?),
                vec![place],
            ));
        }

        Ok(couriers
            .into_iter()
            .map(|(id, name, speed, location, places)| {
                Courier::restore(id, name, speed, location, places)
            })
            .collect())
    }
}

#[async_trait]
impl CourierRepository for PostgresCourierRepository {
    async fn get(&self, id: CourierId) -> Result<Option<Courier>> {
        let sql = format!("{SELECT_COURIERS} WHERE c.id = $1 ORDER BY sp.position");
        Ok(self.fetch(&sql, Some(id)).await?.into_iter().next())
    }

    async fn get_all_free(&self) -> Result<Vec<Courier>> {
        let sql = format!(
            r#"{SELECT_COURIERS}
            WHERE NOT EXISTS (
                SELECT 1 FROM storage_places busy
                WHERE busy.courier_id = c.id AND busy.order_id IS NOT NULL
            )
            ORDER BY c.id, sp.position"#
        );
        self.fetch(&sql, None).await
    }

    async fn get_all(&self) -> Result<Vec<Courier>> {
        let sql = format!("{SELECT_COURIERS} ORDER BY c.id, sp.position");
        self.fetch(&sql, None).await
    }

    async fn save(&self, couriers: &[&Courier]) -> Result<()> {
        let mut guard = self.tx.lock().await?;
        let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;

        for courier in couriers {
            sqlx::query(
                r#"
                INSERT INTO couriers (id, name, speed, location_x, location_y)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO UPDATE SET
                    name = EXCLUDED.name,
                    speed = EXCLUDED.speed,
                    location_x = EXCLUDED.location_x,
                    location_y = EXCLUDED.location_y
                "#,
            )
            .bind(courier.id().as_uuid())
            .bind(courier.name())
            .bind(courier.speed())
            .bind(courier.location().x())
            .bind(courier.location().y())
            .execute(&mut **tx)
            .await?;

            for (position, place) in courier.storage_places().iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO storage_places (id, name, volume, order_id, courier_id, position)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (id) DO UPDATE SET
                        name = EXCLUDED.name,
                        volume = EXCLUDED.volume,
                        order_id = EXCLUDED.order_id,
                        courier_id = EXCLUDED.courier_id,
                        position = EXCLUDED.position
                    "#,
                )
                .bind(place.id().as_uuid())
                .bind(place.name())
                .bind(place.total_volume())
                .bind(place.order_id().map(|id| id.as_uuid()))
                .bind(courier.id().as_uuid())
                .bind(position as i32)
                .execute(&mut **tx)
                .await?;
            }
        }

        Ok(())
    }
}
