//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency and truncate
//! the tables before each test, so they run serially.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::OrderId;
use domain::{Courier, Location, Order, OrderStatus};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    OUTBOX_PAGE_SIZE, OutboxMessage, PostgresUnitOfWork, StoreError, UnitOfWork, UnitOfWorkExt,
    UnitOfWorkScopeExt,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresUnitOfWork::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh unit of work with its own pool and cleared tables
async fn get_test_uow() -> PostgresUnitOfWork {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE storage_places, couriers, orders, outbox")
        .execute(&pool)
        .await
        .unwrap();

    PostgresUnitOfWork::new(pool)
}

async fn count(uow: &PostgresUnitOfWork, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(uow.pool())
        .await
        .unwrap()
}

fn loc(x: i32, y: i32) -> Location {
    Location::new(x, y).unwrap()
}

mod unit_of_work {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn commit_persists_courier_with_storage_places() {
        let uow = get_test_uow().await;
        let mut courier = Courier::new("Alice", 2, loc(3, 4)).unwrap();
        courier.add_storage_place("Trunk", 25).unwrap();
        let expected = courier.clone();

        uow.run(move |scope| {
            Box::pin(async move {
                scope.couriers().save(&[&courier]).await?;
                Ok::<_, StoreError>(())
            })
        })
        .await
        .unwrap();

        let scope = uow.begin().await.unwrap();
        let loaded = scope.couriers().get(expected.id()).await.unwrap().unwrap();
        scope.commit().await.unwrap();

        assert_eq!(loaded, expected);
        assert_eq!(loaded.storage_places()[0].name(), "Bag");
        assert_eq!(loaded.storage_places()[1].name(), "Trunk");
    }

    #[tokio::test]
    #[serial]
    async fn failed_work_leaves_no_rows() {
        let uow = get_test_uow().await;
        let courier = Courier::new("Alice", 1, loc(1, 1)).unwrap();
        let mut order = Order::new(OrderId::new(), loc(5, 5), 3).unwrap();

        let result = uow
            .run(move |scope| {
                Box::pin(async move {
                    scope.couriers().save(&[&courier]).await?;
                    scope.orders().save(&mut [&mut order]).await?;
                    Err::<(), _>(StoreError::InvalidData("abort".into()))
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(count(&uow, "couriers").await, 0);
        assert_eq!(count(&uow, "storage_places").await, 0);
        assert_eq!(count(&uow, "orders").await, 0);
        assert_eq!(count(&uow, "outbox").await, 0);
    }

    #[tokio::test]
    #[serial]
    async fn nested_rollback_keeps_outer_work() {
        let uow = get_test_uow().await;
        let outer = Courier::new("Outer", 1, loc(1, 1)).unwrap();
        let inner = Courier::new("Inner", 1, loc(2, 2)).unwrap();
        let (outer_id, inner_id) = (outer.id(), inner.id());

        uow.run(move |scope| {
            Box::pin(async move {
                scope.couriers().save(&[&outer]).await?;

                let nested = scope
                    .run_nested(move |nested| {
                        Box::pin(async move {
                            nested.couriers().save(&[&inner]).await?;
                            Err::<(), _>(StoreError::InvalidData("nested".into()))
                        })
                    })
                    .await;
                assert!(nested.is_err());

                assert!(scope.couriers().get(inner_id).await?.is_none());
                Ok::<_, StoreError>(())
            })
        })
        .await
        .unwrap();

        let scope = uow.begin().await.unwrap();
        assert!(scope.couriers().get(outer_id).await.unwrap().is_some());
        assert!(scope.couriers().get(inner_id).await.unwrap().is_none());
        scope.rollback().await.unwrap();
    }

    #[tokio::test]
    #[serial]
    async fn nested_commit_releases_savepoint_only() {
        let uow = get_test_uow().await;
        let inner = Courier::new("Inner", 1, loc(2, 2)).unwrap();

        let result = uow
            .run(move |scope| {
                Box::pin(async move {
                    scope
                        .run_nested(move |nested| {
                            Box::pin(async move {
                                nested.couriers().save(&[&inner]).await?;
                                Ok::<_, StoreError>(())
                            })
                        })
                        .await?;
                    Err::<(), _>(StoreError::InvalidData("outer".into()))
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(count(&uow, "couriers").await, 0);
    }

    #[tokio::test]
    #[serial]
    async fn finished_scope_rejects_further_use() {
        let uow = get_test_uow().await;
        let scope = uow.begin().await.unwrap();
        let nested = scope.begin_nested().await.unwrap();
        scope.commit().await.unwrap();

        let result = nested.couriers().get_all().await;
        assert!(matches!(result, Err(StoreError::TransactionClosed)));
    }

    #[tokio::test]
    #[serial]
    async fn dropped_nested_scope_is_rolled_back() {
        let uow = get_test_uow().await;
        let outer = Courier::new("Outer", 1, loc(1, 1)).unwrap();
        let inner = Courier::new("Inner", 1, loc(2, 2)).unwrap();

        let scope = uow.begin().await.unwrap();
        scope.couriers().save(&[&outer]).await.unwrap();

        let nested = scope.begin_nested().await.unwrap();
        nested.couriers().save(&[&inner]).await.unwrap();
        drop(nested);

        assert!(scope.couriers().get(inner.id()).await.unwrap().is_none());
        scope.commit().await.unwrap();

        assert_eq!(count(&uow, "couriers").await, 1);
        let scope = uow.begin().await.unwrap();
        assert!(scope.couriers().get(outer.id()).await.unwrap().is_some());
        scope.rollback().await.unwrap();
    }

    #[tokio::test]
    #[serial]
    async fn cancelled_nested_work_is_not_committed() {
        let uow = get_test_uow().await;
        let outer = Courier::new("Outer", 1, loc(1, 1)).unwrap();
        let inner = Courier::new("Inner", 1, loc(2, 2)).unwrap();
        let (outer_id, inner_id) = (outer.id(), inner.id());

        uow.run(move |scope| {
            Box::pin(async move {
                scope.couriers().save(&[&outer]).await?;

                let nested = scope.run_nested(move |nested| {
                    Box::pin(async move {
                        nested.couriers().save(&[&inner]).await?;
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        Ok::<_, StoreError>(())
                    })
                });
                let timed_out = tokio::time::timeout(Duration::from_millis(200), nested).await;
                assert!(timed_out.is_err());

                Ok::<_, StoreError>(())
            })
        })
        .await
        .unwrap();

        let scope = uow.begin().await.unwrap();
        assert!(scope.couriers().get(outer_id).await.unwrap().is_some());
        assert!(scope.couriers().get(inner_id).await.unwrap().is_none());
        scope.rollback().await.unwrap();
    }

    #[tokio::test]
    #[serial]
    async fn dropped_scope_leaves_no_rows() {
        let uow = get_test_uow().await;
        let courier = Courier::new("Alice", 1, loc(1, 1)).unwrap();

        let scope = uow.begin().await.unwrap();
        scope.couriers().save(&[&courier]).await.unwrap();
        drop(scope);

        assert_eq!(count(&uow, "couriers").await, 0);
    }
}

mod repositories {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn get_all_free_excludes_busy_couriers() {
        let uow = get_test_uow().await;
        let free = Courier::new("Free", 1, loc(1, 1)).unwrap();
        let mut busy = Courier::new("Busy", 1, loc(2, 2)).unwrap();
        busy.add_storage_place("Trunk", 20).unwrap();
        let mut order = Order::new(OrderId::new(), loc(9, 9), 15).unwrap();
        busy.take_order(&mut order).unwrap();
        let free_id = free.id();

        let scope = uow.begin().await.unwrap();
        scope.couriers().save(&[&free, &busy]).await.unwrap();

        let couriers = scope.couriers().get_all_free().await.unwrap();
        assert_eq!(couriers.len(), 1);
        assert_eq!(couriers[0].id(), free_id);

        let all = scope.couriers().get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.windows(2).all(|w| w[0].id() < w[1].id()));
        scope.commit().await.unwrap();
    }

    #[tokio::test]
    #[serial]
    async fn order_queries_by_status() {
        let uow = get_test_uow().await;
        let mut courier = Courier::new("Alice", 1, loc(1, 1)).unwrap();
        let mut created = Order::new(OrderId::new(), loc(4, 4), 1).unwrap();
        let mut assigned = Order::new(OrderId::new(), loc(6, 6), 1).unwrap();
        courier.take_order(&mut assigned).unwrap();

        let scope = uow.begin().await.unwrap();
        scope
            .orders()
            .save(&mut [&mut created, &mut assigned])
            .await
            .unwrap();

        let first = scope.orders().get_first_in_created_status().await.unwrap();
        assert_eq!(first.map(|o| o.id()), Some(created.id()));

        let in_flight = scope.orders().get_all_in_assigned_status().await.unwrap();
        assert_eq!(in_flight.len(), 1);
        assert_eq!(in_flight[0].status(), OrderStatus::Assigned);
        assert_eq!(in_flight[0].courier_id(), Some(courier.id()));

        assert_eq!(scope.orders().get_all_incomplete().await.unwrap().len(), 2);
        assert!(scope.orders().get(OrderId::new()).await.unwrap().is_none());
        scope.commit().await.unwrap();
    }
}

mod outbox {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn saving_order_writes_outbox_row_once() {
        let uow = get_test_uow().await;
        let mut order = Order::new(OrderId::new(), loc(5, 5), 2).unwrap();

        let scope = uow.begin().await.unwrap();
        scope.orders().save(&mut [&mut order]).await.unwrap();
        assert!(order.events().is_empty());
        scope.orders().save(&mut [&mut order]).await.unwrap();
        scope.commit().await.unwrap();

        assert_eq!(count(&uow, "outbox").await, 1);

        let scope = uow.begin().await.unwrap();
        let pending = scope.outbox().get_not_published_messages().await.unwrap();
        scope.commit().await.unwrap();

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].event_type, "OrderCreated");
        assert_eq!(pending[0].payload["order_id"], serde_json::json!(order.id()));
    }

    #[tokio::test]
    #[serial]
    async fn processed_messages_are_not_returned_again() {
        let uow = get_test_uow().await;
        let mut first = Order::new(OrderId::new(), loc(1, 2), 1).unwrap();
        let mut second = Order::new(OrderId::new(), loc(3, 4), 1).unwrap();

        let scope = uow.begin().await.unwrap();
        scope
            .orders()
            .save(&mut [&mut first, &mut second])
            .await
            .unwrap();

        let mut pending = scope.outbox().get_not_published_messages().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending[0].occurred_at <= pending[1].occurred_at);

        pending[0].mark_processed(Utc::now());
        scope.outbox().save(&pending[..1]).await.unwrap();

        let remaining = scope.outbox().get_not_published_messages().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, pending[1].id);
        scope.commit().await.unwrap();
    }

    #[tokio::test]
    #[serial]
    async fn pending_messages_are_paged() {
        let uow = get_test_uow().await;
        let orders: Vec<Order> = (0..OUTBOX_PAGE_SIZE + 5)
            .map(|_| Order::new(OrderId::new(), loc(2, 2), 1).unwrap())
            .collect();
        let messages: Vec<OutboxMessage> = orders
            .iter()
            .flat_map(|o| o.events())
            .map(|e| OutboxMessage::from_event(e).unwrap())
            .collect();
        assert_eq!(messages.len(), OUTBOX_PAGE_SIZE + 5);

        let scope = uow.begin().await.unwrap();
        scope.outbox().save(&messages).await.unwrap();
        let page = scope.outbox().get_not_published_messages().await.unwrap();
        scope.commit().await.unwrap();

        assert_eq!(page.len(), OUTBOX_PAGE_SIZE);
    }
}
