//! Integration tests for the delivery use-cases over the in-memory store.

use std::sync::Arc;

use application::{
    AddStoragePlace, ApplicationError, Assignment, CreateCourier, CreateOrder, DeliveryService,
    InMemoryGeoResolver, InMemoryNotificationProducer, MoveReport, OrderEventsHandler,
};
use common::{CourierId, OrderId};
use domain::{Courier, DispatchError, DomainError, Location, Order, OrderEvent, OrderStatus};
use outbox::{EventRegistry, Mediator, OutboxFlusher};
use store::{InMemoryUnitOfWork, StoreError, UnitOfWorkExt};

const STREET: &str = "Bolshaya Nikitskaya 12";

struct TestHarness {
    uow: InMemoryUnitOfWork,
    geo: InMemoryGeoResolver,
    service: DeliveryService,
}

impl TestHarness {
    fn new() -> Self {
        let uow = InMemoryUnitOfWork::new();
        let geo = InMemoryGeoResolver::new();
        let service = DeliveryService::new(Arc::new(uow.clone()), Arc::new(geo.clone()));

        Self { uow, geo, service }
    }

    async fn seed_courier(&self, name: &str, speed: i32, x: i32, y: i32) -> CourierId {
        let courier = Courier::new(name, speed, loc(x, y)).unwrap();
        let id = courier.id();
        self.uow
            .run(move |scope| {
                Box::pin(async move {
                    scope.couriers().save(&[&courier]).await?;
                    Ok::<_, StoreError>(())
                })
            })
            .await
            .unwrap();
        id
    }

    async fn place_order(&self, x: i32, y: i32, volume: i32) -> OrderId {
        let street = format!("{STREET} ({x}, {y})");
        self.geo.insert(street.clone(), loc(x, y));

        let order_id = OrderId::new();
        self.service
            .create_order(CreateOrder::new(order_id, street, volume).unwrap())
            .await
            .unwrap();
        order_id
    }
}

fn loc(x: i32, y: i32) -> Location {
    Location::new(x, y).unwrap()
}

mod couriers {
    use super::*;

    #[tokio::test]
    async fn create_courier_starts_with_default_bag() {
        let h = TestHarness::new();

        let id = h
            .service
            .create_courier(CreateCourier::new("Alice", 3).unwrap())
            .await
            .unwrap();

        let courier = h.uow.courier(id).unwrap();
        assert_eq!(courier.name(), "Alice");
        assert_eq!(courier.speed(), 3);
        assert_eq!(courier.storage_places().len(), 1);
        assert_eq!(courier.storage_places()[0].name(), "Bag");
        assert_eq!(courier.storage_places()[0].total_volume(), 10);
    }

    #[tokio::test]
    async fn add_storage_place_appends_to_courier() {
        let h = TestHarness::new();
        let id = h.seed_courier("Alice", 1, 1, 1).await;

        h.service
            .add_storage_place(AddStoragePlace::new(id, "Trunk", 30).unwrap())
            .await
            .unwrap();

        let courier = h.uow.courier(id).unwrap();
        let names: Vec<&str> = courier.storage_places().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Bag", "Trunk"]);
        assert_eq!(courier.storage_places()[1].total_volume(), 30);
    }

    #[tokio::test]
    async fn add_storage_place_to_unknown_courier_fails() {
        let h = TestHarness::new();
        let missing = CourierId::new();

        let result = h
            .service
            .add_storage_place(AddStoragePlace::new(missing, "Trunk", 30).unwrap())
            .await;

        assert!(matches!(result, Err(ApplicationError::CourierNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn listing_returns_every_courier() {
        let h = TestHarness::new();
        h.seed_courier("Alice", 1, 1, 1).await;
        h.seed_courier("Bob", 2, 5, 5).await;

        let couriers = h.service.get_all_couriers().await.unwrap();

        assert_eq!(couriers.len(), 2);
        assert!(couriers.windows(2).all(|w| w[0].id() < w[1].id()));
    }
}

mod orders {
    use super::*;

    #[tokio::test]
    async fn create_order_uses_resolved_location_and_writes_outbox() {
        let h = TestHarness::new();

        let order_id = h.place_order(7, 3, 4).await;

        let order = h.uow.order(order_id).unwrap();
        assert_eq!(order.location(), loc(7, 3));
        assert_eq!(order.volume(), 4);
        assert_eq!(order.status(), OrderStatus::Created);
        assert!(order.events().is_empty());

        let messages = h.uow.outbox_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].event_type, "OrderCreated");
    }

    #[tokio::test]
    async fn duplicate_order_is_rejected() {
        let h = TestHarness::new();
        let order_id = h.place_order(2, 2, 1).await;

        h.geo.insert("Arbat 1", loc(9, 9));
        let result = h
            .service
            .create_order(CreateOrder::new(order_id, "Arbat 1", 5).unwrap())
            .await;

        assert!(matches!(result, Err(ApplicationError::OrderAlreadyExists(id)) if id == order_id));
        assert_eq!(h.uow.order(order_id).unwrap().location(), loc(2, 2));
        assert_eq!(h.uow.outbox_len(), 1);
    }

    #[tokio::test]
    async fn geolocation_failure_stores_nothing() {
        let h = TestHarness::new();
        h.geo.insert(STREET, loc(5, 5));
        h.geo.set_fail_on_resolve(true);

        let result = h
            .service
            .create_order(CreateOrder::new(OrderId::new(), STREET, 1).unwrap())
            .await;

        assert!(matches!(result, Err(ApplicationError::Geo { .. })));
        assert!(h.uow.orders().is_empty());
        assert_eq!(h.uow.outbox_len(), 0);
    }

    #[tokio::test]
    async fn incomplete_orders_exclude_delivered_ones() {
        let h = TestHarness::new();
        h.seed_courier("Alice", 5, 3, 3).await;
        let delivered = h.place_order(3, 3, 1).await;
        h.service.assign_order().await.unwrap();
        h.service.move_couriers().await.unwrap();
        let waiting = h.place_order(8, 8, 1).await;

        let incomplete: Vec<OrderId> = h
            .service
            .get_incomplete_orders()
            .await
            .unwrap()
            .iter()
            .map(Order::id)
            .collect();
        assert!(!incomplete.contains(&delivered));
        assert!(incomplete.contains(&waiting));
    }
}

mod assignment {
    use super::*;

    #[tokio::test]
    async fn nothing_to_do_without_couriers_or_orders() {
        let h = TestHarness::new();
        assert_eq!(h.service.assign_order().await.unwrap(), None);

        h.place_order(4, 4, 1).await;
        assert_eq!(h.service.assign_order().await.unwrap(), None);

        let h = TestHarness::new();
        h.seed_courier("Alice", 1, 1, 1).await;
        assert_eq!(h.service.assign_order().await.unwrap(), None);
    }

    #[tokio::test]
    async fn assigns_fastest_free_courier() {
        let h = TestHarness::new();
        let slow = h.seed_courier("Slow", 1, 2, 10).await;
        let far = h.seed_courier("Far", 6, 1, 2).await;
        let fastest = h.seed_courier("Fastest", 2, 8, 8).await;
        let order_id = h.place_order(10, 10, 5).await;

        let assignment = h.service.assign_order().await.unwrap();

        assert_eq!(
            assignment,
            Some(Assignment {
                order_id,
                courier_id: fastest
            })
        );

        let order = h.uow.order(order_id).unwrap();
        assert_eq!(order.status(), OrderStatus::Assigned);
        assert_eq!(order.courier_id(), Some(fastest));

        let courier = h.uow.courier(fastest).unwrap();
        assert_eq!(courier.storage_places()[0].order_id(), Some(order_id));
        assert!(h.uow.courier(slow).unwrap().is_free());
        assert!(h.uow.courier(far).unwrap().is_free());

        assert_eq!(h.service.assign_order().await.unwrap(), None);
    }

    #[tokio::test]
    async fn order_too_large_for_everyone_fails_and_changes_nothing() {
        let h = TestHarness::new();
        let courier_id = h.seed_courier("Alice", 1, 1, 1).await;
        let order_id = h.place_order(5, 5, 11).await;

        let result = h.service.assign_order().await;

        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::Dispatch(
                DispatchError::NoMatchingCourier
            )))
        ));
        assert_eq!(h.uow.order(order_id).unwrap().status(), OrderStatus::Created);
        assert!(h.uow.courier(courier_id).unwrap().is_free());
    }
}

mod movement {
    use super::*;

    #[tokio::test]
    async fn courier_steps_towards_order_then_completes_it() {
        let h = TestHarness::new();
        let courier_id = h.seed_courier("Alice", 2, 1, 1).await;
        let order_id = h.place_order(4, 1, 1).await;
        h.service.assign_order().await.unwrap();

        let first = h.service.move_couriers().await.unwrap();
        assert_eq!(
            first,
            MoveReport {
                moved: 1,
                completed: 0
            }
        );
        assert_eq!(h.uow.courier(courier_id).unwrap().location(), loc(3, 1));

        let second = h.service.move_couriers().await.unwrap();
        assert_eq!(
            second,
            MoveReport {
                moved: 1,
                completed: 1
            }
        );

        let courier = h.uow.courier(courier_id).unwrap();
        assert_eq!(courier.location(), loc(4, 1));
        assert!(courier.is_free());
        assert_eq!(h.uow.order(order_id).unwrap().status(), OrderStatus::Completed);

        let types: Vec<String> = h
            .uow
            .outbox_messages()
            .into_iter()
            .map(|m| m.event_type)
            .collect();
        assert_eq!(types, vec!["OrderCreated", "OrderCompleted"]);

        assert_eq!(h.service.move_couriers().await.unwrap(), MoveReport::default());
    }

    #[tokio::test]
    async fn courier_already_at_order_completes_without_moving() {
        let h = TestHarness::new();
        let courier_id = h.seed_courier("Alice", 1, 6, 6).await;
        let order_id = h.place_order(6, 6, 1).await;
        h.service.assign_order().await.unwrap();

        let report = h.service.move_couriers().await.unwrap();

        assert_eq!(
            report,
            MoveReport {
                moved: 0,
                completed: 1
            }
        );
        assert_eq!(h.uow.courier(courier_id).unwrap().location(), loc(6, 6));
        assert_eq!(h.uow.order(order_id).unwrap().status(), OrderStatus::Completed);
    }

    #[tokio::test]
    async fn missing_courier_fails_the_whole_run() {
        let h = TestHarness::new();
        let courier_id = h.seed_courier("Alice", 1, 1, 1).await;
        h.place_order(2, 1, 1).await;
        h.service.assign_order().await.unwrap();

        let ghost = CourierId::new();
        let mut orphan = Order::restore(
            OrderId::new(),
            Some(ghost),
            loc(9, 9),
            1,
            OrderStatus::Assigned,
        );
        h.uow
            .run(move |scope| {
                Box::pin(async move {
                    scope.orders().save(&mut [&mut orphan]).await?;
                    Ok::<_, StoreError>(())
                })
            })
            .await
            .unwrap();

        let result = h.service.move_couriers().await;

        assert!(matches!(result, Err(ApplicationError::CourierNotFound(id)) if id == ghost));
        assert_eq!(h.uow.courier(courier_id).unwrap().location(), loc(1, 1));
    }
}

mod pipeline {
    use super::*;

    #[tokio::test]
    async fn delivered_order_notifies_created_and_completed() {
        let h = TestHarness::new();
        let producer = InMemoryNotificationProducer::new();

        let mut mediator = Mediator::<OrderEvent>::new();
        mediator.subscribe_all(Arc::new(OrderEventsHandler::new(Arc::new(producer.clone()))));
        let flusher = OutboxFlusher::new(
            Arc::new(h.uow.clone()),
            Arc::new(EventRegistry::order_events()),
            Arc::new(mediator),
        );

        let courier_id = h.seed_courier("Alice", 3, 1, 1).await;
        let order_id = h.place_order(9, 9, 2).await;
        h.service.assign_order().await.unwrap();

        let mut runs = 0;
        while h.uow.order(order_id).unwrap().status() != OrderStatus::Completed {
            h.service.move_couriers().await.unwrap();
            runs += 1;
            assert!(runs <= 6, "courier never arrived");
        }

        let report = flusher.flush().await.unwrap();
        assert_eq!(report.published, 2);

        let published = producer.published();
        assert_eq!(published.len(), 2);
        assert!(matches!(&published[0], OrderEvent::OrderCreated(data) if data.order_id == order_id));
        assert!(matches!(
            &published[1],
            OrderEvent::OrderCompleted(data)
                if data.order_id == order_id && data.courier_id == courier_id
        ));

        assert_eq!(flusher.flush().await.unwrap().fetched, 0);
    }

    #[tokio::test]
    async fn failed_notification_is_redelivered() {
        let h = TestHarness::new();
        let producer = InMemoryNotificationProducer::new();

        let mut mediator = Mediator::<OrderEvent>::new();
        mediator.subscribe_all(Arc::new(OrderEventsHandler::new(Arc::new(producer.clone()))));
        let flusher = OutboxFlusher::new(
            Arc::new(h.uow.clone()),
            Arc::new(EventRegistry::order_events()),
            Arc::new(mediator),
        );

        h.place_order(2, 2, 1).await;

        producer.set_fail_on_publish(true);
        assert_eq!(flusher.flush().await.unwrap().failed, 1);
        assert!(producer.published().is_empty());

        producer.set_fail_on_publish(false);
        assert_eq!(flusher.flush().await.unwrap().published, 1);
        assert_eq!(producer.published().len(), 1);
    }
}
