use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use async_trait::async_trait;
use common::{CourierId, EventId, OrderId};
use domain::{Courier, Order, OrderStatus};

use crate::{
    CourierRepository, OrderRepository, OutboxMessage, OutboxRepository, Result,
    repository::OUTBOX_PAGE_SIZE,
    uow::{UnitOfWork, UnitOfWorkScope},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    couriers: BTreeMap<CourierId, Courier>,
    orders: BTreeMap<OrderId, Order>,
    outbox: BTreeMap<EventId, OutboxMessage>,
}

impl Tables {
    fn merge(&mut self, changes: Tables) {
        self.couriers.extend(changes.couriers);
        self.orders.extend(changes.orders);
        self.outbox.extend(changes.outbox);
    }
}

/// What a scope sees (`view`) and what it wrote (`changes`).
#[derive(Debug, Default)]
struct ScopeState {
    view: Tables,
    changes: Tables,
}

type SharedState = Arc<Mutex<ScopeState>>;

enum Parent {
    Root(Arc<RwLock<Tables>>),
    Scope(SharedState),
}

/// In-memory unit of work implementation for testing.
///
/// Each scope works on a private copy of the data it can see and records the
/// rows it writes. Committing merges those rows into the enclosing scope, or
/// into the shared tables for a top-level scope; rolling back drops them.
/// Concurrent top-level scopes see only what was committed before they began
/// and the last commit wins per row.
#[derive(Clone, Default)]
pub struct InMemoryUnitOfWork {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryUnitOfWork {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a committed courier.
    pub fn courier(&self, id: CourierId) -> Option<Courier> {
        self.tables.read().unwrap().couriers.get(&id).cloned()
    }

    /// Returns a committed order.
    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.tables.read().unwrap().orders.get(&id).cloned()
    }

    /// Returns all committed couriers ordered by id.
    pub fn couriers(&self) -> Vec<Courier> {
        self.tables.read().unwrap().couriers.values().cloned().collect()
    }

    /// Returns all committed orders ordered by id.
    pub fn orders(&self) -> Vec<Order> {
        self.tables.read().unwrap().orders.values().cloned().collect()
    }

    /// Returns every committed outbox message, processed or not, oldest first.
    pub fn outbox_messages(&self) -> Vec<OutboxMessage> {
        let mut messages: Vec<_> = self.tables.read().unwrap().outbox.values().cloned().collect();
        messages.sort_by_key(|m| m.occurred_at);
        messages
    }

    /// Returns the number of committed outbox messages.
    pub fn outbox_len(&self) -> usize {
        self.tables.read().unwrap().outbox.len()
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn begin(&self) -> Result<Box<dyn UnitOfWorkScope>> {
        let view = self.tables.read().unwrap().clone();
        Ok(Box::new(InMemoryScope::new(
            view,
            Parent::Root(self.tables.clone()),
            0,
        )))
    }
}

/// A scope of [`InMemoryUnitOfWork`].
pub struct InMemoryScope {
    state: SharedState,
    parent: Parent,
    depth: u32,
    couriers: OnceLock<InMemoryCourierRepository>,
    orders: OnceLock<InMemoryOrderRepository>,
    outbox: OnceLock<InMemoryOutboxRepository>,
}

impl InMemoryScope {
    fn new(view: Tables, parent: Parent, depth: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScopeState {
                view,
                changes: Tables::default(),
            })),
            parent,
            depth,
            couriers: OnceLock::new(),
            orders: OnceLock::new(),
            outbox: OnceLock::new(),
        }
    }
}

#[async_trait]
impl UnitOfWorkScope for InMemoryScope {
    fn couriers(&self) -> &dyn CourierRepository {
        self.couriers.get_or_init(|| InMemoryCourierRepository {
            state: self.state.clone(),
        })
    }

    fn orders(&self) -> &dyn OrderRepository {
        self.orders.get_or_init(|| InMemoryOrderRepository {
            state: self.state.clone(),
        })
    }

    fn outbox(&self) -> &dyn OutboxRepository {
        self.outbox.get_or_init(|| InMemoryOutboxRepository {
            state: self.state.clone(),
        })
    }

    fn depth(&self) -> u32 {
        self.depth
    }

    async fn begin_nested(&self) -> Result<Box<dyn UnitOfWorkScope>> {
        let view = self.state.lock().unwrap().view.clone();
        Ok(Box::new(InMemoryScope::new(
            view,
            Parent::Scope(self.state.clone()),
            self.depth + 1,
        )))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let changes = std::mem::take(&mut self.state.lock().unwrap().changes);
        match &self.parent {
            Parent::Root(tables) => tables.write().unwrap().merge(changes),
            Parent::Scope(parent) => {
                let mut parent = parent.lock().unwrap();
                parent.view.merge(changes.clone());
                parent.changes.merge(changes);
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Courier repository over an in-memory scope.
pub struct InMemoryCourierRepository {
    state: SharedState,
}

#[async_trait]
impl CourierRepository for InMemoryCourierRepository {
    async fn get(&self, id: CourierId) -> Result<Option<Courier>> {
        Ok(self.state.lock().unwrap().view.couriers.get(&id).cloned())
    }

    async fn get_all_free(&self) -> Result<Vec<Courier>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .view
            .couriers
            .values()
            .filter(|c| c.is_free())
            .cloned()
            .collect())
    }

    async fn get_all(&self) -> Result<Vec<Courier>> {
        Ok(self.state.lock().unwrap().view.couriers.values().cloned().collect())
    }

    async fn save(&self, couriers: &[&Courier]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        for courier in couriers {
            state.view.couriers.insert(courier.id(), (*courier).clone());
            state.changes.couriers.insert(courier.id(), (*courier).clone());
        }
        Ok(())
    }
}

/// Order repository over an in-memory scope.
pub struct InMemoryOrderRepository {
    state: SharedState,
}

impl InMemoryOrderRepository {
    fn select(&self, filter: impl Fn(&Order) -> bool) -> Vec<Order> {
        let state = self.state.lock().unwrap();
        state
            .view
            .orders
            .values()
            .filter(|o| filter(o))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.lock().unwrap().view.orders.get(&id).cloned())
    }

    async fn get_first_in_created_status(&self) -> Result<Option<Order>> {
        Ok(self
            .select(|o| o.status() == OrderStatus::Created)
            .into_iter()
            .next())
    }

    async fn get_all_in_assigned_status(&self) -> Result<Vec<Order>> {
        Ok(self.select(|o| o.status() == OrderStatus::Assigned))
    }

    async fn get_all_incomplete(&self) -> Result<Vec<Order>> {
        Ok(self.select(|o| !o.status().is_terminal()))
    }

    async fn save(&self, orders: &mut [&mut Order]) -> Result<()> {
        let messages = orders
            .iter()
            .flat_map(|order| order.events())
            .map(OutboxMessage::from_event)
            .collect::<Result<Vec<_>>>()?;

        let mut state = self.state.lock().unwrap();
        for message in messages {
            state.view.outbox.insert(message.id, message.clone());
            state.changes.outbox.insert(message.id, message);
        }

        for order in orders.iter_mut() {
            order.take_events();
            state.view.orders.insert(order.id(), (**order).clone());
            state.changes.orders.insert(order.id(), (**order).clone());
        }
        Ok(())
    }
}

/// Outbox repository over an in-memory scope.
pub struct InMemoryOutboxRepository {
    state: SharedState,
}

#[async_trait]
impl OutboxRepository for InMemoryOutboxRepository {
    async fn save(&self, messages: &[OutboxMessage]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        for message in messages {
            let stored = match state.view.outbox.get(&message.id) {
                Some(existing) => OutboxMessage {
                    processed_at: message.processed_at,
                    ..existing.clone()
                },
                None => message.clone(),
            };
            state.view.outbox.insert(stored.id, stored.clone());
            state.changes.outbox.insert(stored.id, stored);
        }
        Ok(())
    }

    async fn get_not_published_messages(&self) -> Result<Vec<OutboxMessage>> {
        let state = self.state.lock().unwrap();
        let mut messages: Vec<_> = state
            .view
            .outbox
            .values()
            .filter(|m| !m.is_processed())
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.occurred_at);
        messages.truncate(OUTBOX_PAGE_SIZE);
        Ok(messages)
    }
}
