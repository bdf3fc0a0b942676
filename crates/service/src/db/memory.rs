//! In-process store.
//!
//! Enforces the same constraints as the `PostgreSQL` schema: unique customer
//! names, orders referencing existing customers, sequential IDs from 1. All
//! checks and writes for one call happen under a single lock, so concurrent
//! inserts for the same name see exactly one winner.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use orderdesk_core::{CustomerId, OrderId, Principal};

use super::{CustomerStore, OrderStore, RepositoryError};
use crate::models::{Customer, NewCustomer, NewOrder, Order};

/// In-memory implementation of [`CustomerStore`] and [`OrderStore`].
///
/// Clones share the same underlying tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

#[derive(Default)]
struct Tables {
    customers: BTreeMap<CustomerId, Customer>,
    names: HashMap<Principal, CustomerId>,
    orders: BTreeMap<OrderId, Order>,
    next_customer_id: i64,
    next_order_id: i64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted customers.
    #[must_use]
    pub fn customer_count(&self) -> usize {
        self.tables().customers.len()
    }

    /// Number of persisted orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.tables().orders.len()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // No code path panics while holding the lock, but a poisoned guard
        // still holds consistent tables.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn find_by_name(&self, name: &Principal) -> Result<Option<Customer>, RepositoryError> {
        let tables = self.tables();
        Ok(tables
            .names
            .get(name)
            .and_then(|id| tables.customers.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        Ok(self.tables().customers.get(&id).cloned())
    }

    async fn insert(&self, customer: &NewCustomer) -> Result<Customer, RepositoryError> {
        let mut tables = self.tables();
        if tables.names.contains_key(&customer.name) {
            return Err(RepositoryError::Conflict("customer exists".to_owned()));
        }

        tables.next_customer_id += 1;
        let id = CustomerId::new(tables.next_customer_id);
        let now = Utc::now();
        let stored = Customer::from_stored(id, customer.name.clone(), now, now);

        tables.names.insert(customer.name.clone(), id);
        tables.customers.insert(id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.tables();
        if !tables.customers.contains_key(&order.customer_id) {
            return Err(RepositoryError::ForeignKey(format!(
                "customer {} does not exist",
                order.customer_id
            )));
        }

        tables.next_order_id += 1;
        let id = OrderId::new(tables.next_order_id);
        let stored = Order::from_stored(
            id,
            order.customer_id,
            order.item.clone(),
            order.amount,
            Utc::now(),
        );

        tables.orders.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.tables().orders.get(&id).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use orderdesk_core::{Amount, ItemLabel};

    use super::*;

    fn new_customer(name: &str) -> NewCustomer {
        NewCustomer::new(Principal::parse(name).unwrap())
    }

    #[tokio::test]
    async fn test_ids_start_at_one() {
        let store = MemoryStore::new();
        let first = CustomerStore::insert(&store, &new_customer("a@example.com"))
            .await
            .unwrap();
        let second = CustomerStore::insert(&store, &new_customer("b@example.com"))
            .await
            .unwrap();
        assert_eq!(first.id(), CustomerId::new(1));
        assert_eq!(second.id(), CustomerId::new(2));
        assert_eq!(first.created_at(), first.modified_at());
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let store = MemoryStore::new();
        CustomerStore::insert(&store, &new_customer("a@example.com"))
            .await
            .unwrap();
        let err = CustomerStore::insert(&store, &new_customer("A@Example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.customer_count(), 1);
    }

    #[tokio::test]
    async fn test_order_requires_existing_customer() {
        let store = MemoryStore::new();
        let order = NewOrder {
            customer_id: CustomerId::new(99),
            item: ItemLabel::parse("widget").unwrap(),
            amount: Amount::parse("1.00").unwrap(),
        };
        let err = OrderStore::insert(&store, &order).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKey(_)));
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_tables() {
        let store = MemoryStore::new();
        let clone = store.clone();
        CustomerStore::insert(&clone, &new_customer("a@example.com"))
            .await
            .unwrap();
        let found = store
            .find_by_name(&Principal::parse("a@example.com").unwrap())
            .await
            .unwrap();
        assert!(found.is_some());
    }
}
