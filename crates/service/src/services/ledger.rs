//! Order ledger: write-once order records.

use std::sync::Arc;

use tracing::{info, instrument};

use orderdesk_core::{Amount, CustomerId, ItemLabel, OrderId};

use crate::db::OrderStore;
use crate::error::{Error, Result};
use crate::models::{NewOrder, Order};

#[derive(Clone)]
pub struct OrderLedger {
    store: Arc<dyn OrderStore>,
}

impl OrderLedger {
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Persist a new order for an existing customer.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails (including an unknown
    /// customer ID).
    #[instrument(skip(self, item, amount), fields(amount = %amount))]
    pub async fn create(
        &self,
        customer_id: CustomerId,
        item: ItemLabel,
        amount: Amount,
    ) -> Result<Order> {
        let order = self
            .store
            .insert(&NewOrder {
                customer_id,
                item,
                amount,
            })
            .await?;

        info!(order_id = %order.id(), "Order created");
        Ok(order)
    }

    /// Fetch an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no order has that ID.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: OrderId) -> Result<Order> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("order {id}")))
    }
}
