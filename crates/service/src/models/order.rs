//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orderdesk_core::{Amount, CustomerId, ItemLabel, OrderId};

/// An order that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Customer placing the order. Must reference an existing customer.
    pub customer_id: CustomerId,
    /// What was ordered.
    pub item: ItemLabel,
    /// How much it costs.
    pub amount: Amount,
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    item: ItemLabel,
    amount: Amount,
    created_at: DateTime<Utc>,
}

impl Order {
    /// Build an order from stored values.
    #[must_use]
    pub(crate) const fn from_stored(
        id: OrderId,
        customer_id: CustomerId,
        item: ItemLabel,
        amount: Amount,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            item,
            amount,
            created_at,
        }
    }

    /// Durable order ID.
    #[must_use]
    pub const fn id(&self) -> OrderId {
        self.id
    }

    /// Customer the order belongs to.
    #[must_use]
    pub const fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    /// Item label.
    #[must_use]
    pub const fn item(&self) -> &ItemLabel {
        &self.item
    }

    /// Order amount.
    #[must_use]
    pub const fn amount(&self) -> Amount {
        self.amount
    }

    /// When the order was created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
