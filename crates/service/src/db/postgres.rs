//! `PostgreSQL` store.
//!
//! Queries are built at runtime with `query_as` + `FromRow` rows so the
//! crate builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use orderdesk_core::{Amount, CustomerId, ItemLabel, OrderId, Principal};

use super::{CustomerStore, OrderStore, RepositoryError, classify};
use crate::models::{Customer, NewCustomer, NewOrder, Order};

/// `PostgreSQL` implementation of [`CustomerStore`] and [`OrderStore`].
///
/// Cheap to clone; the pool is reference counted.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Internal row type for customer queries.
#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: CustomerId,
    name: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let name = Principal::parse(&row.name).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid customer name in database: {e}"))
        })?;
        Ok(Self::from_stored(row.id, name, row.created_at, row.modified_at))
    }
}

/// Internal row type for order queries.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    customer_id: CustomerId,
    item: String,
    amount: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let item = ItemLabel::parse(&row.item).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order item in database: {e}"))
        })?;
        let amount = Amount::new(row.amount).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order amount in database: {e}"))
        })?;
        Ok(Self::from_stored(
            row.id,
            row.customer_id,
            item,
            amount,
            row.created_at,
        ))
    }
}

#[async_trait]
impl CustomerStore for PgStore {
    #[instrument(skip(self, name))]
    async fn find_by_name(&self, name: &Principal) -> Result<Option<Customer>, RepositoryError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            r"
            SELECT id, name, created_at, modified_at
            FROM customers
            WHERE name = $1
            ",
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            r"
            SELECT id, name, created_at, modified_at
            FROM customers
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    #[instrument(skip(self, customer))]
    async fn insert(&self, customer: &NewCustomer) -> Result<Customer, RepositoryError> {
        let now = Utc::now();

        let row: CustomerRow = sqlx::query_as(
            r"
            INSERT INTO customers (name, created_at, modified_at)
            VALUES ($1, $2, $2)
            RETURNING id, name, created_at, modified_at
            ",
        )
        .bind(customer.name.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "customer exists"))?;

        let customer = Customer::try_from(row)?;
        debug!(id = %customer.id(), "Inserted customer");
        Ok(customer)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    #[instrument(skip(self, order), fields(customer_id = %order.customer_id))]
    async fn insert(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let row: OrderRow = sqlx::query_as(
            r"
            INSERT INTO orders (customer_id, item, amount, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, customer_id, item, amount, created_at
            ",
        )
        .bind(order.customer_id)
        .bind(order.item.as_str())
        .bind(order.amount.as_decimal())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "order exists"))?;

        let order = Order::try_from(row)?;
        debug!(id = %order.id(), "Inserted order");
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(
            r"
            SELECT id, customer_id, item, amount, created_at
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }
}
