//! Row store for customers and orders.
//!
//! # Tables
//!
//! - `customers` - One row per principal (unique `name`), write-once
//! - `orders` - Orders referencing `customers(id)`, write-once
//!
//! The services only see the [`CustomerStore`] and [`OrderStore`] traits.
//! [`PgStore`] is the `PostgreSQL` backend; [`MemoryStore`] keeps everything
//! in process for tests and dry runs.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/service/migrations/` and run via:
//! ```bash
//! cargo run -p orderdesk-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use orderdesk_core::{CustomerId, OrderId, Principal};

use crate::models::{Customer, NewCustomer, NewOrder, Order};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// SQLSTATE raised by the write-once triggers.
pub const IMMUTABLE_ROW_SQLSTATE: &str = "OD001";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique customer name).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store refused to modify a write-once row.
    #[error("row is immutable: {0}")]
    Immutable(String),

    /// Referenced row does not exist (e.g., stale customer ID on an order).
    #[error("foreign key violation: {0}")]
    ForeignKey(String),
}

/// Customer persistence.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Look up a customer by normalized name.
    async fn find_by_name(&self, name: &Principal) -> Result<Option<Customer>, RepositoryError>;

    /// Look up a customer by ID.
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;

    /// Insert a new customer, assigning its ID and timestamps.
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    async fn insert(&self, customer: &NewCustomer) -> Result<Customer, RepositoryError>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order, assigning its ID and creation time.
    ///
    /// Returns `RepositoryError::ForeignKey` if the customer does not exist.
    async fn insert(&self, order: &NewOrder) -> Result<Order, RepositoryError>;

    /// Look up an order by ID.
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Classify a sqlx error into the repository taxonomy.
pub(crate) fn classify(err: sqlx::Error, conflict: &str) -> RepositoryError {
    let kind = match &err {
        sqlx::Error::Database(db_err) => {
            if db_err.is_unique_violation() {
                Some(RepositoryError::Conflict(conflict.to_owned()))
            } else if db_err.is_foreign_key_violation() {
                Some(RepositoryError::ForeignKey(db_err.message().to_owned()))
            } else if db_err.code().as_deref() == Some(IMMUTABLE_ROW_SQLSTATE) {
                Some(RepositoryError::Immutable(db_err.message().to_owned()))
            } else {
                None
            }
        }
        _ => None,
    };
    kind.unwrap_or(RepositoryError::Database(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_stay_opaque() {
        let err = classify(sqlx::Error::RowNotFound, "customer exists");
        assert!(matches!(err, RepositoryError::Database(_)));
    }

    #[test]
    fn test_repository_error_display() {
        assert_eq!(RepositoryError::NotFound.to_string(), "not found");
        assert_eq!(
            RepositoryError::Conflict("customer exists".to_owned()).to_string(),
            "constraint violation: customer exists"
        );
    }
}
