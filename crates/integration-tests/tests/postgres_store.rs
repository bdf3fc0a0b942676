//! `PostgreSQL` store tests.
//!
//! Require a migrated database:
//!
//! ```bash
//! od-cli migrate
//! cargo test -p orderdesk-integration-tests --test postgres_store -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use orderdesk_core::{Amount, CustomerId, ItemLabel, OrderId, Principal};
use orderdesk_service::config::ServiceConfig;
use orderdesk_service::db::{
    self, CustomerStore, IMMUTABLE_ROW_SQLSTATE, OrderStore, PgStore, RepositoryError,
};
use orderdesk_service::models::{NewCustomer, NewOrder};

async fn store() -> PgStore {
    let url = ServiceConfig::database_url_from_env().unwrap();
    PgStore::new(db::create_pool(&url).await.unwrap())
}

/// Unique principal per run so tests do not collide on the shared database.
fn unique_name(prefix: &str) -> Principal {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    Principal::parse(&format!("{prefix}-{nanos}@example.com")).unwrap()
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_customer_insert_and_lookup() {
    let store = store().await;
    let name = unique_name("pg-customer");

    let created = CustomerStore::insert(&store, &NewCustomer::new(name.clone()))
        .await
        .unwrap();
    assert_eq!(created.name(), &name);
    assert_eq!(created.created_at(), created.modified_at());

    let by_name = store.find_by_name(&name).await.unwrap().unwrap();
    assert_eq!(by_name.id(), created.id());
    let by_id = CustomerStore::find_by_id(&store, created.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_id.name(), &name);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_duplicate_customer_conflicts() {
    let store = store().await;
    let name = unique_name("pg-dup");

    CustomerStore::insert(&store, &NewCustomer::new(name.clone()))
        .await
        .unwrap();
    let err = CustomerStore::insert(&store, &NewCustomer::new(name))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_order_round_trip_keeps_exact_amount() {
    let store = store().await;
    let customer = CustomerStore::insert(&store, &NewCustomer::new(unique_name("pg-order")))
        .await
        .unwrap();

    let order = OrderStore::insert(
        &store,
        &NewOrder {
            customer_id: customer.id(),
            item: ItemLabel::parse("widget").unwrap(),
            amount: Amount::parse("49.99").unwrap(),
        },
    )
    .await
    .unwrap();

    let fetched = OrderStore::find_by_id(&store, order.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.customer_id(), customer.id());
    assert_eq!(fetched.amount().to_string(), "49.99");
    assert_eq!(fetched.item().as_str(), "widget");
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_order_for_unknown_customer_is_foreign_key_error() {
    let store = store().await;
    let err = OrderStore::insert(
        &store,
        &NewOrder {
            customer_id: CustomerId::new(i64::MAX),
            item: ItemLabel::parse("widget").unwrap(),
            amount: Amount::ZERO,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RepositoryError::ForeignKey(_)));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_missing_rows_are_none() {
    let store = store().await;
    assert!(
        OrderStore::find_by_id(&store, OrderId::new(i64::MAX))
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        CustomerStore::find_by_id(&store, CustomerId::new(i64::MAX))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_rows_are_write_once() {
    let store = store().await;
    let customer = CustomerStore::insert(&store, &NewCustomer::new(unique_name("pg-immutable")))
        .await
        .unwrap();

    let err = sqlx::query("UPDATE customers SET name = name WHERE id = $1")
        .bind(customer.id())
        .execute(store.pool())
        .await
        .unwrap_err();

    let code = err
        .as_database_error()
        .and_then(|e| e.code().map(|c| c.into_owned()));
    assert_eq!(code.as_deref(), Some(IMMUTABLE_ROW_SQLSTATE));
}
