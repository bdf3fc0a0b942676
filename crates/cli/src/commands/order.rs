//! Order commands.
//!
//! # Usage
//!
//! ```bash
//! od-cli order place --code "$CODE" --item widget --amount 9.99
//! od-cli order show 42
//! ```
//!
//! `place` needs the full configuration (identity provider and SMS gateway);
//! `show` only needs the database.

use orderdesk_core::OrderId;
use orderdesk_service::services::OrderLedger;

use super::{CommandError, connect_state, connect_store, print_json};

/// Authenticate with an authorization code, place the order and print it.
///
/// Waits for the order notification before returning so the process does
/// not exit mid-send.
pub async fn place(code: &str, item: &str, amount: &str) -> Result<(), CommandError> {
    let state = connect_state().await?;
    let ctx = state.authenticate(code).await?;
    let order = state.create_order(&ctx, item, amount).await;
    state.drain_notifications().await;
    print_json(&order?)
}

/// Print an order by ID.
pub async fn show(id: i64) -> Result<(), CommandError> {
    let ledger = OrderLedger::new(connect_store().await?);
    let order = ledger.get_by_id(OrderId::new(id)).await?;
    print_json(&order)
}
