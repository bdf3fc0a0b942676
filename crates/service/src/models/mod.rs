//! Domain models for orderdesk.
//!
//! Persisted records (`Customer`, `Order`) are write-once: their fields are
//! private and there is no way to hand one back to a store. The `New*` types
//! are the only shapes a store accepts.

pub mod customer;
pub mod order;

pub use customer::{Customer, NewCustomer};
pub use order::{NewOrder, Order};
