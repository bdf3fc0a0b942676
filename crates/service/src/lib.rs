//! Orderdesk service library.
//!
//! Verifies customer identity against an `OpenID` Connect provider, keeps a
//! write-once customer directory and order ledger in `PostgreSQL`, and sends
//! a best-effort SMS for every placed order.
//!
//! Outer layers build an [`AppState`] and call its operations with a
//! [`RequestContext`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod state;

pub use context::RequestContext;
pub use error::{Error, ErrorKind, Result};
pub use state::AppState;
