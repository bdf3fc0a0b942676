//! orderdesk core - Shared domain types.
//!
//! This crate provides the value types used across all orderdesk components:
//! - `service` - Identity resolution and order placement pipeline
//! - `cli` - Command-line tools for migrations and operator tasks
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, principals, amounts and item labels

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
