//! Core types for orderdesk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod amount;
pub mod id;
pub mod item;
pub mod principal;

pub use amount::{Amount, AmountError};
pub use id::*;
pub use item::{ItemLabel, ItemLabelError};
pub use principal::{Principal, PrincipalError};
