//! Customer domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orderdesk_core::{CustomerId, Principal};

/// A customer that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    /// Normalized principal the customer will be known by.
    pub name: Principal,
}

impl NewCustomer {
    /// Create a new unsaved customer.
    #[must_use]
    pub const fn new(name: Principal) -> Self {
        Self { name }
    }
}

/// A persisted customer.
///
/// Only stores construct this type, so an instance always carries the id and
/// timestamps assigned at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    id: CustomerId,
    name: Principal,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl Customer {
    /// Build a customer from stored values.
    #[must_use]
    pub(crate) const fn from_stored(
        id: CustomerId,
        name: Principal,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            created_at,
            modified_at,
        }
    }

    /// Durable customer ID.
    #[must_use]
    pub const fn id(&self) -> CustomerId {
        self.id
    }

    /// Normalized principal.
    #[must_use]
    pub const fn name(&self) -> &Principal {
        &self.name
    }

    /// When the customer was created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the customer was last modified. Equal to `created_at`.
    #[must_use]
    pub const fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }
}
