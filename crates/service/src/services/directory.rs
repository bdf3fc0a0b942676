//! Customer directory.
//!
//! Maps principals to durable customer records. Names are normalized before
//! every lookup and write, so `Alice@Example.com` and `alice@example.com`
//! are the same customer. The store's unique constraint is the only
//! arbiter of uniqueness.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use orderdesk_core::{CustomerId, Principal};

use crate::db::{CustomerStore, RepositoryError};
use crate::error::{Error, Result};
use crate::models::{Customer, NewCustomer};

/// Customer lookup and creation.
#[derive(Clone)]
pub struct CustomerDirectory {
    store: Arc<dyn CustomerStore>,
}

impl CustomerDirectory {
    #[must_use]
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }

    /// Return the customer for `name`, creating it on first sight.
    ///
    /// Idempotent: repeated calls with case variants of the same name return
    /// the same record. If a concurrent call wins the insert, the winner's
    /// record is returned.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the lookup or insert fails.
    #[instrument(skip_all)]
    pub async fn resolve_or_create(&self, name: &Principal) -> Result<Customer> {
        if let Some(customer) = self.store.find_by_name(name).await? {
            return Ok(customer);
        }

        match self.store.insert(&NewCustomer::new(name.clone())).await {
            Ok(customer) => {
                info!(customer_id = %customer.id(), "Customer created");
                Ok(customer)
            }
            Err(RepositoryError::Conflict(_)) => {
                debug!(customer = %name, "Lost insert race, re-reading customer");
                self.store
                    .find_by_name(name)
                    .await?
                    .ok_or_else(|| Error::NotFound(format!("customer {name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create a customer, failing if the name is taken.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if a customer with the same normalized name
    /// exists, or a storage error.
    #[instrument(skip_all)]
    pub async fn create(&self, name: &Principal) -> Result<Customer> {
        if self.store.find_by_name(name).await?.is_some() {
            return Err(Error::AlreadyExists(name.to_string()));
        }

        match self.store.insert(&NewCustomer::new(name.clone())).await {
            Ok(customer) => {
                info!(customer_id = %customer.id(), "Customer created");
                Ok(customer)
            }
            Err(RepositoryError::Conflict(_)) => Err(Error::AlreadyExists(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a customer by name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no customer has that name.
    #[instrument(skip_all)]
    pub async fn by_name(&self, name: &str) -> Result<Customer> {
        let name = Principal::parse(name)?;
        self.store
            .find_by_name(&name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("customer {name}")))
    }

    /// Look up a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no customer has that ID.
    #[instrument(skip(self))]
    pub async fn by_id(&self, id: CustomerId) -> Result<Customer> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("customer {id}")))
    }
}
