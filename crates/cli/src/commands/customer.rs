//! Customer commands.
//!
//! # Usage
//!
//! ```bash
//! od-cli customer create alice@example.com
//! od-cli customer show --name alice@example.com
//! od-cli customer show --id 1
//! ```

use orderdesk_core::{CustomerId, Principal};
use orderdesk_service::services::CustomerDirectory;

use super::{CommandError, connect_store, print_json};

/// Create a customer and print it.
pub async fn create(name: &str) -> Result<(), CommandError> {
    let directory = CustomerDirectory::new(connect_store().await?);
    let name = Principal::parse(name).map_err(orderdesk_service::Error::from)?;
    let customer = directory.create(&name).await?;
    tracing::info!(customer_id = %customer.id(), "Customer created");
    print_json(&customer)
}

/// Print a customer looked up by name or ID.
pub async fn show(name: Option<&str>, id: Option<i64>) -> Result<(), CommandError> {
    let directory = CustomerDirectory::new(connect_store().await?);
    let customer = match (name, id) {
        (Some(name), _) => directory.by_name(name).await?,
        (None, Some(id)) => directory.by_id(CustomerId::new(id)).await?,
        (None, None) => {
            return Err(orderdesk_service::Error::InvalidInput(
                "either --name or --id is required".to_owned(),
            )
            .into());
        }
    };
    print_json(&customer)
}
