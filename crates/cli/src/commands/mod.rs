//! Subcommand implementations.

pub mod customer;
pub mod login;
pub mod migrate;
pub mod order;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use orderdesk_service::AppState;
use orderdesk_service::config::{ConfigError, ServiceConfig};
use orderdesk_service::db::{self, PgStore};
use orderdesk_service::state::StateError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("startup error: {0}")]
    State(#[from] StateError),

    #[error(transparent)]
    Service(#[from] orderdesk_service::Error),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Connect to the database only; for commands that never call the identity
/// provider or the SMS gateway.
async fn connect_store() -> Result<Arc<PgStore>, CommandError> {
    let database_url = ServiceConfig::database_url_from_env()?;
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    Ok(Arc::new(PgStore::new(pool)))
}

/// Build the full application state from the environment.
async fn connect_state() -> Result<AppState, CommandError> {
    let config = ServiceConfig::from_env()?;
    Ok(AppState::connect(&config).await?)
}

/// Print a value to stdout as pretty JSON.
fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    let json = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}
