//! Orderdesk CLI - migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! od-cli migrate
//!
//! # Register or look up a customer
//! od-cli customer create alice@example.com
//! od-cli customer show --name alice@example.com
//!
//! # Place an order with a provider authorization code, or look one up
//! od-cli order place --code "$CODE" --item widget --amount 9.99
//! od-cli order show 42
//!
//! # Walk through the login flow
//! od-cli login url
//! od-cli login callback --code ... --state ... --nonce ... --returned-state ...
//! ```
//!
//! Records are printed to stdout as JSON.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "od-cli")]
#[command(author, version, about = "Orderdesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage customers
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// Place and inspect orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Identity provider login flow
    Login {
        #[command(subcommand)]
        action: LoginAction,
    },
}

#[derive(Subcommand)]
enum CustomerAction {
    /// Create a customer (fails if the name is taken)
    Create {
        /// Customer principal, usually an email address
        name: String,
    },
    /// Show a customer by name or ID
    Show {
        #[arg(long, conflicts_with = "id", required_unless_present = "id")]
        name: Option<String>,
        #[arg(long)]
        id: Option<i64>,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Place an order on behalf of an authenticated customer
    Place {
        /// Authorization code, exchanged once with the identity provider
        #[arg(long)]
        code: String,
        /// Item label
        #[arg(short, long)]
        item: String,
        /// Amount (decimal, non-negative)
        #[arg(short, long)]
        amount: String,
    },
    /// Show an order by ID
    Show { id: i64 },
}

#[derive(Subcommand)]
enum LoginAction {
    /// Print a login URL with fresh state and nonce
    Url,
    /// Complete a login from the provider callback and register the customer
    Callback {
        /// Authorization code from the callback
        #[arg(long)]
        code: String,
        /// State issued by `login url`
        #[arg(long)]
        state: String,
        /// Nonce issued by `login url`
        #[arg(long)]
        nonce: String,
        /// State returned on the callback
        #[arg(long)]
        returned_state: String,
    },
}

/// Initialize Sentry error tracking when `SENTRY_DSN` is set.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN")
        .ok()
        .filter(|dsn| !dsn.trim().is_empty())?;

    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    )))
}

/// Warnings and errors become Sentry events, info and debug breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let _sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "orderdesk_service=info,orderdesk_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Customer { action } => match action {
            CustomerAction::Create { name } => commands::customer::create(&name).await?,
            CustomerAction::Show { name, id } => {
                commands::customer::show(name.as_deref(), id).await?;
            }
        },
        Commands::Order { action } => match action {
            OrderAction::Place { code, item, amount } => {
                commands::order::place(&code, &item, &amount).await?;
            }
            OrderAction::Show { id } => commands::order::show(id).await?,
        },
        Commands::Login { action } => match action {
            LoginAction::Url => commands::login::url().await?,
            LoginAction::Callback {
                code,
                state,
                nonce,
                returned_state,
            } => commands::login::callback(&code, state, nonce, &returned_state).await?,
        },
    }
    Ok(())
}
