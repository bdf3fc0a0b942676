//! Application state shared across callers.
//!
//! [`AppState`] is the composition root: it owns the stores, the identity
//! provider and the notification gateway, and exposes the operations an
//! outer layer (HTTP handlers, the CLI) calls.

use std::sync::Arc;

use tracing::{info, instrument};

use orderdesk_core::{CustomerId, OrderId, Principal};

use crate::config::ServiceConfig;
use crate::context::RequestContext;
use crate::db::{self, CustomerStore, OrderStore, PgStore};
use crate::error::Result;
use crate::models::{Customer, Order};
use crate::services::identity::{IdentityProvider, LoginRedirect, OidcClient, ProviderError};
use crate::services::notify::{NotificationGateway, NotifyError, SmsGateway};
use crate::services::{Authenticator, CustomerDirectory, Dispatcher, OrderLedger, OrderPipeline};

/// Error building [`AppState`] from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("identity provider error: {0}")]
    Identity(#[from] ProviderError),
    #[error("notification gateway error: {0}")]
    Notify(#[from] NotifyError),
}

/// Application state shared across all callers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    authenticator: Authenticator,
    directory: CustomerDirectory,
    ledger: OrderLedger,
    dispatcher: Dispatcher,
    pipeline: OrderPipeline,
}

impl AppState {
    /// Connect to `PostgreSQL`, discover the identity provider and build the
    /// SMS gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the three cannot be reached or built.
    #[instrument(skip_all)]
    pub async fn connect(config: &ServiceConfig) -> std::result::Result<Self, StateError> {
        let pool = db::create_pool(&config.database_url).await?;
        let store = Arc::new(PgStore::new(pool));

        let provider = OidcClient::discover(&config.oidc, config.outbound_timeout).await?;
        let gateway = SmsGateway::new(&config.sms, config.outbound_timeout)?;

        info!(issuer = provider.issuer(), "Application state ready");

        Ok(Self::from_parts(
            store.clone(),
            store,
            Arc::new(provider),
            Arc::new(gateway),
            config.sms.destination.clone(),
        ))
    }

    /// Assemble state from explicit collaborators.
    #[must_use]
    pub fn from_parts(
        customers: Arc<dyn CustomerStore>,
        orders: Arc<dyn OrderStore>,
        provider: Arc<dyn IdentityProvider>,
        gateway: Arc<dyn NotificationGateway>,
        destination: impl Into<String>,
    ) -> Self {
        let directory = CustomerDirectory::new(customers);
        let ledger = OrderLedger::new(orders);
        let dispatcher = Dispatcher::new(gateway, destination);
        let pipeline = OrderPipeline::new(directory.clone(), ledger.clone(), dispatcher.clone());

        Self {
            inner: Arc::new(AppStateInner {
                authenticator: Authenticator::new(provider),
                directory,
                ledger,
                dispatcher,
                pipeline,
            }),
        }
    }

    /// Get a reference to the authenticator.
    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        &self.inner.authenticator
    }

    /// Create a customer; fails with `AlreadyExists` for a taken name.
    ///
    /// # Errors
    ///
    /// See [`CustomerDirectory::create`].
    pub async fn create_customer(&self, name: &str) -> Result<Customer> {
        let name = Principal::parse(name)?;
        self.inner.directory.create(&name).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no customer has that name.
    pub async fn customer_by_name(&self, name: &str) -> Result<Customer> {
        self.inner.directory.by_name(name).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no customer has that ID.
    pub async fn customer_by_id(&self, id: CustomerId) -> Result<Customer> {
        self.inner.directory.by_id(id).await
    }

    /// Place an order for the principal in `ctx`.
    ///
    /// # Errors
    ///
    /// See [`OrderPipeline::place_order`].
    pub async fn create_order(
        &self,
        ctx: &RequestContext,
        item: &str,
        amount: &str,
    ) -> Result<Order> {
        self.inner.pipeline.place_order(ctx, item, amount).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no order has that ID.
    pub async fn order_by_id(&self, id: OrderId) -> Result<Order> {
        self.inner.ledger.get_by_id(id).await
    }

    /// Exchange an authorization code and build an authenticated context.
    ///
    /// # Errors
    ///
    /// Returns `Error::Identity` with the failing stage.
    pub async fn authenticate(&self, credential: &str) -> Result<RequestContext> {
        let principal = self.inner.authenticator.authenticate(credential).await?;
        Ok(RequestContext::authenticated(principal))
    }

    /// Start a login.
    #[must_use]
    pub fn login_url(&self) -> LoginRedirect {
        self.inner.authenticator.login_url()
    }

    /// Finish a login and register the customer.
    ///
    /// Returns the new customer and the provider access token. The access
    /// token is for the provider's APIs; [`Self::authenticate`] takes
    /// authorization codes only. A principal that already has a customer record fails with
    /// `AlreadyExists`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Identity` for a failed login, or the errors of
    /// [`Self::create_customer`].
    pub async fn complete_login(
        &self,
        code: &str,
        issued: &LoginRedirect,
        returned_state: &str,
    ) -> Result<(Customer, String)> {
        let outcome = self
            .inner
            .authenticator
            .complete_login(code, issued, returned_state)
            .await?;
        let customer = self
            .inner
            .directory
            .create(&outcome.principal)
            .await?;
        Ok((customer, outcome.access_token))
    }

    /// Wait for in-flight order notifications before shutting down.
    pub async fn drain_notifications(&self) {
        self.inner.dispatcher.drain().await;
    }
}
