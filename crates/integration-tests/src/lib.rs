//! Integration test support for orderdesk.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory tests
//! cargo test -p orderdesk-integration-tests
//!
//! # Including PostgreSQL tests (needs ORDERDESK_DATABASE_URL and migrations)
//! cargo test -p orderdesk-integration-tests -- --include-ignored
//! ```
//!
//! [`TestApp`] wires an [`AppState`] over a [`MemoryStore`], a
//! [`FakeProvider`] and a [`ChannelGateway`] so tests can observe every
//! collaborator.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use orderdesk_service::AppState;
use orderdesk_service::db::MemoryStore;
use orderdesk_service::services::identity::{
    IdentityProvider, Profile, ProviderError, TokenSet, VerifiedClaims,
};
use orderdesk_service::services::notify::{NotificationGateway, NotificationRequest, NotifyError};

/// Destination configured for order notifications in tests.
pub const TEST_DESTINATION: &str = "+254700000000";

const ACCESS_TOKEN_PREFIX: &str = "at-";

/// Identity provider that accepts a fixed set of authorization codes.
///
/// Each known code maps to the email its profile reports. Exchanging a code
/// yields the access token `at-<code>`, which is itself not a valid code.
#[derive(Default)]
pub struct FakeProvider {
    accounts: HashMap<String, String>,
    calls: AtomicUsize,
}

impl FakeProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `code` as the account `email`.
    #[must_use]
    pub fn with_account(mut self, code: &str, email: &str) -> Self {
        self.accounts.insert(code.to_owned(), email.to_owned());
        self
    }

    fn email_for(&self, tokens: &TokenSet) -> Option<String> {
        tokens
            .access_token
            .strip_prefix(ACCESS_TOKEN_PREFIX)
            .and_then(|code| self.accounts.get(code))
            .cloned()
    }

    /// Number of provider round trips made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorization_url(&self, state: &str, nonce: &str) -> String {
        format!("https://idp.test/authorize?state={state}&nonce={nonce}")
    }

    async fn exchange(&self, credential: &str) -> Result<TokenSet, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.accounts.contains_key(credential) {
            return Err(ProviderError::Api {
                status: 400,
                message: "invalid_grant".to_owned(),
            });
        }
        Ok(TokenSet {
            access_token: format!("{ACCESS_TOKEN_PREFIX}{credential}"),
            id_token: Some(format!("id-{credential}")),
            refresh_token: None,
            expires_in: Some(3600),
        })
    }

    async fn verify(
        &self,
        tokens: &TokenSet,
        nonce: Option<&str>,
    ) -> Result<VerifiedClaims, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(VerifiedClaims {
            sub: tokens.access_token.clone(),
            iss: "https://idp.test".to_owned(),
            exp: i64::MAX,
            email: self.email_for(tokens),
            email_verified: Some(true),
            nonce: nonce.map(str::to_owned),
        })
    }

    async fn fetch_profile(&self, tokens: &TokenSet) -> Result<Profile, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Profile {
            sub: tokens.access_token.clone(),
            email: self.email_for(tokens),
            name: None,
        })
    }
}

/// Gateway that reports every send attempt on a channel.
///
/// With `failing` set, each attempt is reported and then rejected.
pub struct ChannelGateway {
    tx: mpsc::UnboundedSender<NotificationRequest>,
    failing: bool,
}

impl ChannelGateway {
    #[must_use]
    pub fn new(failing: bool) -> (Self, mpsc::UnboundedReceiver<NotificationRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, failing }, rx)
    }
}

#[async_trait]
impl NotificationGateway for ChannelGateway {
    async fn send(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        let _ = self.tx.send(request.clone());
        if self.failing {
            return Err(NotifyError::Api {
                status: 503,
                message: "gateway unavailable".to_owned(),
            });
        }
        Ok(())
    }
}

/// Application wired to in-memory collaborators.
pub struct TestApp {
    pub state: AppState,
    pub store: MemoryStore,
    pub provider: Arc<FakeProvider>,
    pub notifications: mpsc::UnboundedReceiver<NotificationRequest>,
}

impl TestApp {
    /// App whose gateway delivers successfully.
    #[must_use]
    pub fn new(provider: FakeProvider) -> Self {
        Self::build(provider, false)
    }

    /// App whose gateway rejects every message.
    #[must_use]
    pub fn with_failing_gateway(provider: FakeProvider) -> Self {
        Self::build(provider, true)
    }

    fn build(provider: FakeProvider, failing: bool) -> Self {
        let store = MemoryStore::new();
        let provider = Arc::new(provider);
        let (gateway, notifications) = ChannelGateway::new(failing);

        let state = AppState::from_parts(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            provider.clone(),
            Arc::new(gateway),
            TEST_DESTINATION,
        );

        Self {
            state,
            store,
            provider,
            notifications,
        }
    }
}
