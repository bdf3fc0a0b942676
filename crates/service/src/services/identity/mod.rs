//! Identity verification.
//!
//! Turns an opaque bearer credential into a verified [`Principal`] in three
//! provider round trips. The credential is an authorization code issued by
//! the provider, not an access token:
//!
//! 1. Exchange the code for tokens
//! 2. Verify the ID token against the provider's signing keys
//! 3. Fetch the profile and read its email
//!
//! No step is retried here. Each failure keeps its own [`IdentityError`]
//! variant so the caller can decide whether to reject, retry or escalate.
//!
//! The same provider drives the login flow: [`Authenticator::login_url`]
//! issues a state/nonce pair and [`Authenticator::complete_login`] validates
//! the callback.

mod error;
pub mod oidc;

pub use error::{IdentityError, ProviderError};
pub use oidc::OidcClient;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use http::HeaderMap;
use http::header::AUTHORIZATION;
use rand::RngCore;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use orderdesk_core::Principal;

/// Header carrying the authorization code a request is authenticated with.
pub const TOKEN_HEADER: &str = "x-orderdesk-token";

/// Tokens returned by the provider's token endpoint.
#[derive(Clone, Deserialize)]
pub struct TokenSet {
    /// OAuth access token.
    pub access_token: String,
    /// `OpenID` Connect ID token (JWT).
    pub id_token: Option<String>,
    /// Refresh token, if offline access was granted.
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds.
    pub expires_in: Option<i64>,
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field("id_token", &self.id_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Claims from a verified ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedClaims {
    /// Subject identifier at the provider.
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Expiry (seconds since epoch).
    pub exp: i64,
    /// Email, when the `email` scope was granted.
    pub email: Option<String>,
    /// Whether the provider verified the email.
    pub email_verified: Option<bool>,
    /// Replay-protection nonce echoed from the authorization request.
    pub nonce: Option<String>,
}

/// Profile from the provider's userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    /// Subject identifier; matches the ID token's `sub`.
    pub sub: String,
    /// Email address, the field used as principal.
    pub email: Option<String>,
    /// Display name.
    pub name: Option<String>,
}

/// Remote `OpenID` Connect provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Build the URL a user is sent to for login.
    fn authorization_url(&self, state: &str, nonce: &str) -> String;

    /// Exchange a credential (authorization code) for tokens.
    async fn exchange(&self, credential: &str) -> Result<TokenSet, ProviderError>;

    /// Verify the ID token in `tokens`.
    ///
    /// When `nonce` is given the token's `nonce` claim must match it.
    async fn verify(
        &self,
        tokens: &TokenSet,
        nonce: Option<&str>,
    ) -> Result<VerifiedClaims, ProviderError>;

    /// Fetch the profile for the access token in `tokens`.
    async fn fetch_profile(&self, tokens: &TokenSet) -> Result<Profile, ProviderError>;
}

/// Login redirect issued to a user agent.
///
/// `state` and `nonce` must be kept by the caller (e.g. in a session) and
/// handed back to [`Authenticator::complete_login`].
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    /// Provider authorization URL.
    pub url: String,
    /// CSRF state.
    pub state: String,
    /// ID token nonce.
    pub nonce: String,
}

/// Result of a completed login.
#[derive(Clone)]
pub struct LoginOutcome {
    /// Verified principal.
    pub principal: Principal,
    /// Provider access token for calling the provider's own APIs.
    ///
    /// Not a credential for [`Authenticator::authenticate`], which only
    /// accepts authorization codes.
    pub access_token: String,
}

impl fmt::Debug for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginOutcome")
            .field("principal", &self.principal)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Verifies credentials against an [`IdentityProvider`].
#[derive(Clone)]
pub struct Authenticator {
    provider: Arc<dyn IdentityProvider>,
}

impl Authenticator {
    /// Create an authenticator over a provider.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Exchange an authorization code and return its principal.
    ///
    /// # Errors
    ///
    /// - `CredentialMissing` if the credential is empty
    /// - `ExchangeFailed` if the provider rejects the credential
    /// - `VerificationFailed` if the ID token does not validate
    /// - `ProfileFetchFailed` if the profile cannot be fetched or has no email
    #[instrument(skip_all)]
    pub async fn authenticate(&self, credential: &str) -> Result<Principal, IdentityError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(IdentityError::CredentialMissing);
        }

        let tokens = self.exchange(credential).await?;
        self.verify(&tokens, None).await?;
        self.principal_from_profile(&tokens).await
    }

    /// Start a login: generate state and nonce and build the provider URL.
    #[must_use]
    pub fn login_url(&self) -> LoginRedirect {
        let state = random_token();
        let nonce = random_token();
        let url = self.provider.authorization_url(&state, &nonce);
        LoginRedirect { url, state, nonce }
    }

    /// Finish a login from the provider callback.
    ///
    /// # Errors
    ///
    /// Returns `StateMismatch` if `returned_state` differs from the issued
    /// state, otherwise the same stage errors as [`Self::authenticate`].
    #[instrument(skip_all)]
    pub async fn complete_login(
        &self,
        code: &str,
        issued: &LoginRedirect,
        returned_state: &str,
    ) -> Result<LoginOutcome, IdentityError> {
        if returned_state != issued.state {
            warn!("Login state mismatch");
            return Err(IdentityError::StateMismatch);
        }

        let code = code.trim();
        if code.is_empty() {
            return Err(IdentityError::CredentialMissing);
        }

        let tokens = self.exchange(code).await?;
        self.verify(&tokens, Some(&issued.nonce)).await?;
        let principal = self.principal_from_profile(&tokens).await?;

        Ok(LoginOutcome {
            principal,
            access_token: tokens.access_token,
        })
    }

    async fn exchange(&self, credential: &str) -> Result<TokenSet, IdentityError> {
        self.provider.exchange(credential).await.map_err(|e| {
            warn!(error = %e, "Token exchange failed");
            IdentityError::ExchangeFailed(e.to_string())
        })
    }

    async fn verify(
        &self,
        tokens: &TokenSet,
        nonce: Option<&str>,
    ) -> Result<VerifiedClaims, IdentityError> {
        let claims = self.provider.verify(tokens, nonce).await.map_err(|e| {
            warn!(error = %e, "ID token verification failed");
            IdentityError::VerificationFailed(e.to_string())
        })?;
        debug!(sub = %claims.sub, iss = %claims.iss, "ID token verified");
        Ok(claims)
    }

    async fn principal_from_profile(
        &self,
        tokens: &TokenSet,
    ) -> Result<Principal, IdentityError> {
        let profile = self.provider.fetch_profile(tokens).await.map_err(|e| {
            warn!(error = %e, "Profile fetch failed");
            IdentityError::ProfileFetchFailed(e.to_string())
        })?;

        let email = profile
            .email
            .ok_or_else(|| IdentityError::ProfileFetchFailed("profile has no email".to_owned()))?;

        Principal::parse(&email)
            .map_err(|e| IdentityError::ProfileFetchFailed(format!("invalid profile email: {e}")))
    }
}

/// Read the bearer credential from request headers.
///
/// Accepts the `X-Orderdesk-Token` header or `Authorization: Bearer <code>`,
/// in that order.
///
/// # Errors
///
/// Returns `IdentityError::CredentialMissing` if neither header carries a
/// non-empty value.
pub fn credential_from_headers(headers: &HeaderMap) -> Result<&str, IdentityError> {
    let from_token_header = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let from_authorization = || {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    from_token_header
        .or_else(from_authorization)
        .ok_or(IdentityError::CredentialMissing)
}

/// Generate a URL-safe random token (256 bits).
fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
