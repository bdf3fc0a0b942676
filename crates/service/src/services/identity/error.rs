//! Identity verification error types.

use thiserror::Error;

/// Errors raised by an [`super::IdentityProvider`] implementation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Token failed signature or claim validation.
    #[error("token rejected: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Response was missing data or malformed.
    #[error("invalid response: {0}")]
    Invalid(String),
}

/// Errors that can occur while turning a credential into a principal.
///
/// Each provider round trip has its own variant so callers can tell a
/// rejected credential from a provider outage.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No credential supplied.
    #[error("credential missing")]
    CredentialMissing,

    /// Provider rejected the credential or could not be reached.
    #[error("token exchange failed: {0}")]
    ExchangeFailed(String),

    /// Token is invalid, expired or tampered with.
    #[error("token verification failed: {0}")]
    VerificationFailed(String),

    /// Token is valid but the profile could not be retrieved.
    #[error("profile fetch failed: {0}")]
    ProfileFetchFailed(String),

    /// Login callback state does not match the issued state.
    #[error("login state mismatch")]
    StateMismatch,
}
