//! Per-request execution context.
//!
//! An upstream authentication step builds a [`RequestContext`] and the caller
//! passes it by reference into the pipeline. The context carries the verified
//! principal (if any) and a cancellation token that outstanding external calls
//! observe.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use orderdesk_core::Principal;

use crate::error::{Error, Result};

/// Execution context for a single request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    principal: Option<Principal>,
    cancel: CancellationToken,
}

impl RequestContext {
    /// Context for a request whose credential was verified.
    #[must_use]
    pub fn authenticated(principal: Principal) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            principal: Some(principal),
            cancel: CancellationToken::new(),
        }
    }

    /// Context for a request with no verified identity.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            principal: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Context from an untyped identity value handed over by an upstream
    /// layer. Missing or malformed values yield an anonymous context.
    #[must_use]
    pub fn from_claimed(claimed: Option<&str>) -> Self {
        match claimed.map(Principal::parse) {
            Some(Ok(principal)) => Self::authenticated(principal),
            _ => Self::anonymous(),
        }
    }

    /// Replace the cancellation token, e.g. with a child of a server-wide token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Unique ID of this request, for log correlation.
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// The verified principal.
    ///
    /// # Errors
    ///
    /// Returns `Error::CredentialMissing` if the request is anonymous.
    pub fn principal(&self) -> Result<&Principal> {
        match &self.principal {
            Some(principal) => Ok(principal),
            None => Err(Error::CredentialMissing),
        }
    }

    /// Token cancelled when the caller aborts the request.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run an external call, abandoning it if the request is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` if the token fires first, otherwise the
    /// call's own result.
    pub async fn run<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::Cancelled),
            result = call => result,
        }
    }
}
