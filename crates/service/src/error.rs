//! Unified error taxonomy for the order pipeline.
//!
//! Every operation exposed by [`crate::state::AppState`] returns
//! `Result<T, Error>`. Components surface the most specific variant they can
//! determine; nothing in this crate retries. Mapping variants to transport
//! responses is the caller's job; [`Error::kind`] gives it a flat
//! discriminant to match on.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::identity::IdentityError;

/// Application-level error type for orderdesk.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable principal in the request context.
    #[error("customer credential missing")]
    CredentialMissing,

    /// Identity provider stage failed.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// A customer with the same normalized name already exists.
    #[error("customer exists: {0}")]
    AlreadyExists(String),

    /// Lookup miss.
    #[error("not found: {0}")]
    NotFound(String),

    /// Attempted mutation of a write-once record.
    #[error("update forbidden: {0}")]
    UpdateForbidden(String),

    /// Caller-supplied input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Opaque datastore failure.
    #[error("storage error: {0}")]
    Storage(RepositoryError),

    /// The caller aborted before an outstanding call completed.
    #[error("request cancelled")]
    Cancelled,
}

/// Flat discriminant of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CredentialMissing,
    ExchangeFailed,
    VerificationFailed,
    ProfileFetchFailed,
    AlreadyExists,
    NotFound,
    UpdateForbidden,
    InvalidInput,
    StorageError,
    Cancelled,
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CredentialMissing | Self::Identity(IdentityError::CredentialMissing) => {
                ErrorKind::CredentialMissing
            }
            Self::Identity(IdentityError::ExchangeFailed(_)) => ErrorKind::ExchangeFailed,
            Self::Identity(IdentityError::VerificationFailed(_) | IdentityError::StateMismatch) => {
                ErrorKind::VerificationFailed
            }
            Self::Identity(IdentityError::ProfileFetchFailed(_)) => ErrorKind::ProfileFetchFailed,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::UpdateForbidden(_) => ErrorKind::UpdateForbidden,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Storage(_) => ErrorKind::StorageError,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Immutable(msg) => Self::UpdateForbidden(msg),
            other => Self::Storage(other),
        }
    }
}

impl From<orderdesk_core::PrincipalError> for Error {
    fn from(err: orderdesk_core::PrincipalError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<orderdesk_core::ItemLabelError> for Error {
    fn from(err: orderdesk_core::ItemLabelError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<orderdesk_core::AmountError> for Error {
    fn from(err: orderdesk_core::AmountError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Result type alias for `Error`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::CredentialMissing.to_string(),
            "customer credential missing"
        );
        assert_eq!(
            Error::AlreadyExists("test@example.com".to_string()).to_string(),
            "customer exists: test@example.com"
        );
    }

    #[test]
    fn test_immutable_rows_map_to_update_forbidden() {
        let err = Error::from(RepositoryError::Immutable("customers".to_string()));
        assert_eq!(err.kind(), ErrorKind::UpdateForbidden);
    }

    #[test]
    fn test_other_repository_errors_are_storage() {
        assert_eq!(
            Error::from(RepositoryError::ForeignKey("orders".to_string())).kind(),
            ErrorKind::StorageError
        );
        assert_eq!(
            Error::from(RepositoryError::NotFound).kind(),
            ErrorKind::StorageError
        );
    }

    #[test]
    fn test_identity_stages_stay_distinct() {
        let kinds = [
            Error::from(IdentityError::ExchangeFailed("x".into())).kind(),
            Error::from(IdentityError::VerificationFailed("x".into())).kind(),
            Error::from(IdentityError::ProfileFetchFailed("x".into())).kind(),
            Error::from(IdentityError::CredentialMissing).kind(),
        ];
        assert_eq!(
            kinds,
            [
                ErrorKind::ExchangeFailed,
                ErrorKind::VerificationFailed,
                ErrorKind::ProfileFetchFailed,
                ErrorKind::CredentialMissing,
            ]
        );
    }
}
