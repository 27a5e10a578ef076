//! Error taxonomy for the credential core.

use thiserror::Error;

/// Failures raised by the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (duplicate email or token digest).
    #[error("unique constraint violation")]
    UniqueViolation,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Domain errors returned by [`crate::credentials::CredentialManager`].
///
/// `InvalidCredentials` covers both the unknown-email and the wrong-password case
/// so callers cannot tell them apart.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered")]
    DuplicateIdentity,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Missing session")]
    Unauthenticated,
    #[error("Invalid session")]
    InvalidSession,
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
    #[error("internal failure: {0}")]
    Internal(#[source] anyhow::Error),
}

impl AuthError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for failures the caller cannot fix (store or internal).
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Internal(_))
    }
}
