use thiserror::Error;

use billjobs_core::DomainError;

use crate::StoreError;

/// Everything that can go wrong while authenticating or registering a user.
///
/// The first three variants are the caller-facing authentication outcomes;
/// their messages are part of the HTTP contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Username/password did not match an active account.
    #[error("Unable to log in with provided credentials.")]
    InvalidCredentials,

    /// No credential was presented to a protected endpoint.
    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,

    /// A token or session was presented but resolves to no active account.
    #[error("Invalid token.")]
    InvalidToken,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("credential store: {0}")]
    Store(#[from] StoreError),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}
